//! Procedural shape catalog.
//!
//! Every border design is a [`ShapeDescriptor`] in a registry keyed by [`ShapeId`]. A descriptor
//! owns a pure generator producing a [`DrawProgram`] for given [`ShapeParams`], and a band
//! function bounding how deep into the canvas that program may paint. Adding a shape is adding
//! one descriptor.

pub(crate) mod program;
pub(crate) mod shapes;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Rect, Rgba8};
use crate::foundation::error::{FrameError, FrameResult};

pub use program::{DrawOp, DrawProgram, FillRule, Geometry, GradientStop, Paint, PaintStyle};
pub use shapes::{Glyph, ShapeFamily};

/// Catalog key of a procedural shape.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Wrap a raw id; existence is checked by [`ShapeCatalog::get`].
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Owned raw id.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inputs of every shape generator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Canvas the frame is drawn on.
    pub canvas: Canvas,
    /// Main border color.
    pub primary_color: Rgba8,
    /// Border width in canvas pixels, within `[1, min_side / 8]`.
    pub border_width: f64,
    /// Corner radius in canvas pixels, within `[0, min_side / 2]`.
    pub border_radius: f64,
}

impl ShapeParams {
    /// Check canvas, width and radius ranges.
    pub fn validate(&self) -> FrameResult<()> {
        self.canvas.validate()?;
        let min = self.canvas.min_side();
        let max_w = min / 8.0;
        if !self.border_width.is_finite() || !(1.0..=max_w).contains(&self.border_width) {
            return Err(FrameError::validation(format!(
                "border_width {} outside [1, {max_w}] for a {}x{} canvas",
                self.border_width, self.canvas.width, self.canvas.height
            )));
        }
        let max_r = min / 2.0;
        if !self.border_radius.is_finite() || !(0.0..=max_r).contains(&self.border_radius) {
            return Err(FrameError::validation(format!(
                "border_radius {} outside [0, {max_r}] for a {}x{} canvas",
                self.border_radius, self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }

    /// Radius of the frame's outer corner, clamped to half the shorter side.
    pub fn corner_radius(&self) -> f64 {
        self.border_radius.clamp(0.0, self.canvas.min_side() / 2.0)
    }

    /// The frame outline offset inward by `depth`, for an outer corner radius `corner`.
    ///
    /// Offsets of one outline share corner centers, so anything drawn between depth 0 and `d`
    /// stays outside `outline(d, corner)`.
    pub fn outline(&self, depth: f64, corner: f64) -> kurbo::RoundedRect {
        let w = f64::from(self.canvas.width);
        let h = f64::from(self.canvas.height);
        let rect = Rect::new(depth, depth, w - depth, h - depth);
        kurbo::RoundedRect::from_rect(rect, (corner - depth).max(0.0))
    }

    /// Region that must stay fully transparent for a shape with the given band depth.
    pub fn interior(&self, band: f64) -> kurbo::RoundedRect {
        self.outline(band, self.corner_radius())
    }

    /// Scale to another canvas by the uniform factor `min(sx, sy)`.
    ///
    /// Widths are kept legal for the target canvas, so a downscaled hairline stays at 1px.
    pub fn scaled_to(&self, output: Canvas) -> FrameResult<Self> {
        output.validate()?;
        let sx = f64::from(output.width) / f64::from(self.canvas.width);
        let sy = f64::from(output.height) / f64::from(self.canvas.height);
        let s = sx.min(sy);
        let min = output.min_side();
        Ok(Self {
            canvas: output,
            primary_color: self.primary_color,
            border_width: (self.border_width * s).clamp(1.0, min / 8.0),
            border_radius: (self.border_radius * s).clamp(0.0, min / 2.0),
        })
    }
}

/// Catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeDescriptor {
    /// Catalog key.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Family and its family-specific parameters.
    pub family: ShapeFamily,
    /// Border width suggested by the editor.
    pub default_width: f64,
    /// Corner radius suggested by the editor.
    pub default_radius: f64,
}

impl ShapeDescriptor {
    /// Run the generator. Parameters are validated first.
    pub fn generate(&self, params: &ShapeParams) -> FrameResult<DrawProgram> {
        params.validate()?;
        Ok(self.family.generate(params))
    }

    /// Border depth the generator may paint into, anti-aliasing included.
    pub fn band(&self, params: &ShapeParams) -> f64 {
        self.family.band(params)
    }

    /// Shape id as an owned key.
    pub fn shape_id(&self) -> ShapeId {
        ShapeId::new(self.id)
    }
}

/// Registry of procedural shapes.
#[derive(Clone, Debug)]
pub struct ShapeCatalog {
    shapes: Vec<ShapeDescriptor>,
}

impl Default for ShapeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ShapeCatalog {
    /// Catalog with the built-in shapes.
    pub fn builtin() -> Self {
        Self {
            shapes: shapes::builtin_descriptors(),
        }
    }

    /// Catalog with no shapes.
    pub fn empty() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Add a shape. Ids must be unique.
    pub fn register(&mut self, descriptor: ShapeDescriptor) -> FrameResult<()> {
        if self.shapes.iter().any(|d| d.id == descriptor.id) {
            return Err(FrameError::validation(format!(
                "shape '{}' is already registered",
                descriptor.id
            )));
        }
        self.shapes.push(descriptor);
        Ok(())
    }

    /// Look up a shape; unknown ids are a validation error.
    pub fn get(&self, id: &ShapeId) -> FrameResult<&ShapeDescriptor> {
        self.shapes
            .iter()
            .find(|d| d.id == id.as_str())
            .ok_or_else(|| FrameError::validation(format!("unknown shape id '{id}'")))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.shapes.iter().any(|d| d.id == id.as_str())
    }

    /// Generate the draw program for `id`.
    pub fn generate(&self, id: &ShapeId, params: &ShapeParams) -> FrameResult<DrawProgram> {
        self.get(id)?.generate(params)
    }

    /// All entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ShapeDescriptor> {
        self.shapes.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/catalog.rs"]
mod tests;
