use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::{Canvas, Point, Rect, Rgba8},
    foundation::error::{FrameError, FrameResult},
    model::template::{CustomText, TextPosition},
};

/// Share of the band depth a caption may occupy.
const TEXT_BAND_FILL: f64 = 0.8;
/// Halo stroke width as a share of the font size.
const HALO_FRACTION: f64 = 0.15;

/// Surrounding UI theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light surroundings.
    #[default]
    Light,
    /// Dark surroundings.
    Dark,
}

/// Caller-supplied presentation settings. Renderers read nothing else from their environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderStyle {
    /// UI theme.
    #[serde(default)]
    pub theme: Theme,
}

impl RenderStyle {
    /// Style for a light UI.
    pub fn light() -> Self {
        Self {
            theme: Theme::Light,
        }
    }

    /// Style for a dark UI.
    pub fn dark() -> Self {
        Self { theme: Theme::Dark }
    }

    /// Outline drawn behind caption glyphs.
    pub fn halo_color(&self) -> Rgba8 {
        match self.theme {
            Theme::Light => Rgba8::rgba(255, 255, 255, 166),
            Theme::Dark => Rgba8::rgba(15, 23, 42, 166),
        }
    }
}

/// A caption placed inside the top or bottom band.
#[derive(Clone, Debug, PartialEq)]
pub struct Caption {
    /// Trimmed text.
    pub text: String,
    /// Glyph fill.
    pub color: Rgba8,
    /// Glyph outline.
    pub halo: Rgba8,
    /// Family name for the vector overlay.
    pub font_family: String,
    /// Font size in canvas pixels.
    pub font_size: f64,
    /// Center of the text box.
    pub center: Point,
    /// Widest the text may get before it is shrunk.
    pub max_width: f64,
    /// Band strip the caption is confined to. Nothing is painted outside it.
    pub clip: Rect,
}

impl Caption {
    /// Place `text` in the band of depth `band`, or `None` when there is nothing to draw.
    pub fn place(
        text: &CustomText,
        canvas: Canvas,
        band: f64,
        style: &RenderStyle,
    ) -> Option<Self> {
        let trimmed = text.text.trim();
        let font_size = TEXT_BAND_FILL * band;
        if trimmed.is_empty() || font_size < 1.0 {
            return None;
        }

        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let (cy, clip) = match text.position {
            TextPosition::Top => (0.5 * band, Rect::new(0.0, 0.0, w, band)),
            TextPosition::Bottom => (h - 0.5 * band, Rect::new(0.0, h - band, w, h)),
        };
        Some(Self {
            text: trimmed.to_owned(),
            color: text.color,
            halo: style.halo_color(),
            font_family: text.font.clone(),
            font_size,
            center: Point::new(0.5 * w, cy),
            max_width: (w - 2.0 * band).max(0.0),
            clip,
        })
    }

    /// Tallest the laid-out line box may get, leaving room for the halo.
    pub fn max_height(&self) -> f64 {
        (self.clip.height() - self.halo_width()).max(0.0)
    }

    /// Halo stroke width.
    pub fn halo_width(&self) -> f64 {
        HALO_FRACTION * self.font_size
    }
}

/// Parley-backed text shaper for raster captions.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    family: Option<String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl TextLayoutEngine {
    /// Fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family: None,
        }
    }

    fn family_for(&mut self, font_bytes: &[u8]) -> FrameResult<String> {
        if let Some(f) = &self.family {
            return Ok(f.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| FrameError::render("no font families registered from font bytes"))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| FrameError::render("registered font family has no name"))?
            .to_string();
        self.family = Some(name.clone());
        Ok(name)
    }

    fn layout_at(
        &mut self,
        text: &str,
        family: &str,
        size_px: f32,
        brush: Rgba8,
    ) -> parley::Layout<Rgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family.to_owned())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Shape a caption on one line, shrinking it to fit `max_width` and the band height.
    pub fn layout_caption(
        &mut self,
        caption: &Caption,
        font_bytes: &[u8],
    ) -> FrameResult<parley::Layout<Rgba8>> {
        let size = caption.font_size as f32;
        if !size.is_finite() || size <= 0.0 {
            return Err(FrameError::validation(
                "caption font size must be finite and > 0",
            ));
        }
        let family = self.family_for(font_bytes)?;
        let layout = self.layout_at(&caption.text, &family, size, caption.color);

        let fit = |extent: f32, limit: f64| {
            let extent = f64::from(extent);
            if extent > limit && extent > 0.0 && limit > 0.0 {
                limit / extent
            } else {
                1.0
            }
        };
        let scale = fit(layout.width(), caption.max_width)
            .min(fit(layout.height(), caption.max_height()));
        if scale < 1.0 {
            let fitted = (f64::from(size) * scale) as f32;
            return Ok(self.layout_at(&caption.text, &family, fitted, caption.color));
        }
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
