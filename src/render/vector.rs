use std::sync::Arc;

use anyhow::Context as _;

use crate::{
    catalog::{DrawProgram, Geometry, Paint, PaintStyle, ShapeCatalog, ShapeId, ShapeParams},
    foundation::core::{Canvas, Rgba8},
    foundation::error::{FrameError, FrameResult},
    model::template::{CustomText, TemplateDraft},
    render::raster::FrameRGBA,
    render::text::{Caption, RenderStyle},
};

fn num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn color_attrs(kind: &str, c: Rgba8) -> String {
    if c.a == 255 {
        format!(r#"{kind}="{}""#, c.to_hex_rgb())
    } else {
        format!(
            r#"{kind}="{}" {kind}-opacity="{}""#,
            c.to_hex_rgb(),
            num(c.opacity())
        )
    }
}

fn paint_attrs(kind: &str, paint: &Paint, gradient_id: &str, defs: &mut String) -> String {
    match paint {
        Paint::Solid(c) => color_attrs(kind, *c),
        Paint::LinearGradient { start, end, stops } => {
            defs.push_str(&format!(
                r#"<linearGradient id="{gradient_id}" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}">"#,
                num(start.x),
                num(start.y),
                num(end.x),
                num(end.y)
            ));
            for s in stops {
                defs.push_str(&format!(
                    r#"<stop offset="{}" stop-color="{}" stop-opacity="{}"/>"#,
                    num(f64::from(s.offset)),
                    s.color.to_hex_rgb(),
                    num(s.color.opacity())
                ));
            }
            defs.push_str("</linearGradient>");
            format!(r#"{kind}="url(#{gradient_id})""#)
        }
    }
}

/// SVG overlay document for a draw program.
///
/// The `viewBox` is the design canvas, so any display size scales the frame uniformly.
pub fn svg_document(program: &DrawProgram, caption: Option<&Caption>) -> String {
    let Canvas { width, height } = program.canvas;
    let mut defs = String::new();
    let mut body = String::new();

    for (i, op) in program.ops.iter().enumerate() {
        let gradient_id = format!("g{i}");
        let style = match &op.style {
            PaintStyle::Fill { paint, rule } => format!(
                r#"{} fill-rule="{}" stroke="none""#,
                paint_attrs("fill", paint, &gradient_id, &mut defs),
                rule.svg_name()
            ),
            PaintStyle::Stroke { paint, width } => format!(
                r#"fill="none" {} stroke-width="{}" stroke-linejoin="round" stroke-linecap="round""#,
                paint_attrs("stroke", paint, &gradient_id, &mut defs),
                num(*width)
            ),
        };
        let element = match &op.geometry {
            Geometry::RoundedRect { rect, radius } => format!(
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" ry="{}" {style}/>"#,
                num(rect.x0),
                num(rect.y0),
                num(rect.width()),
                num(rect.height()),
                num(*radius),
                num(*radius)
            ),
            Geometry::Circle { center, radius } => format!(
                r#"<circle cx="{}" cy="{}" r="{}" {style}/>"#,
                num(center.x),
                num(center.y),
                num(*radius)
            ),
            Geometry::Path(p) => format!(r#"<path d="{}" {style}/>"#, p.to_svg()),
        };
        body.push_str(&element);
        body.push('\n');
    }

    if let Some(c) = caption {
        defs.push_str(&format!(
            r#"<clipPath id="caption-band"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
            num(c.clip.x0),
            num(c.clip.y0),
            num(c.clip.width()),
            num(c.clip.height())
        ));
        body.push_str(&format!(
            r#"<text clip-path="url(#caption-band)" x="{}" y="{}" text-anchor="middle" dominant-baseline="central" font-family="{}" font-size="{}" {} {} stroke-width="{}" stroke-linejoin="round" paint-order="stroke">{}</text>"#,
            num(c.center.x),
            num(c.center.y),
            escape_xml(&c.font_family),
            num(c.font_size),
            color_attrs("fill", c.color),
            color_attrs("stroke", c.halo),
            num(c.halo_width()),
            escape_xml(&c.text)
        ));
        body.push('\n');
    }

    let mut out = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    out.push('\n');
    if !defs.is_empty() {
        out.push_str(&format!("<defs>{defs}</defs>\n"));
    }
    out.push_str(&body);
    out.push_str("</svg>\n");
    out
}

/// Everything the live overlay depends on.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayInput {
    /// Catalog shape.
    pub shape: ShapeId,
    /// Generator parameters.
    pub params: ShapeParams,
    /// Optional caption.
    pub text: Option<CustomText>,
}

impl OverlayInput {
    /// Input for a template or in-progress edit on a design canvas.
    pub fn from_draft(draft: &TemplateDraft, canvas: Canvas) -> FrameResult<Self> {
        let shape = draft.shape.shape_id().cloned().ok_or_else(|| {
            FrameError::validation("ai-generated templates have no vector overlay")
        })?;
        Ok(Self {
            shape,
            params: draft.params(canvas),
            text: draft.visible_text().cloned(),
        })
    }
}

/// Live vector overlay that regenerates only when its input changes.
#[derive(Debug)]
pub struct VectorOverlay {
    catalog: Arc<ShapeCatalog>,
    style: RenderStyle,
    current: Option<OverlayInput>,
    svg: String,
    renders: u64,
}

impl VectorOverlay {
    /// Overlay drawing from `catalog` with the given presentation style.
    pub fn new(catalog: Arc<ShapeCatalog>, style: RenderStyle) -> Self {
        Self {
            catalog,
            style,
            current: None,
            svg: String::new(),
            renders: 0,
        }
    }

    /// Apply new input. Returns `true` when the document was regenerated.
    ///
    /// Invalid input leaves the previous document in place.
    pub fn update(&mut self, input: &OverlayInput) -> FrameResult<bool> {
        if self.current.as_ref() == Some(input) {
            return Ok(false);
        }
        let descriptor = self.catalog.get(&input.shape)?;
        let program = descriptor.generate(&input.params)?;
        let caption = input.text.as_ref().and_then(|t| {
            Caption::place(t, input.params.canvas, descriptor.band(&input.params), &self.style)
        });

        self.svg = svg_document(&program, caption.as_ref());
        self.current = Some(input.clone());
        self.renders += 1;
        Ok(true)
    }

    /// Switch theme; forces the next update to regenerate.
    pub fn set_style(&mut self, style: RenderStyle) {
        if style != self.style {
            self.style = style;
            self.current = None;
        }
    }

    /// Current SVG document (empty before the first update).
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Number of regenerations so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}

/// Rasterizes overlay documents at display size through usvg/resvg.
#[derive(Clone)]
pub struct SvgPreviewer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SvgPreviewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgPreviewer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for SvgPreviewer {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgPreviewer {
    /// Previewer without fonts; captions are not drawn.
    pub fn new() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    /// Previewer using system fonts plus an optional extra font file.
    pub fn with_system_fonts(extra_font: Option<&std::path::Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(path) = extra_font
            && let Err(err) = db.load_font_file(path)
        {
            tracing::warn!(path = %path.display(), %err, "failed to load preview font");
        }
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Render `svg` scaled to `width` x `height` into a premultiplied frame.
    pub fn rasterize(&self, svg: &str, width: u32, height: u32) -> FrameResult<FrameRGBA> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts).context("parse svg tree")?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| FrameError::render("failed to allocate svg pixmap"))?;
        let sx = (width as f32) / tree.size().width();
        let sy = (height as f32) / tree.size().height();
        let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
        resvg::render(&tree, xform, &mut pixmap.as_mut());

        Ok(FrameRGBA {
            width,
            height,
            data: pixmap.data().to_vec(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/vector.rs"]
mod tests;
