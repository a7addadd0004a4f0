use std::io::Cursor;

use anyhow::Context as _;

use crate::{
    catalog::{DrawOp, DrawProgram, FillRule, Paint, PaintStyle},
    foundation::core::{BezPath, Rgba8},
    foundation::error::{FrameError, FrameResult},
    foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
    render::text::{Caption, TextLayoutEngine},
};

/// A rendered frame in RGBA8 format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
            premultiplied: true,
        }
    }

    /// RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Straight-alpha copy.
    pub fn to_straight(&self) -> Self {
        let mut out = self.clone();
        if out.premultiplied {
            unpremultiply_rgba8_in_place(&mut out.data);
            out.premultiplied = false;
        }
        out
    }

    /// Decode any image format `image` understands into a premultiplied frame.
    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        let rgba = image::load_from_memory(bytes)
            .context("decode image from memory")?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut data = rgba.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Encode as a straight-alpha RGBA PNG.
    pub fn encode_png(&self) -> FrameResult<Vec<u8>> {
        let straight = self.to_straight();
        let img = image::RgbaImage::from_raw(straight.width, straight.height, straight.data)
            .ok_or_else(|| FrameError::render("frame byte length does not match its size"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
        Ok(buf)
    }
}

struct RasterFont {
    bytes: Vec<u8>,
    data: vello_cpu::peniko::FontData,
    engine: TextLayoutEngine,
}

/// CPU rasterizer for draw programs, backed by `vello_cpu`.
pub struct RasterRenderer {
    font: Option<RasterFont>,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RasterRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl RasterRenderer {
    /// Renderer without a caption font; captions are skipped.
    pub fn new() -> Self {
        Self { font: None }
    }

    /// Renderer drawing captions with the given font file contents.
    pub fn with_font_bytes(bytes: Vec<u8>) -> Self {
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.clone()),
            0,
        );
        Self {
            font: Some(RasterFont {
                bytes,
                data,
                engine: TextLayoutEngine::new(),
            }),
        }
    }

    /// Rasterize `program` (and an optional caption) into a premultiplied frame.
    pub fn render(
        &mut self,
        program: &DrawProgram,
        caption: Option<&Caption>,
    ) -> FrameResult<FrameRGBA> {
        let width: u16 = program
            .canvas
            .width
            .try_into()
            .map_err(|_| FrameError::render("canvas width exceeds u16"))?;
        let height: u16 = program
            .canvas
            .height
            .try_into()
            .map_err(|_| FrameError::render("canvas height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        for op in &program.ops {
            draw_op(&mut ctx, op);
        }
        if let Some(caption) = caption {
            self.draw_caption(&mut ctx, caption)?;
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: program.canvas.width,
            height: program.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_caption(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        caption: &Caption,
    ) -> FrameResult<()> {
        let Some(font) = self.font.as_mut() else {
            tracing::warn!(text = %caption.text, "no caption font configured; raster text skipped");
            return Ok(());
        };

        let layout = font.engine.layout_caption(caption, &font.bytes)?;
        // Accents and the halo may overshoot the line box; the band strip bounds them.
        ctx.push_clip_layer(&bezpath_to_cpu(&kurbo::Shape::to_path(&caption.clip, 0.1)));
        let x0 = caption.center.x - 0.5 * f64::from(layout.width());
        let y0 = caption.center.y - 0.5 * f64::from(layout.height());
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((x0, y0)));
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(caption.halo_width()));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs: Vec<vello_cpu::Glyph> = run
                    .glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                let size = run.run().font_size();

                ctx.set_paint(color_to_cpu(caption.halo));
                ctx.glyph_run(&font.data)
                    .font_size(size)
                    .stroke_glyphs(glyphs.iter().copied());
                ctx.set_paint(color_to_cpu(run.style().brush));
                ctx.glyph_run(&font.data)
                    .font_size(size)
                    .fill_glyphs(glyphs.into_iter());
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.pop_layer();
        Ok(())
    }
}

fn draw_op(ctx: &mut vello_cpu::RenderContext, op: &DrawOp) {
    let path = bezpath_to_cpu(&op.geometry.to_bezpath());
    match &op.style {
        PaintStyle::Fill { paint, rule } => {
            set_paint(ctx, paint);
            ctx.set_fill_rule(match rule {
                FillRule::NonZero => vello_cpu::peniko::Fill::NonZero,
                FillRule::EvenOdd => vello_cpu::peniko::Fill::EvenOdd,
            });
            ctx.fill_path(&path);
        }
        PaintStyle::Stroke { paint, width } => {
            set_paint(ctx, paint);
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
            ctx.stroke_path(&path);
        }
    }
}

fn set_paint(ctx: &mut vello_cpu::RenderContext, paint: &Paint) {
    match paint {
        Paint::Solid(c) => ctx.set_paint(color_to_cpu(*c)),
        Paint::LinearGradient { start, end, stops } => {
            let stops: Vec<vello_cpu::peniko::ColorStop> = stops
                .iter()
                .map(|s| vello_cpu::peniko::ColorStop::from((s.offset, color_to_cpu(s.color))))
                .collect();
            let gradient = vello_cpu::peniko::Gradient::new_linear(
                vello_cpu::kurbo::Point::new(start.x, start.y),
                vello_cpu::kurbo::Point::new(end.x, end.y),
            )
            .with_stops(stops.as_slice());
            ctx.set_paint(gradient);
        }
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
