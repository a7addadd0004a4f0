//! Raster export and compositing hand-off.
//!
//! The exporter renders the same draw program the vector overlay uses, at the requested output size,
//! and stores it as a transparent PNG under a content-addressed path. Retrying an export with
//! identical inputs rewrites the same asset.

pub(crate) mod fingerprint;
pub(crate) mod overlay;

use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    catalog::{ShapeCatalog, ShapeId, ShapeParams},
    foundation::core::Canvas,
    foundation::error::{FrameError, FrameResult},
    model::template::{CustomText, TemplateDraft},
    render::{Caption, FrameRGBA, RasterRenderer, RenderStyle},
    store::{AssetRef, AssetStorage},
};

pub use fingerprint::{EXPORTER_REVISION, ExportFingerprint, fingerprint_export, font_key};
pub use overlay::{CompositingOverlay, overlay_for};

/// MIME type of exported rasters.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// One entry of a batch export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportJob {
    /// Catalog shape.
    pub shape: ShapeId,
    /// Design-canvas parameters.
    pub params: ShapeParams,
    /// Optional caption.
    pub text: Option<CustomText>,
    /// Raster size.
    pub output: Canvas,
}

/// Renders catalog shapes to PNG assets.
pub struct RasterExporter {
    catalog: Arc<ShapeCatalog>,
    storage: Arc<dyn AssetStorage>,
    style: RenderStyle,
    caption_font: Option<Arc<Vec<u8>>>,
    caption_font_key: Option<u64>,
    threads: Option<usize>,
}

impl std::fmt::Debug for RasterExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterExporter")
            .field("style", &self.style)
            .field("has_caption_font", &self.caption_font.is_some())
            .field("threads", &self.threads)
            .finish_non_exhaustive()
    }
}

impl RasterExporter {
    /// Exporter storing rasters into `storage`.
    pub fn new(catalog: Arc<ShapeCatalog>, storage: Arc<dyn AssetStorage>) -> Self {
        Self {
            catalog,
            storage,
            style: RenderStyle::default(),
            caption_font: None,
            caption_font_key: None,
            threads: None,
        }
    }

    /// Draw captions with this font file.
    pub fn with_caption_font(mut self, bytes: Vec<u8>) -> Self {
        self.caption_font_key = Some(font_key(&bytes));
        self.caption_font = Some(Arc::new(bytes));
        self
    }

    /// Caption halo style.
    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Worker threads for batch export; `None` uses rayon defaults.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    fn renderer(&self) -> RasterRenderer {
        match &self.caption_font {
            Some(bytes) => RasterRenderer::with_font_bytes(bytes.as_ref().clone()),
            None => RasterRenderer::new(),
        }
    }

    /// Render to straight-alpha PNG bytes without storing. Returns the bytes and storage path.
    pub fn render_png(
        &self,
        renderer: &mut RasterRenderer,
        shape: &ShapeId,
        params: &ShapeParams,
        text: Option<&CustomText>,
        output: Canvas,
    ) -> FrameResult<(Vec<u8>, String)> {
        let descriptor = self.catalog.get(shape)?;
        params.validate()?;
        let scaled = params.scaled_to(output)?;
        let program = descriptor.generate(&scaled)?;
        let caption =
            text.and_then(|t| Caption::place(t, output, descriptor.band(&scaled), &self.style));

        let frame = renderer.render(&program, caption.as_ref())?;
        let png = frame.encode_png()?;
        let path = format!(
            "frames/{}/{}.png",
            shape,
            fingerprint_export(
                shape,
                &scaled,
                output,
                text,
                &self.style,
                self.caption_font_key
            )
            .to_hex()
        );
        Ok((png, path))
    }

    fn export_with(
        &self,
        renderer: &mut RasterRenderer,
        shape: &ShapeId,
        params: &ShapeParams,
        text: Option<&CustomText>,
        output: Canvas,
    ) -> FrameResult<AssetRef> {
        let (png, path) = self
            .render_png(renderer, shape, params, text, output)
            .map_err(into_export_error)?;
        self.storage
            .put(&path, &png, PNG_CONTENT_TYPE)
            .map_err(into_export_error)
    }

    /// Render and store the frame of `shape` at `output` size.
    ///
    /// Parameters are scaled uniformly from their design canvas. Identical inputs map to the same
    /// asset path.
    #[tracing::instrument(skip(self, params), fields(shape = %shape, out_w = output.width, out_h = output.height))]
    pub fn export_raster(
        &self,
        shape: &ShapeId,
        params: &ShapeParams,
        output: Canvas,
    ) -> FrameResult<AssetRef> {
        self.export_with(&mut self.renderer(), shape, params, None, output)
    }

    /// Export a template or edit state designed on `design`, caption included.
    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn export_draft(
        &self,
        draft: &TemplateDraft,
        design: Canvas,
        output: Canvas,
    ) -> FrameResult<AssetRef> {
        let shape = draft.shape.shape_id().ok_or_else(|| {
            FrameError::validation("ai-generated templates are not rendered by the exporter")
        })?;
        self.export_with(
            &mut self.renderer(),
            shape,
            &draft.params(design),
            draft.visible_text(),
            output,
        )
    }

    /// Export many jobs in parallel. Results keep the job order.
    pub fn export_batch(&self, jobs: &[ExportJob]) -> FrameResult<Vec<FrameResult<AssetRef>>> {
        let pool = build_thread_pool(self.threads)?;
        Ok(pool.install(|| {
            jobs.par_iter()
                .map_init(
                    || self.renderer(),
                    |renderer, job| {
                        self.export_with(
                            renderer,
                            &job.shape,
                            &job.params,
                            job.text.as_ref(),
                            job.output,
                        )
                    },
                )
                .collect()
        }))
    }
}

fn into_export_error(err: FrameError) -> FrameError {
    match err {
        FrameError::Validation(_) | FrameError::Export(_) => err,
        other => FrameError::export(other.to_string()),
    }
}

fn build_thread_pool(threads: Option<usize>) -> FrameResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FrameError::validation(
            "batch export 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FrameError::export(format!("failed to build rayon thread pool: {e}")))
}

/// Check an externally produced frame raster before it is accepted.
///
/// The image must decode, match `output` exactly, and keep the interior inset by
/// `inset_fraction` of each side fully transparent.
pub fn validate_ai_raster(
    bytes: &[u8],
    output: Canvas,
    inset_fraction: f64,
) -> FrameResult<FrameRGBA> {
    if !(0.0..0.5).contains(&inset_fraction) {
        return Err(FrameError::validation(format!(
            "ai interior inset {inset_fraction} outside [0, 0.5)"
        )));
    }
    let frame = FrameRGBA::decode(bytes)
        .map_err(|e| FrameError::validation(format!("ai raster does not decode: {e}")))?;
    if (frame.width, frame.height) != (output.width, output.height) {
        return Err(FrameError::validation(format!(
            "ai raster is {}x{}, expected {}x{}",
            frame.width, frame.height, output.width, output.height
        )));
    }

    let ix = (f64::from(output.width) * inset_fraction).ceil() as u32;
    let iy = (f64::from(output.height) * inset_fraction).ceil() as u32;
    for y in iy..output.height.saturating_sub(iy) {
        for x in ix..output.width.saturating_sub(ix) {
            if frame.pixel(x, y)[3] != 0 {
                return Err(FrameError::validation(format!(
                    "ai raster interior is not transparent at ({x}, {y})"
                )));
            }
        }
    }
    Ok(frame)
}

#[cfg(test)]
#[path = "../../tests/unit/export/exporter.rs"]
mod tests;
