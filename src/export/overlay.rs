use crate::{
    catalog::{DrawProgram, ShapeCatalog, ShapeFamily, ShapeParams},
    foundation::core::Canvas,
    foundation::error::FrameResult,
    model::template::{FrameTemplate, Readiness},
    store::AssetRef,
};

/// What a video compositor should lay over the recording.
#[derive(Clone, Debug, PartialEq)]
pub enum CompositingOverlay {
    /// Baked raster asset of a ready template.
    Raster(AssetRef),
    /// Plain bordered rectangle in the template's color and width, drawn at output size.
    Fallback(DrawProgram),
    /// Nothing applies.
    None,
}

/// Choose the compositing overlay for a resolved template.
///
/// `design` is the canvas the template's widths refer to; the fallback is scaled to `output`.
pub fn overlay_for(
    template: Option<&FrameTemplate>,
    catalog: &ShapeCatalog,
    design: Canvas,
    output: Canvas,
) -> FrameResult<CompositingOverlay> {
    let Some(t) = template else {
        return Ok(CompositingOverlay::None);
    };
    if t.readiness == Readiness::Ready
        && let Some(asset) = &t.raster_asset
    {
        return Ok(CompositingOverlay::Raster(asset.clone()));
    }
    let Some(shape) = t.shape.shape_id() else {
        return Ok(CompositingOverlay::None);
    };
    if !catalog.contains(shape) {
        tracing::debug!(template = %t.id, shape = %shape, "no fallback for unknown shape");
        return Ok(CompositingOverlay::None);
    }

    let min = design.min_side();
    let params = ShapeParams {
        canvas: design,
        primary_color: t.primary_color,
        border_width: t.border_width.clamp(1.0, min / 8.0),
        border_radius: t.border_radius.clamp(0.0, min / 2.0),
    }
    .scaled_to(output)?;
    Ok(CompositingOverlay::Fallback(
        ShapeFamily::Simple { square: false }.generate(&params),
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/export/overlay.rs"]
mod tests;
