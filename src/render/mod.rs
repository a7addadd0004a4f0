//! Draw programs to pixels and overlay documents.
//!
//! The vector path emits SVG for the live overlay and can preview it through usvg/resvg; the
//! raster path drives `vello_cpu` for export. Both consume the same [`crate::DrawProgram`].

pub(crate) mod raster;
pub(crate) mod text;
pub(crate) mod vector;

pub use raster::{FrameRGBA, RasterRenderer};
pub use text::{Caption, RenderStyle, TextLayoutEngine, Theme};
pub use vector::{OverlayInput, SvgPreviewer, VectorOverlay, svg_document};
