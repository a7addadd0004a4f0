//! giftframe decides which decorative border applies to a thank-you video recording and renders
//! it.
//!
//! - Resolve a [`ResolutionContext`] to a single [`FrameTemplate`] through ranked assignments
//! - Generate a shape's [`DrawProgram`] from the [`ShapeCatalog`]
//! - Show it live as an SVG overlay ([`VectorOverlay`]) or bake it into a transparent PNG
//!   ([`RasterExporter`]) for compositing
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

pub mod catalog;
/// Runtime configuration.
pub mod config;
pub mod export;
pub(crate) mod model;
pub mod render;
pub mod resolve;
pub mod service;
pub mod store;

pub use crate::foundation::clock::{Clock, SteppingClock, SystemClock};
pub use crate::foundation::core::{BezPath, Canvas, Point, Rect, Rgba8};
pub use crate::foundation::error::{FrameError, FrameResult};

pub use crate::catalog::{DrawProgram, ShapeCatalog, ShapeDescriptor, ShapeId, ShapeParams};
pub use crate::config::FrameConfig;
pub use crate::export::{CompositingOverlay, ExportJob, RasterExporter, overlay_for, validate_ai_raster};
pub use crate::model::assignment::{
    AssignmentScope, BucketKey, FrameAssignment, ResolutionContext, ScopeFields, Tier,
};
pub use crate::model::ids::{
    AssignmentId, ChildId, EventId, GiftId, GuestId, OwnerId, TemplateId,
};
pub use crate::model::template::{
    AI_GENERATED_SHAPE, CustomText, FrameTemplate, Readiness, ShapeRef, TemplateDraft,
    TextPosition,
};
pub use crate::render::{FrameRGBA, RasterRenderer, RenderStyle, SvgPreviewer, Theme, VectorOverlay};
pub use crate::resolve::{AssignmentManager, BulkTargets, ResolutionEngine};
pub use crate::service::{AiFrameProducer, SaveOutcome, ServiceSettings, TemplateService};
pub use crate::store::{
    AssetRef, AssetStorage, AssignmentQuery, AssignmentStore, SignedUrl, TemplateStore,
};
