//! Template lifecycle: save, render, assign, delete.
//!
//! Saving walks the readiness state machine. A failed export never fails the save; the template
//! lands in `Degraded` and the caller gets a warning instead.

use std::sync::Arc;

use crate::{
    catalog::ShapeCatalog,
    config::FrameConfig,
    export::{CompositingOverlay, PNG_CONTENT_TYPE, RasterExporter, overlay_for, validate_ai_raster},
    foundation::clock::Clock,
    foundation::core::{Canvas, Rgba8},
    foundation::error::{FrameError, FrameResult},
    model::assignment::{AssignmentScope, FrameAssignment, ResolutionContext},
    model::ids::{OwnerId, TemplateId},
    model::template::{FrameTemplate, Readiness, ShapeRef, TemplateDraft},
    resolve::{AssignmentManager, ResolutionEngine},
    store::assets::sha256_hex,
    store::{AssetStorage, AssignmentStore, SignedUrl, TemplateStore},
};

/// Supplies ready-made frame rasters from a text description.
pub trait AiFrameProducer: Send + Sync {
    /// Encoded image bytes at the configured export size.
    fn produce(&self, description: &str, color: Rgba8) -> FrameResult<Vec<u8>>;
}

/// Result of saving a template.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveOutcome {
    /// Stored template, `Ready` or `Degraded`.
    pub template: FrameTemplate,
    /// Implicit assignment, when a target scope was given.
    pub assignment: Option<FrameAssignment>,
    /// Non-fatal problems, such as a failed export.
    pub warnings: Vec<String>,
}

/// Canvas sizes and thresholds the service works with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServiceSettings {
    /// Canvas template widths and radii refer to.
    pub design: Canvas,
    /// Raster export size.
    pub output: Canvas,
    /// Transparent interior inset for AI rasters.
    pub ai_interior_inset: f64,
    /// Signed URL lifetime.
    pub url_ttl: chrono::Duration,
}

impl ServiceSettings {
    /// Settings from a validated config.
    pub fn from_config(cfg: &FrameConfig) -> FrameResult<Self> {
        cfg.validate()?;
        Ok(Self {
            design: cfg.export.design_canvas()?,
            output: cfg.export.output_canvas()?,
            ai_interior_inset: cfg.export.ai_interior_inset,
            url_ttl: cfg.signing.ttl(),
        })
    }
}

/// Front door for template persistence, rendering and assignment.
pub struct TemplateService {
    templates: Arc<dyn TemplateStore>,
    storage: Arc<dyn AssetStorage>,
    catalog: Arc<ShapeCatalog>,
    exporter: RasterExporter,
    manager: AssignmentManager,
    engine: ResolutionEngine,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
}

impl std::fmt::Debug for TemplateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateService")
            .field("settings", &self.settings)
            .field("exporter", &self.exporter)
            .finish_non_exhaustive()
    }
}

impl TemplateService {
    /// Service over the given stores, catalog and clock.
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        assignments: Arc<dyn AssignmentStore>,
        storage: Arc<dyn AssetStorage>,
        catalog: Arc<ShapeCatalog>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            exporter: RasterExporter::new(catalog.clone(), storage.clone()),
            manager: AssignmentManager::new(templates.clone(), assignments.clone(), clock.clone()),
            engine: ResolutionEngine::new(templates.clone(), assignments),
            templates,
            storage,
            catalog,
            clock,
            settings,
        }
    }

    /// Replace the exporter, e.g. to add a caption font or thread count.
    pub fn with_exporter(mut self, exporter: RasterExporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Canvas sizes and thresholds in use.
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Assignment operations sharing this service's stores.
    pub fn assignments(&self) -> &AssignmentManager {
        &self.manager
    }

    /// Resolution over this service's stores.
    pub fn resolver(&self) -> &ResolutionEngine {
        &self.engine
    }

    fn validate_draft(&self, draft: &TemplateDraft) -> FrameResult<()> {
        if draft.name.trim().is_empty() {
            return Err(FrameError::validation("template name must not be empty"));
        }
        if draft.owner_id.as_str().trim().is_empty() {
            return Err(FrameError::validation("template owner must not be empty"));
        }
        let Some(shape) = draft.shape.shape_id() else {
            return Err(FrameError::validation(
                "ai-generated templates are created from a produced raster",
            ));
        };
        self.catalog.get(shape)?;
        draft.params(self.settings.design).validate()
    }

    /// Move `Draft -> Rendering -> Ready | Degraded`, exporting in between, and persist each step.
    fn render_and_store(
        &self,
        mut t: FrameTemplate,
        warnings: &mut Vec<String>,
    ) -> FrameResult<FrameTemplate> {
        t.readiness = t.readiness.transition(Readiness::Rendering)?;
        let mut t = self.templates.update(t)?;
        match self
            .exporter
            .export_draft(&t.to_draft(), self.settings.design, self.settings.output)
        {
            Ok(asset) => {
                t.readiness = t.readiness.transition(Readiness::Ready)?;
                t.raster_asset = Some(asset);
            }
            Err(e) => {
                tracing::warn!(template = %t.id, error = %e, "raster export failed; template degraded");
                warnings.push(format!("raster export failed: {e}"));
                t.readiness = t.readiness.transition(Readiness::Degraded {
                    reason: e.to_string(),
                })?;
                t.raster_asset = None;
            }
        }
        t.check_invariants()?;
        self.templates.update(t)
    }

    fn assign_target(
        &self,
        id: TemplateId,
        target: Option<&AssignmentScope>,
    ) -> FrameResult<Option<FrameAssignment>> {
        target.map(|scope| self.manager.assign(id, scope)).transpose()
    }

    /// Create a catalog template, export its raster, and optionally assign it.
    #[tracing::instrument(skip(self, draft), fields(owner = %draft.owner_id, name = %draft.name))]
    pub fn save_template(
        &self,
        draft: &TemplateDraft,
        target: Option<&AssignmentScope>,
    ) -> FrameResult<SaveOutcome> {
        self.validate_draft(draft)?;
        if let Some(scope) = target {
            scope.validate()?;
        }
        let now = self.clock.now();
        let t = self.templates.create(FrameTemplate {
            id: TemplateId::generate(),
            owner_id: draft.owner_id.clone(),
            name: draft.name.trim().to_owned(),
            shape: draft.shape.clone(),
            primary_color: draft.primary_color,
            border_width: draft.border_width,
            border_radius: draft.border_radius,
            custom_text: draft.custom_text.clone(),
            raster_asset: None,
            readiness: Readiness::Draft,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })?;

        let mut warnings = Vec::new();
        let template = self.render_and_store(t, &mut warnings)?;
        let assignment = self.assign_target(template.id, target)?;
        Ok(SaveOutcome {
            template,
            assignment,
            warnings,
        })
    }

    /// Apply an edit to an existing catalog template and re-export it.
    #[tracing::instrument(skip(self, draft), fields(template = %id))]
    pub fn update_template(
        &self,
        id: TemplateId,
        draft: &TemplateDraft,
        target: Option<&AssignmentScope>,
    ) -> FrameResult<SaveOutcome> {
        let mut t = self.live_template(id)?;
        if t.is_ai_generated() {
            return Err(FrameError::validation(
                "ai-generated templates are replaced, not edited",
            ));
        }
        if t.owner_id != draft.owner_id {
            return Err(FrameError::validation(format!(
                "template {id} belongs to another owner"
            )));
        }
        self.validate_draft(draft)?;
        if let Some(scope) = target {
            scope.validate()?;
        }

        t.reset_for_edit(self.clock.now());
        t.name = draft.name.trim().to_owned();
        t.shape = draft.shape.clone();
        t.primary_color = draft.primary_color;
        t.border_width = draft.border_width;
        t.border_radius = draft.border_radius;
        t.custom_text = draft.custom_text.clone();
        let t = self.templates.update(t)?;

        let mut warnings = Vec::new();
        let template = self.render_and_store(t, &mut warnings)?;
        let assignment = self.assign_target(template.id, target)?;
        Ok(SaveOutcome {
            template,
            assignment,
            warnings,
        })
    }

    /// Validate and store an externally produced raster as a ready AI template.
    #[tracing::instrument(skip(self, bytes), fields(owner = %owner_id, len = bytes.len()))]
    pub fn accept_ai_raster(
        &self,
        owner_id: &OwnerId,
        name: &str,
        primary_color: Rgba8,
        bytes: &[u8],
        target: Option<&AssignmentScope>,
    ) -> FrameResult<SaveOutcome> {
        if name.trim().is_empty() {
            return Err(FrameError::validation("template name must not be empty"));
        }
        if let Some(scope) = target {
            scope.validate()?;
        }
        let frame = validate_ai_raster(bytes, self.settings.output, self.settings.ai_interior_inset)?;
        let png = frame.encode_png()?;
        let path = format!("frames/ai-generated/{}.png", sha256_hex(&png));
        let asset = self.storage.put(&path, &png, PNG_CONTENT_TYPE)?;

        let now = self.clock.now();
        let mut t = FrameTemplate {
            id: TemplateId::generate(),
            owner_id: owner_id.clone(),
            name: name.trim().to_owned(),
            shape: ShapeRef::AiGenerated,
            primary_color,
            border_width: 0.0,
            border_radius: 0.0,
            custom_text: None,
            raster_asset: None,
            readiness: Readiness::Draft,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        t.readiness = t
            .readiness
            .transition(Readiness::Rendering)?
            .transition(Readiness::Ready)?;
        t.raster_asset = Some(asset);
        t.check_invariants()?;
        let template = self.templates.create(t)?;
        let assignment = self.assign_target(template.id, target)?;
        Ok(SaveOutcome {
            template,
            assignment,
            warnings: Vec::new(),
        })
    }

    /// Ask `producer` for a frame and accept it like any other AI raster.
    pub fn generate_ai_template(
        &self,
        producer: &dyn AiFrameProducer,
        owner_id: &OwnerId,
        name: &str,
        description: &str,
        primary_color: Rgba8,
        target: Option<&AssignmentScope>,
    ) -> FrameResult<SaveOutcome> {
        let bytes = producer.produce(description, primary_color)?;
        self.accept_ai_raster(owner_id, name, primary_color, &bytes, target)
    }

    fn live_template(&self, id: TemplateId) -> FrameResult<FrameTemplate> {
        match self.templates.get(id)? {
            Some(t) if !t.is_deleted() => Ok(t),
            _ => Err(FrameError::validation(format!(
                "template {id} does not exist"
            ))),
        }
    }

    /// Fetch a template that has not been deleted.
    pub fn get_template(&self, id: TemplateId) -> FrameResult<Option<FrameTemplate>> {
        Ok(self.templates.get(id)?.filter(|t| !t.is_deleted()))
    }

    /// Owner's templates, oldest first.
    pub fn list_by_owner(&self, owner: &OwnerId) -> FrameResult<Vec<FrameTemplate>> {
        self.templates.list_by_owner(owner)
    }

    /// Hide a template. Its assignments stay but resolution skips it.
    #[tracing::instrument(skip(self))]
    pub fn soft_delete(&self, id: TemplateId) -> FrameResult<()> {
        if self.templates.soft_delete(id, self.clock.now())? {
            Ok(())
        } else {
            Err(FrameError::validation(format!(
                "template {id} does not exist"
            )))
        }
    }

    /// Remove a template and every assignment pointing at it.
    #[tracing::instrument(skip(self))]
    pub fn hard_delete(&self, id: TemplateId) -> FrameResult<()> {
        for a in self.manager.list_for_template(id)? {
            self.manager.remove(a.id)?;
        }
        if self.templates.hard_delete(id)? {
            Ok(())
        } else {
            Err(FrameError::validation(format!(
                "template {id} does not exist"
            )))
        }
    }

    /// Time-limited URL of the template's raster, if it has one.
    pub fn raster_url(&self, id: TemplateId) -> FrameResult<Option<SignedUrl>> {
        let t = self.live_template(id)?;
        t.raster_asset
            .as_ref()
            .map(|asset| {
                self.storage
                    .signed_url(asset, self.settings.url_ttl, self.clock.now())
            })
            .transpose()
    }

    /// Resolve `ctx` and describe what a compositor should overlay.
    pub fn compositing_overlay(&self, ctx: &ResolutionContext) -> FrameResult<CompositingOverlay> {
        let template = self.engine.resolve(ctx)?;
        overlay_for(
            template.as_ref(),
            &self.catalog,
            self.settings.design,
            self.settings.output,
        )
    }
}

#[cfg(test)]
#[path = "../tests/unit/service.rs"]
mod tests;
