use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::ShapeId,
    foundation::core::{Canvas, Rgba8},
    foundation::error::{FrameError, FrameResult},
    model::ids::{OwnerId, TemplateId},
    store::AssetRef,
};

/// Sentinel stored in place of a catalog shape for AI-produced frames.
pub const AI_GENERATED_SHAPE: &str = "ai-generated";

/// What a template draws: a catalog shape, or a pre-made AI raster.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShapeRef {
    /// Procedural shape from the catalog.
    Catalog(ShapeId),
    /// No procedural geometry; the raster asset is the frame.
    AiGenerated,
}

impl ShapeRef {
    /// Catalog shape id, if any.
    pub fn shape_id(&self) -> Option<&ShapeId> {
        match self {
            Self::Catalog(id) => Some(id),
            Self::AiGenerated => None,
        }
    }
}

impl From<String> for ShapeRef {
    fn from(s: String) -> Self {
        if s == AI_GENERATED_SHAPE {
            Self::AiGenerated
        } else {
            Self::Catalog(ShapeId::new(s))
        }
    }
}

impl From<ShapeRef> for String {
    fn from(s: ShapeRef) -> Self {
        match s {
            ShapeRef::Catalog(id) => id.into_string(),
            ShapeRef::AiGenerated => AI_GENERATED_SHAPE.to_owned(),
        }
    }
}

/// Band the custom text sits in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    /// Top border band.
    Top,
    /// Bottom border band.
    #[default]
    Bottom,
}

/// Caption drawn inside the border band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomText {
    /// Text content. Empty text is treated as absent.
    pub text: String,
    /// Which band hosts the text.
    #[serde(default)]
    pub position: TextPosition,
    /// Text fill color.
    pub color: Rgba8,
    /// Font family name, used by the vector overlay.
    #[serde(default = "default_font_family")]
    pub font: String,
}

fn default_font_family() -> String {
    "sans-serif".to_owned()
}

/// Rendering lifecycle of a template.
///
/// `Draft -> Rendering -> Ready | Degraded`. Both terminal states are usable; `Degraded`
/// means compositing uses the plain fallback border.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Readiness {
    /// No raster yet.
    #[default]
    Draft,
    /// Export in progress.
    Rendering,
    /// Raster asset attached.
    Ready,
    /// Export failed; downstream falls back to a plain bordered rectangle.
    Degraded {
        /// Human-readable export failure.
        reason: String,
    },
}

impl Readiness {
    /// Validate and apply a transition.
    pub fn transition(&self, next: Self) -> FrameResult<Self> {
        let ok = matches!(
            (self, &next),
            (Self::Draft, Self::Rendering)
                | (Self::Rendering, Self::Ready)
                | (Self::Rendering, Self::Degraded { .. })
        );
        if ok {
            Ok(next)
        } else {
            Err(FrameError::validation(format!(
                "illegal readiness transition {} -> {}",
                self.label(),
                next.label()
            )))
        }
    }

    /// Terminal states can be composited.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Ready | Self::Degraded { .. })
    }

    /// Short state name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Rendering => "rendering",
            Self::Ready => "ready",
            Self::Degraded { .. } => "degraded",
        }
    }
}

/// Reusable decorative border definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTemplate {
    /// Identifier.
    pub id: TemplateId,
    /// Owning account.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Catalog shape or AI sentinel.
    pub shape: ShapeRef,
    /// Main border color.
    pub primary_color: Rgba8,
    /// Border width in design-canvas pixels.
    pub border_width: f64,
    /// Corner radius in design-canvas pixels.
    pub border_radius: f64,
    /// Optional caption.
    #[serde(default)]
    pub custom_text: Option<CustomText>,
    /// Exported (or AI-supplied) raster.
    #[serde(default)]
    pub raster_asset: Option<AssetRef>,
    /// Rendering lifecycle state.
    #[serde(default)]
    pub readiness: Readiness,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last edit instant.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion marker.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FrameTemplate {
    /// Whether the frame comes from the AI producer rather than the catalog.
    pub fn is_ai_generated(&self) -> bool {
        matches!(self.shape, ShapeRef::AiGenerated)
    }

    /// Whether the template was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check the AI/raster invariant for the current readiness.
    pub fn check_invariants(&self) -> FrameResult<()> {
        if self.readiness == Readiness::Ready && self.raster_asset.is_none() {
            return Err(FrameError::validation(format!(
                "ready {} template must reference a raster asset",
                if self.is_ai_generated() { "ai-generated" } else { "catalog" }
            )));
        }
        if self.is_ai_generated() && matches!(self.readiness, Readiness::Degraded { .. }) {
            return Err(FrameError::validation(
                "ai-generated templates have no procedural fallback to degrade to",
            ));
        }
        Ok(())
    }

    /// Re-enter `Draft` ahead of an edit. The previous raster no longer matches and is dropped.
    pub fn reset_for_edit(&mut self, at: DateTime<Utc>) {
        self.readiness = Readiness::Draft;
        self.raster_asset = None;
        self.updated_at = at;
    }

    /// Edit-state view used by renderers.
    pub fn to_draft(&self) -> TemplateDraft {
        TemplateDraft {
            owner_id: self.owner_id.clone(),
            name: self.name.clone(),
            shape: self.shape.clone(),
            primary_color: self.primary_color,
            border_width: self.border_width,
            border_radius: self.border_radius,
            custom_text: self.custom_text.clone(),
        }
    }
}

/// Unsaved (or in-progress edit) template parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateDraft {
    /// Owning account.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Catalog shape or AI sentinel.
    pub shape: ShapeRef,
    /// Main border color.
    pub primary_color: Rgba8,
    /// Border width in design-canvas pixels.
    pub border_width: f64,
    /// Corner radius in design-canvas pixels.
    pub border_radius: f64,
    /// Optional caption.
    #[serde(default)]
    pub custom_text: Option<CustomText>,
}

impl TemplateDraft {
    /// Draft for a catalog shape with the given styling.
    pub fn catalog(
        owner_id: impl Into<String>,
        name: impl Into<String>,
        shape: &str,
        primary_color: Rgba8,
        border_width: f64,
        border_radius: f64,
    ) -> Self {
        Self {
            owner_id: OwnerId::new(owner_id),
            name: name.into(),
            shape: ShapeRef::Catalog(ShapeId::new(shape)),
            primary_color,
            border_width,
            border_radius,
            custom_text: None,
        }
    }

    /// Attach a caption.
    pub fn with_text(mut self, text: CustomText) -> Self {
        self.custom_text = Some(text);
        self
    }

    /// Caption with non-empty content, if any.
    pub fn visible_text(&self) -> Option<&CustomText> {
        self.custom_text
            .as_ref()
            .filter(|t| !t.text.trim().is_empty())
    }

    /// Shape parameters for a given design canvas.
    pub fn params(&self, canvas: Canvas) -> crate::catalog::ShapeParams {
        crate::catalog::ShapeParams {
            canvas,
            primary_color: self.primary_color,
            border_width: self.border_width,
            border_radius: self.border_radius,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/template.rs"]
mod tests;
