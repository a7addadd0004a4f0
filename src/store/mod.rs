//! Persistence seams.
//!
//! Templates, assignments and raster assets live in external systems. The core only needs the
//! operations below; in-memory and filesystem implementations are provided for tests, the CLI
//! and single-process deployments.

pub(crate) mod assets;
pub(crate) mod memory;

pub use assets::{FsAssetStorage, InMemoryAssetStorage, UrlSigner, normalize_rel_path, sha256_hex};
pub use memory::{InMemoryAssignmentStore, InMemoryTemplateStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::FrameResult,
    model::assignment::FrameAssignment,
    model::ids::{AssignmentId, ChildId, EventId, GiftId, GuestId, OwnerId, TemplateId},
    model::template::FrameTemplate,
};

/// Retrievable reference to a stored binary asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    /// Storage-relative path (`/`-separated, no `..`).
    pub path: String,
    /// MIME type.
    pub content_type: String,
    /// Payload size.
    pub byte_len: u64,
}

/// Time-limited retrieval URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUrl {
    /// URL including `expires` and `sig` query parameters.
    pub url: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Template persistence.
pub trait TemplateStore: Send + Sync {
    /// Persist a new template. Fails if the id already exists.
    fn create(&self, template: FrameTemplate) -> FrameResult<FrameTemplate>;
    /// Fetch by id, including soft-deleted rows.
    fn get(&self, id: TemplateId) -> FrameResult<Option<FrameTemplate>>;
    /// Replace an existing template.
    fn update(&self, template: FrameTemplate) -> FrameResult<FrameTemplate>;
    /// Mark deleted; returns `false` when the id is unknown.
    fn soft_delete(&self, id: TemplateId, at: DateTime<Utc>) -> FrameResult<bool>;
    /// Remove permanently; returns `false` when the id is unknown.
    fn hard_delete(&self, id: TemplateId) -> FrameResult<bool>;
    /// Non-deleted templates of an owner, oldest first.
    fn list_by_owner(&self, owner: &OwnerId) -> FrameResult<Vec<FrameTemplate>>;
}

/// Per-column scope constraint in an [`AssignmentQuery`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Column<T> {
    /// Column not constrained.
    Any,
    /// Column equals the value.
    Is(T),
    /// Column is empty.
    Absent,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T: PartialEq> Column<T> {
    fn from_option(v: Option<T>, absent_if_none: bool) -> Self {
        match v {
            Some(v) => Self::Is(v),
            None if absent_if_none => Self::Absent,
            None => Self::Any,
        }
    }

    /// Test a stored column value.
    pub fn matches(&self, value: Option<&T>) -> bool {
        match self {
            Self::Any => true,
            Self::Is(want) => value == Some(want),
            Self::Absent => value.is_none(),
        }
    }

    fn is_value(&self) -> bool {
        matches!(self, Self::Is(_))
    }
}

/// How scope columns combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Combinator {
    /// Every constrained column must match.
    #[default]
    All,
    /// At least one `Is` column must match; `Any`/`Absent` columns are ignored.
    AnyOf,
}

/// Assignment filter: any combination of the four scope ids plus template and active flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
    /// Event column.
    pub event_id: Column<EventId>,
    /// Child column.
    pub child_id: Column<ChildId>,
    /// Guest column.
    pub guest_id: Column<GuestId>,
    /// Gift column.
    pub gift_id: Column<GiftId>,
    /// Column combination.
    pub combinator: Combinator,
    /// Only rows linked to this template.
    pub template_id: Option<TemplateId>,
    /// Only rows with this active flag.
    pub active: Option<bool>,
}

impl AssignmentQuery {
    /// Rows whose columns equal any of the given ids.
    pub fn any_of(
        event_id: Option<EventId>,
        child_id: Option<ChildId>,
        guest_id: Option<GuestId>,
        gift_id: Option<GiftId>,
    ) -> Self {
        Self {
            event_id: Column::from_option(event_id, false),
            child_id: Column::from_option(child_id, false),
            guest_id: Column::from_option(guest_id, false),
            gift_id: Column::from_option(gift_id, false),
            combinator: Combinator::AnyOf,
            ..Self::default()
        }
    }

    /// Rows whose columns exactly equal `fields` (empty columns must be empty).
    pub fn exact(fields: &crate::model::assignment::ScopeFields) -> Self {
        Self {
            event_id: Column::from_option(fields.event_id.clone(), true),
            child_id: Column::from_option(fields.child_id.clone(), true),
            guest_id: Column::from_option(fields.guest_id.clone(), true),
            gift_id: Column::from_option(fields.gift_id.clone(), true),
            combinator: Combinator::All,
            ..Self::default()
        }
    }

    /// Rows linked to a template.
    pub fn for_template(template_id: TemplateId) -> Self {
        Self {
            template_id: Some(template_id),
            ..Self::default()
        }
    }

    /// Restrict to active rows.
    pub fn active_only(mut self) -> Self {
        self.active = Some(true);
        self
    }

    /// Evaluate against a stored row.
    pub fn matches(&self, a: &FrameAssignment) -> bool {
        if self.template_id.is_some_and(|t| t != a.template_id) {
            return false;
        }
        if self.active.is_some_and(|want| want != a.is_active) {
            return false;
        }
        let s = &a.scope;
        match self.combinator {
            Combinator::All => {
                self.event_id.matches(s.event_id.as_ref())
                    && self.child_id.matches(s.child_id.as_ref())
                    && self.guest_id.matches(s.guest_id.as_ref())
                    && self.gift_id.matches(s.gift_id.as_ref())
            }
            Combinator::AnyOf => {
                (self.event_id.is_value() && self.event_id.matches(s.event_id.as_ref()))
                    || (self.child_id.is_value() && self.child_id.matches(s.child_id.as_ref()))
                    || (self.guest_id.is_value() && self.guest_id.matches(s.guest_id.as_ref()))
                    || (self.gift_id.is_value() && self.gift_id.matches(s.gift_id.as_ref()))
            }
        }
    }
}

/// Assignment persistence.
pub trait AssignmentStore: Send + Sync {
    /// Persist a new assignment.
    fn insert(&self, assignment: FrameAssignment) -> FrameResult<FrameAssignment>;
    /// Fetch by id.
    fn get(&self, id: AssignmentId) -> FrameResult<Option<FrameAssignment>>;
    /// Rows matching the filter, in unspecified order.
    fn query(&self, query: &AssignmentQuery) -> FrameResult<Vec<FrameAssignment>>;
    /// Set the active flag on the given rows; returns how many rows changed.
    fn set_active(&self, ids: &[AssignmentId], active: bool) -> FrameResult<usize>;
    /// Remove permanently; returns `false` when the id is unknown.
    fn delete(&self, id: AssignmentId) -> FrameResult<bool>;
}

/// Binary asset persistence.
pub trait AssetStorage: Send + Sync {
    /// Store `bytes` at `path`, replacing any previous payload.
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> FrameResult<AssetRef>;
    /// Read a stored payload.
    fn get(&self, asset: &AssetRef) -> FrameResult<Vec<u8>>;
    /// Time-limited retrieval URL.
    fn signed_url(
        &self,
        asset: &AssetRef,
        ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> FrameResult<SignedUrl>;
}

#[cfg(test)]
#[path = "../../tests/unit/store/query.rs"]
mod tests;
