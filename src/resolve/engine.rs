use std::cmp::Ordering;
use std::sync::Arc;

use crate::{
    foundation::error::FrameResult,
    model::assignment::{FrameAssignment, ResolutionContext},
    model::template::FrameTemplate,
    store::{AssignmentQuery, AssignmentStore, TemplateStore},
};

/// Order in which candidates win: priority, then recency, then assignment id.
pub fn candidate_order(a: &FrameAssignment, b: &FrameAssignment) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Picks the single template governing a recording context.
#[derive(Clone)]
pub struct ResolutionEngine {
    templates: Arc<dyn TemplateStore>,
    assignments: Arc<dyn AssignmentStore>,
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine").finish_non_exhaustive()
    }
}

impl ResolutionEngine {
    /// Engine reading from the given stores.
    pub fn new(templates: Arc<dyn TemplateStore>, assignments: Arc<dyn AssignmentStore>) -> Self {
        Self {
            templates,
            assignments,
        }
    }

    /// Active assignments that govern `ctx`, best first.
    pub fn candidates(&self, ctx: &ResolutionContext) -> FrameResult<Vec<FrameAssignment>> {
        if ctx.is_empty() {
            return Ok(Vec::new());
        }
        let query = AssignmentQuery::any_of(
            ctx.event_id.clone(),
            ctx.child_id.clone(),
            ctx.guest_id.clone(),
            ctx.gift_id.clone(),
        )
        .active_only();
        let mut out: Vec<FrameAssignment> = self
            .assignments
            .query(&query)?
            .into_iter()
            .filter(|a| a.applies_to(ctx))
            .collect();
        out.sort_by(candidate_order);
        Ok(out)
    }

    /// Template for `ctx`, or `None` when nothing applies.
    ///
    /// Read-only and deterministic for a fixed store state. Candidates whose template is gone or
    /// soft-deleted are passed over in favor of the next one.
    #[tracing::instrument(skip(self), fields(
        event = ?ctx.event_id, child = ?ctx.child_id, guest = ?ctx.guest_id, gift = ?ctx.gift_id,
    ))]
    pub fn resolve(&self, ctx: &ResolutionContext) -> FrameResult<Option<FrameTemplate>> {
        for candidate in self.candidates(ctx)? {
            match self.templates.get(candidate.template_id)? {
                Some(t) if !t.is_deleted() => {
                    tracing::debug!(assignment = %candidate.id, template = %t.id, priority = candidate.priority, "resolved");
                    return Ok(Some(t));
                }
                Some(_) => {
                    tracing::debug!(assignment = %candidate.id, template = %candidate.template_id, "skipping deleted template");
                }
                None => {
                    tracing::debug!(assignment = %candidate.id, template = %candidate.template_id, "skipping missing template");
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/engine.rs"]
mod tests;
