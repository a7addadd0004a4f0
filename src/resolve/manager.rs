use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    foundation::clock::Clock,
    foundation::error::{FrameError, FrameResult},
    model::assignment::{AssignmentScope, FrameAssignment},
    model::ids::{AssignmentId, ChildId, EventId, GuestId, TemplateId},
    resolve::engine::candidate_order,
    store::{AssignmentQuery, AssignmentStore, TemplateStore},
};

/// Targets of a bulk assignment. Every child and guest gets its own assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTargets {
    /// Shared event, required when `child_ids` is non-empty.
    #[serde(default)]
    pub event_id: Option<EventId>,
    /// Children within the event.
    #[serde(default)]
    pub child_ids: Vec<ChildId>,
    /// Guests, tied to the event when one is given.
    #[serde(default)]
    pub guest_ids: Vec<GuestId>,
}

impl BulkTargets {
    fn scopes(&self) -> FrameResult<Vec<AssignmentScope>> {
        if self.child_ids.is_empty() && self.guest_ids.is_empty() {
            return Err(FrameError::validation(
                "bulk assignment needs at least one child or guest id",
            ));
        }
        let mut out = Vec::with_capacity(self.child_ids.len() + self.guest_ids.len());
        if !self.child_ids.is_empty() {
            let Some(event_id) = &self.event_id else {
                return Err(FrameError::validation(
                    "child assignments require an event id",
                ));
            };
            out.extend(self.child_ids.iter().map(|c| AssignmentScope::Child {
                event_id: event_id.clone(),
                child_id: c.clone(),
            }));
        }
        out.extend(self.guest_ids.iter().map(|g| AssignmentScope::Guest {
            guest_id: g.clone(),
            event_id: self.event_id.clone(),
        }));
        Ok(out)
    }
}

/// Creates and removes assignments, keeping one active row per bucket.
#[derive(Clone)]
pub struct AssignmentManager {
    templates: Arc<dyn TemplateStore>,
    assignments: Arc<dyn AssignmentStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AssignmentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentManager").finish_non_exhaustive()
    }
}

impl AssignmentManager {
    /// Manager writing to `assignments`; `clock` stamps new rows.
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        assignments: Arc<dyn AssignmentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            templates,
            assignments,
            clock,
        }
    }

    fn require_template(&self, id: TemplateId) -> FrameResult<()> {
        match self.templates.get(id)? {
            Some(t) if !t.is_deleted() => Ok(()),
            Some(_) => Err(FrameError::validation(format!(
                "template {id} is deleted"
            ))),
            None => Err(FrameError::validation(format!(
                "template {id} does not exist"
            ))),
        }
    }

    fn active_in_bucket(&self, scope: &AssignmentScope) -> FrameResult<Vec<FrameAssignment>> {
        self.assignments
            .query(&AssignmentQuery::exact(&scope.fields()).active_only())
    }

    fn supersede_and_insert(
        &self,
        template_id: TemplateId,
        scope: &AssignmentScope,
    ) -> FrameResult<FrameAssignment> {
        let prior = self
            .active_in_bucket(scope)
            .map(|rows| rows.into_iter().map(|a| a.id).collect::<Vec<_>>());
        match prior {
            Ok(ids) if ids.is_empty() => {}
            Ok(ids) => {
                if let Err(e) = self.assignments.set_active(&ids, false) {
                    tracing::warn!(bucket = ?scope.bucket(), error = %e, "failed to deactivate superseded assignments");
                }
            }
            Err(e) => {
                tracing::warn!(bucket = ?scope.bucket(), error = %e, "failed to look up superseded assignments");
            }
        }
        self.assignments
            .insert(FrameAssignment::new(template_id, scope, self.clock.now()))
    }

    /// Bind `template_id` to `scope`, superseding the bucket's active assignment.
    ///
    /// A failed deactivation is logged and the insert still happens; resolution ordering picks
    /// the newest row until [`Self::reconcile_bucket`] runs.
    #[tracing::instrument(skip(self), fields(template = %template_id, tier = ?scope.tier()))]
    pub fn assign(
        &self,
        template_id: TemplateId,
        scope: &AssignmentScope,
    ) -> FrameResult<FrameAssignment> {
        scope.validate()?;
        self.require_template(template_id)?;
        self.supersede_and_insert(template_id, scope)
    }

    /// One assignment per child and guest, all sharing the event id.
    #[tracing::instrument(skip(self, targets), fields(template = %template_id, children = targets.child_ids.len(), guests = targets.guest_ids.len()))]
    pub fn bulk_assign(
        &self,
        template_id: TemplateId,
        targets: &BulkTargets,
    ) -> FrameResult<Vec<FrameAssignment>> {
        let scopes = targets.scopes()?;
        for scope in &scopes {
            scope.validate()?;
        }
        self.require_template(template_id)?;
        scopes
            .iter()
            .map(|scope| self.supersede_and_insert(template_id, scope))
            .collect()
    }

    /// Delete an assignment permanently.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, id: AssignmentId) -> FrameResult<()> {
        if self.assignments.delete(id)? {
            Ok(())
        } else {
            Err(FrameError::validation(format!(
                "assignment {id} does not exist"
            )))
        }
    }

    /// All assignments of a template, active or not, highest priority then newest first.
    pub fn list_for_template(&self, template_id: TemplateId) -> FrameResult<Vec<FrameAssignment>> {
        let mut rows = self
            .assignments
            .query(&AssignmentQuery::for_template(template_id))?;
        rows.sort_by(candidate_order);
        Ok(rows)
    }

    /// Keep only the newest active row of the bucket. Returns how many rows were deactivated.
    #[tracing::instrument(skip(self), fields(bucket = ?scope.bucket()))]
    pub fn reconcile_bucket(&self, scope: &AssignmentScope) -> FrameResult<usize> {
        scope.validate()?;
        let mut rows = self.active_in_bucket(scope)?;
        if rows.len() < 2 {
            return Ok(0);
        }
        rows.sort_by(candidate_order);
        let stale: Vec<AssignmentId> = rows.iter().skip(1).map(|a| a.id).collect();
        let changed = self.assignments.set_active(&stale, false)?;
        tracing::info!(deactivated = changed, "reconciled bucket");
        Ok(changed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/manager.rs"]
mod tests;
