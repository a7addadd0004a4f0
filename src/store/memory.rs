use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::{
    foundation::error::{FrameError, FrameResult},
    model::assignment::FrameAssignment,
    model::ids::{AssignmentId, OwnerId, TemplateId},
    model::template::FrameTemplate,
    store::{AssignmentQuery, AssignmentStore, TemplateStore},
};

fn read<'a, T>(lock: &'a RwLock<T>, what: &str) -> FrameResult<RwLockReadGuard<'a, T>> {
    lock.read()
        .map_err(|_| FrameError::store(format!("{what} lock poisoned")))
}

fn write<'a, T>(lock: &'a RwLock<T>, what: &str) -> FrameResult<RwLockWriteGuard<'a, T>> {
    lock.write()
        .map_err(|_| FrameError::store(format!("{what} lock poisoned")))
}

/// Process-local [`TemplateStore`].
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    rows: RwLock<BTreeMap<TemplateId, FrameTemplate>>,
}

impl InMemoryTemplateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn create(&self, template: FrameTemplate) -> FrameResult<FrameTemplate> {
        let mut rows = write(&self.rows, "template store")?;
        if rows.contains_key(&template.id) {
            return Err(FrameError::store(format!(
                "template {} already exists",
                template.id
            )));
        }
        rows.insert(template.id, template.clone());
        Ok(template)
    }

    fn get(&self, id: TemplateId) -> FrameResult<Option<FrameTemplate>> {
        Ok(read(&self.rows, "template store")?.get(&id).cloned())
    }

    fn update(&self, template: FrameTemplate) -> FrameResult<FrameTemplate> {
        let mut rows = write(&self.rows, "template store")?;
        let Some(slot) = rows.get_mut(&template.id) else {
            return Err(FrameError::store(format!(
                "template {} does not exist",
                template.id
            )));
        };
        *slot = template.clone();
        Ok(template)
    }

    fn soft_delete(&self, id: TemplateId, at: DateTime<Utc>) -> FrameResult<bool> {
        let mut rows = write(&self.rows, "template store")?;
        match rows.get_mut(&id) {
            Some(t) => {
                t.deleted_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn hard_delete(&self, id: TemplateId) -> FrameResult<bool> {
        Ok(write(&self.rows, "template store")?.remove(&id).is_some())
    }

    fn list_by_owner(&self, owner: &OwnerId) -> FrameResult<Vec<FrameTemplate>> {
        let rows = read(&self.rows, "template store")?;
        let mut out: Vec<FrameTemplate> = rows
            .values()
            .filter(|t| &t.owner_id == owner && !t.is_deleted())
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }
}

/// Process-local [`AssignmentStore`].
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    rows: RwLock<BTreeMap<AssignmentId, FrameAssignment>>,
}

impl InMemoryAssignmentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, active or not.
    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn insert(&self, assignment: FrameAssignment) -> FrameResult<FrameAssignment> {
        let mut rows = write(&self.rows, "assignment store")?;
        if rows.contains_key(&assignment.id) {
            return Err(FrameError::store(format!(
                "assignment {} already exists",
                assignment.id
            )));
        }
        rows.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    fn get(&self, id: AssignmentId) -> FrameResult<Option<FrameAssignment>> {
        Ok(read(&self.rows, "assignment store")?.get(&id).cloned())
    }

    fn query(&self, query: &AssignmentQuery) -> FrameResult<Vec<FrameAssignment>> {
        let rows = read(&self.rows, "assignment store")?;
        Ok(rows.values().filter(|a| query.matches(a)).cloned().collect())
    }

    fn set_active(&self, ids: &[AssignmentId], active: bool) -> FrameResult<usize> {
        let mut rows = write(&self.rows, "assignment store")?;
        let mut changed = 0;
        for id in ids {
            if let Some(a) = rows.get_mut(id)
                && a.is_active != active
            {
                a.is_active = active;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn delete(&self, id: AssignmentId) -> FrameResult<bool> {
        Ok(write(&self.rows, "assignment store")?.remove(&id).is_some())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/memory.rs"]
mod tests;
