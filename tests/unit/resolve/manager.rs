use super::*;
use crate::foundation::clock::SteppingClock;
use crate::foundation::core::Rgba8;
use crate::model::ids::OwnerId;
use crate::model::template::{FrameTemplate, Readiness, ShapeRef};
use crate::store::memory::{InMemoryAssignmentStore, InMemoryTemplateStore};
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Assignment store whose deactivation can be switched off.
#[derive(Default)]
struct FlakyAssignments {
    inner: InMemoryAssignmentStore,
    fail_set_active: AtomicBool,
}

impl AssignmentStore for FlakyAssignments {
    fn insert(&self, a: FrameAssignment) -> FrameResult<FrameAssignment> {
        self.inner.insert(a)
    }
    fn get(&self, id: AssignmentId) -> FrameResult<Option<FrameAssignment>> {
        self.inner.get(id)
    }
    fn query(&self, q: &AssignmentQuery) -> FrameResult<Vec<FrameAssignment>> {
        self.inner.query(q)
    }
    fn set_active(&self, ids: &[AssignmentId], active: bool) -> FrameResult<usize> {
        if self.fail_set_active.load(Ordering::SeqCst) {
            return Err(FrameError::store("timeout"));
        }
        self.inner.set_active(ids, active)
    }
    fn delete(&self, id: AssignmentId) -> FrameResult<bool> {
        self.inner.delete(id)
    }
}

struct Fixture {
    templates: Arc<InMemoryTemplateStore>,
    assignments: Arc<FlakyAssignments>,
    manager: AssignmentManager,
}

impl Fixture {
    fn new() -> Self {
        let templates = Arc::new(InMemoryTemplateStore::new());
        let assignments = Arc::new(FlakyAssignments::default());
        let manager = AssignmentManager::new(
            templates.clone(),
            assignments.clone(),
            Arc::new(SteppingClock::new(t0(), Duration::seconds(1))),
        );
        Self {
            templates,
            assignments,
            manager,
        }
    }

    fn template(&self) -> TemplateId {
        let t = FrameTemplate {
            id: TemplateId::generate(),
            owner_id: OwnerId::from("owner"),
            name: "t".to_owned(),
            shape: ShapeRef::from("cloud-puff".to_owned()),
            primary_color: Rgba8::WHITE,
            border_width: 8.0,
            border_radius: 12.0,
            custom_text: None,
            raster_asset: None,
            readiness: Readiness::Draft,
            created_at: t0(),
            updated_at: t0(),
            deleted_at: None,
        };
        self.templates.create(t).unwrap().id
    }

    fn active(&self, scope: &AssignmentScope) -> Vec<FrameAssignment> {
        self.assignments
            .query(&AssignmentQuery::exact(&scope.fields()).active_only())
            .unwrap()
    }
}

#[test]
fn assign_derives_priority_and_supersedes_bucket() {
    let f = Fixture::new();
    let (a, b) = (f.template(), f.template());
    let scope = AssignmentScope::child("E1", "C1");

    let first = f.manager.assign(a, &scope).unwrap();
    assert_eq!(first.priority, 50);
    assert!(first.is_active);

    let second = f.manager.assign(b, &scope).unwrap();
    let active = f.active(&scope);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.id);
    assert!(!f.assignments.get(first.id).unwrap().unwrap().is_active);
}

#[test]
fn event_and_child_buckets_are_independent() {
    let f = Fixture::new();
    let t = f.template();
    f.manager.assign(t, &AssignmentScope::event("E1")).unwrap();
    f.manager.assign(t, &AssignmentScope::child("E1", "C1")).unwrap();
    f.manager.assign(t, &AssignmentScope::child("E1", "C2")).unwrap();
    assert_eq!(f.active(&AssignmentScope::event("E1")).len(), 1);
    assert_eq!(f.active(&AssignmentScope::child("E1", "C1")).len(), 1);
    assert_eq!(f.active(&AssignmentScope::child("E1", "C2")).len(), 1);
}

#[test]
fn assigning_missing_or_deleted_template_is_rejected() {
    let f = Fixture::new();
    let err = f
        .manager
        .assign(TemplateId::generate(), &AssignmentScope::gift("X"))
        .unwrap_err();
    assert!(err.is_validation());

    let t = f.template();
    f.templates.soft_delete(t, t0()).unwrap();
    assert!(f
        .manager
        .assign(t, &AssignmentScope::gift("X"))
        .unwrap_err()
        .is_validation());
    assert!(f.assignments.inner.is_empty());
}

#[test]
fn blank_scope_ids_are_rejected() {
    let f = Fixture::new();
    let t = f.template();
    assert!(f
        .manager
        .assign(t, &AssignmentScope::event("  "))
        .unwrap_err()
        .is_validation());
}

#[test]
fn failed_deactivation_still_inserts() {
    let f = Fixture::new();
    let t = f.template();
    let scope = AssignmentScope::guest("G", Some("E1"));
    f.manager.assign(t, &scope).unwrap();

    f.assignments.fail_set_active.store(true, Ordering::SeqCst);
    let newer = f.manager.assign(t, &scope).unwrap();
    assert_eq!(f.active(&scope).len(), 2);

    f.assignments.fail_set_active.store(false, Ordering::SeqCst);
    assert_eq!(f.manager.reconcile_bucket(&scope).unwrap(), 1);
    let active = f.active(&scope);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, newer.id);
    assert_eq!(f.manager.reconcile_bucket(&scope).unwrap(), 0);
}

#[test]
fn bulk_assign_creates_one_row_per_target() {
    let f = Fixture::new();
    let t = f.template();
    let targets = BulkTargets {
        event_id: Some(EventId::from("E1")),
        child_ids: vec![ChildId::from("C1"), ChildId::from("C2")],
        guest_ids: vec![GuestId::from("G1")],
    };
    let rows = f.manager.bulk_assign(t, &targets).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows.iter().map(|a| a.priority).collect::<Vec<_>>(),
        vec![50, 50, 75]
    );
    assert!(rows
        .iter()
        .all(|a| a.scope.event_id == Some(EventId::from("E1"))));
}

#[test]
fn bulk_assign_validates_targets() {
    let f = Fixture::new();
    let t = f.template();
    let none = BulkTargets {
        event_id: Some(EventId::from("E1")),
        ..BulkTargets::default()
    };
    assert!(f.manager.bulk_assign(t, &none).unwrap_err().is_validation());

    let orphan_children = BulkTargets {
        child_ids: vec![ChildId::from("C1")],
        ..BulkTargets::default()
    };
    assert!(f
        .manager
        .bulk_assign(t, &orphan_children)
        .unwrap_err()
        .is_validation());

    let guests_only = BulkTargets {
        guest_ids: vec![GuestId::from("G1")],
        ..BulkTargets::default()
    };
    let rows = f.manager.bulk_assign(t, &guests_only).unwrap();
    assert_eq!(rows[0].scope.event_id, None);
}

#[test]
fn remove_is_hard_and_unknown_ids_fail() {
    let f = Fixture::new();
    let t = f.template();
    let a = f.manager.assign(t, &AssignmentScope::gift("X")).unwrap();
    f.manager.remove(a.id).unwrap();
    assert!(f.assignments.get(a.id).unwrap().is_none());
    assert!(f.manager.remove(a.id).unwrap_err().is_validation());
}

#[test]
fn list_for_template_orders_by_priority_then_recency() {
    let f = Fixture::new();
    let t = f.template();
    let other = f.template();
    let ev = f.manager.assign(t, &AssignmentScope::event("E1")).unwrap();
    let gift = f.manager.assign(t, &AssignmentScope::gift("X")).unwrap();
    let ev2 = f.manager.assign(t, &AssignmentScope::event("E2")).unwrap();
    f.manager.assign(other, &AssignmentScope::event("E3")).unwrap();

    let ids: Vec<_> = f
        .manager
        .list_for_template(t)
        .unwrap()
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![gift.id, ev2.id, ev.id]);
}
