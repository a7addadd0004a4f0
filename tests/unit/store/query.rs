use super::*;
use crate::model::assignment::{AssignmentScope, FrameAssignment};

fn row(scope: AssignmentScope) -> FrameAssignment {
    FrameAssignment::new(TemplateId::generate(), &scope, Utc::now())
}

#[test]
fn any_of_matches_on_any_provided_column() {
    let q = AssignmentQuery::any_of(
        Some(EventId::from("E1")),
        Some(ChildId::from("C1")),
        None,
        None,
    );
    assert!(q.matches(&row(AssignmentScope::event("E1"))));
    assert!(q.matches(&row(AssignmentScope::child("E1", "C9"))));
    assert!(q.matches(&row(AssignmentScope::child("E7", "C1"))));
    assert!(!q.matches(&row(AssignmentScope::gift("X1"))));
    assert!(!q.matches(&row(AssignmentScope::guest("G1", None))));
}

#[test]
fn any_of_with_no_ids_matches_nothing() {
    let q = AssignmentQuery::any_of(None, None, None, None);
    assert!(!q.matches(&row(AssignmentScope::event("E1"))));
}

#[test]
fn exact_treats_empty_columns_as_absent() {
    let q = AssignmentQuery::exact(&AssignmentScope::event("E1").fields());
    assert!(q.matches(&row(AssignmentScope::event("E1"))));
    assert!(!q.matches(&row(AssignmentScope::child("E1", "C1"))));
    assert!(!q.matches(&row(AssignmentScope::guest("G1", Some("E1")))));
}

#[test]
fn active_and_template_filters_apply() {
    let mut a = row(AssignmentScope::gift("X1"));
    let q = AssignmentQuery::for_template(a.template_id).active_only();
    assert!(q.matches(&a));

    a.is_active = false;
    assert!(!q.matches(&a));

    let other = AssignmentQuery::for_template(TemplateId::generate());
    assert!(!other.matches(&row(AssignmentScope::gift("X1"))));
}
