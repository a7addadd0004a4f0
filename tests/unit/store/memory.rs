use super::*;
use crate::foundation::core::Rgba8;
use crate::model::assignment::AssignmentScope;
use crate::model::template::{Readiness, ShapeRef};

fn template(owner: &str, secs: i64) -> FrameTemplate {
    let at = DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap();
    FrameTemplate {
        id: TemplateId::generate(),
        owner_id: OwnerId::from(owner),
        name: format!("t{secs}"),
        shape: ShapeRef::from("rounded-thick".to_owned()),
        primary_color: Rgba8::rgb(6, 182, 212),
        border_width: 14.0,
        border_radius: 16.0,
        custom_text: None,
        raster_asset: None,
        readiness: Readiness::Draft,
        created_at: at,
        updated_at: at,
        deleted_at: None,
    }
}

#[test]
fn template_crud_and_owner_listing() {
    let store = InMemoryTemplateStore::new();
    let a = store.create(template("owner-1", 2)).unwrap();
    let b = store.create(template("owner-1", 1)).unwrap();
    store.create(template("owner-2", 0)).unwrap();

    assert!(store.create(a.clone()).is_err());

    let listed = store.list_by_owner(&OwnerId::from("owner-1")).unwrap();
    assert_eq!(
        listed.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![b.id, a.id]
    );

    let mut edited = a.clone();
    edited.name = "renamed".to_owned();
    store.update(edited).unwrap();
    assert_eq!(store.get(a.id).unwrap().unwrap().name, "renamed");
    assert!(store.update(template("owner-1", 9)).is_err());
}

#[test]
fn soft_delete_hides_from_listing_but_keeps_row() {
    let store = InMemoryTemplateStore::new();
    let a = store.create(template("o", 0)).unwrap();
    assert!(store.soft_delete(a.id, Utc::now()).unwrap());
    assert!(store.list_by_owner(&OwnerId::from("o")).unwrap().is_empty());
    assert!(store.get(a.id).unwrap().unwrap().is_deleted());

    assert!(store.hard_delete(a.id).unwrap());
    assert!(store.get(a.id).unwrap().is_none());
    assert!(!store.hard_delete(a.id).unwrap());
    assert!(!store.soft_delete(a.id, Utc::now()).unwrap());
}

#[test]
fn assignment_set_active_counts_changes() {
    let store = InMemoryAssignmentStore::new();
    let a = store
        .insert(FrameAssignment::new(
            TemplateId::generate(),
            &AssignmentScope::event("E1"),
            Utc::now(),
        ))
        .unwrap();
    assert_eq!(store.set_active(&[a.id], false).unwrap(), 1);
    assert_eq!(store.set_active(&[a.id], false).unwrap(), 0);
    assert!(!store.get(a.id).unwrap().unwrap().is_active);

    let active = store
        .query(&AssignmentQuery::exact(&AssignmentScope::event("E1").fields()).active_only())
        .unwrap();
    assert!(active.is_empty());

    assert!(store.delete(a.id).unwrap());
    assert!(store.is_empty());
}
