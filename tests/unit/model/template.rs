use super::*;
use serde_json::json;

#[test]
fn shape_ref_sentinel_round_trips() {
    let s: ShapeRef = serde_json::from_value(json!("ai-generated")).unwrap();
    assert_eq!(s, ShapeRef::AiGenerated);
    assert!(s.shape_id().is_none());

    let s: ShapeRef = serde_json::from_value(json!("heart-love")).unwrap();
    assert_eq!(s.shape_id().map(ShapeId::as_str), Some("heart-love"));
    assert_eq!(serde_json::to_value(&s).unwrap(), json!("heart-love"));
}

#[test]
fn readiness_follows_state_machine() {
    let r = Readiness::Draft;
    let r = r.transition(Readiness::Rendering).unwrap();
    assert!(!r.is_usable());
    let ready = r.transition(Readiness::Ready).unwrap();
    assert!(ready.is_usable());

    assert!(ready.transition(Readiness::Rendering).is_err());
    assert!(Readiness::Draft.transition(Readiness::Ready).is_err());

    let degraded = Readiness::Rendering
        .transition(Readiness::Degraded {
            reason: "x".to_owned(),
        })
        .unwrap();
    assert!(degraded.is_usable());
    assert!(degraded.transition(Readiness::Ready).is_err());
}

#[test]
fn readiness_serializes_with_state_tag() {
    let v = serde_json::to_value(Readiness::Degraded {
        reason: "disk full".to_owned(),
    })
    .unwrap();
    assert_eq!(v, json!({"state": "degraded", "reason": "disk full"}));
}

#[test]
fn visible_text_ignores_blank_captions() {
    let draft = TemplateDraft::catalog("o", "n", "rounded-thick", Rgba8::rgb(1, 2, 3), 14.0, 12.0)
        .with_text(CustomText {
            text: "   ".to_owned(),
            position: TextPosition::Top,
            color: Rgba8::WHITE,
            font: "sans-serif".to_owned(),
        });
    assert!(draft.visible_text().is_none());
}

#[test]
fn draft_params_carry_styling() {
    let draft = TemplateDraft::catalog("o", "n", "rounded-thick", Rgba8::rgb(1, 2, 3), 14.0, 12.0);
    let p = draft.params(Canvas::new(200, 300).unwrap());
    assert_eq!(p.border_width, 14.0);
    assert_eq!(p.border_radius, 12.0);
    assert_eq!(p.primary_color, Rgba8::rgb(1, 2, 3));
}

#[test]
fn reset_for_edit_returns_to_draft_and_drops_raster() {
    let t0 = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    let draft = TemplateDraft::catalog("o", "n", "wave-bold", Rgba8::rgb(9, 9, 9), 8.0, 0.0);
    let mut t = FrameTemplate {
        id: TemplateId::generate(),
        owner_id: draft.owner_id.clone(),
        name: draft.name.clone(),
        shape: draft.shape.clone(),
        primary_color: draft.primary_color,
        border_width: draft.border_width,
        border_radius: draft.border_radius,
        custom_text: None,
        raster_asset: Some(AssetRef {
            path: "frames/wave-bold/x.png".to_owned(),
            content_type: "image/png".to_owned(),
            byte_len: 1,
        }),
        readiness: Readiness::Ready,
        created_at: t0,
        updated_at: t0,
        deleted_at: None,
    };
    t.check_invariants().unwrap();

    let later = t0 + chrono::Duration::seconds(30);
    t.reset_for_edit(later);
    assert_eq!(t.readiness, Readiness::Draft);
    assert!(t.raster_asset.is_none());
    assert_eq!(t.updated_at, later);
    assert!(t.readiness.transition(Readiness::Rendering).is_ok());
}
