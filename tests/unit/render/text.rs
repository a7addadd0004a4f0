use super::*;

fn text(s: &str, position: TextPosition) -> CustomText {
    CustomText {
        text: s.to_owned(),
        position,
        color: Rgba8::rgb(20, 20, 20),
        font: "Comic Neue".to_owned(),
    }
}

#[test]
fn caption_sits_centered_in_the_chosen_band() {
    let canvas = Canvas::new(400, 600).unwrap();
    let style = RenderStyle::default();

    let top = Caption::place(&text(" Happy 6th! ", TextPosition::Top), canvas, 30.0, &style).unwrap();
    assert_eq!(top.text, "Happy 6th!");
    assert_eq!(top.center, Point::new(200.0, 15.0));
    assert_eq!(top.font_size, 24.0);
    assert_eq!(top.max_width, 340.0);
    assert_eq!(top.font_family, "Comic Neue");

    let bottom =
        Caption::place(&text("x", TextPosition::Bottom), canvas, 30.0, &style).unwrap();
    assert_eq!(bottom.center, Point::new(200.0, 585.0));
}

#[test]
fn caption_is_confined_to_its_band_strip() {
    let canvas = Canvas::new(400, 600).unwrap();
    let style = RenderStyle::default();

    let top = Caption::place(&text("a", TextPosition::Top), canvas, 30.0, &style).unwrap();
    assert_eq!(top.clip, Rect::new(0.0, 0.0, 400.0, 30.0));
    let bottom = Caption::place(&text("a", TextPosition::Bottom), canvas, 30.0, &style).unwrap();
    assert_eq!(bottom.clip, Rect::new(0.0, 570.0, 400.0, 600.0));

    assert_eq!(bottom.max_height(), 30.0 - bottom.halo_width());
    assert!(bottom.max_height() < bottom.clip.height());
}

#[test]
fn tall_layouts_shrink_to_the_band_height() {
    let font = std::fs::read("tests/data/fonts/DejaVuSans.ttf").unwrap();
    let canvas = Canvas::new(400, 600).unwrap();
    let c = Caption::place(&text("Ájqgy", TextPosition::Bottom), canvas, 30.0, &RenderStyle::default())
        .unwrap();
    let mut engine = TextLayoutEngine::new();
    let layout = engine.layout_caption(&c, &font).unwrap();
    assert!(f64::from(layout.height()) <= c.max_height() + 0.5);
    assert!(f64::from(layout.width()) <= c.max_width + 0.5);
}

#[test]
fn font_size_is_bounded_by_the_band() {
    let canvas = Canvas::new(400, 600).unwrap();
    let c = Caption::place(&text("hi", TextPosition::Top), canvas, 10.0, &RenderStyle::default())
        .unwrap();
    assert!(c.font_size <= 10.0);
    assert!(c.halo_width() < c.font_size);
}

#[test]
fn blank_or_tiny_captions_are_skipped() {
    let canvas = Canvas::new(400, 600).unwrap();
    let style = RenderStyle::default();
    assert!(Caption::place(&text("  ", TextPosition::Top), canvas, 30.0, &style).is_none());
    assert!(Caption::place(&text("hi", TextPosition::Top), canvas, 1.0, &style).is_none());
}

#[test]
fn theme_picks_the_halo() {
    let canvas = Canvas::new(400, 600).unwrap();
    let t = text("hi", TextPosition::Top);
    let light = Caption::place(&t, canvas, 30.0, &RenderStyle::light()).unwrap();
    let dark = Caption::place(&t, canvas, 30.0, &RenderStyle::dark()).unwrap();
    assert!(light.halo.luma() > dark.halo.luma());
    assert_eq!(light.color, dark.color);
}

#[test]
fn layout_rejects_unusable_font_bytes() {
    let canvas = Canvas::new(400, 600).unwrap();
    let c = Caption::place(&text("hi", TextPosition::Top), canvas, 30.0, &RenderStyle::default())
        .unwrap();
    let mut engine = TextLayoutEngine::new();
    assert!(engine.layout_caption(&c, b"not a font").is_err());
}
