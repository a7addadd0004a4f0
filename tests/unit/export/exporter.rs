use super::*;
use crate::foundation::core::Rgba8;
use crate::model::template::TextPosition;
use crate::store::SignedUrl;
use crate::store::assets::{InMemoryAssetStorage, UrlSigner};
use chrono::{DateTime, Utc};

fn storage() -> Arc<InMemoryAssetStorage> {
    Arc::new(InMemoryAssetStorage::new(UrlSigner::new(
        "https://assets.local",
        "k",
    )))
}

fn exporter(storage: Arc<dyn AssetStorage>) -> RasterExporter {
    RasterExporter::new(Arc::new(ShapeCatalog::builtin()), storage)
}

fn params() -> ShapeParams {
    ShapeParams {
        canvas: Canvas::new(200, 320).unwrap(),
        primary_color: Rgba8::rgb(139, 92, 246),
        border_width: 8.0,
        border_radius: 16.0,
    }
}

fn out() -> Canvas {
    Canvas::new(100, 160).unwrap()
}

struct BrokenStorage;

impl AssetStorage for BrokenStorage {
    fn put(&self, _path: &str, _bytes: &[u8], _content_type: &str) -> FrameResult<AssetRef> {
        Err(FrameError::store("bucket unreachable"))
    }

    fn get(&self, _asset: &AssetRef) -> FrameResult<Vec<u8>> {
        Err(FrameError::store("bucket unreachable"))
    }

    fn signed_url(
        &self,
        _asset: &AssetRef,
        _ttl: chrono::Duration,
        _now: DateTime<Utc>,
    ) -> FrameResult<SignedUrl> {
        Err(FrameError::store("bucket unreachable"))
    }
}

#[test]
fn export_stores_transparent_png_at_output_size() {
    let store = storage();
    let asset = exporter(store.clone())
        .export_raster(&ShapeId::from("double-border"), &params(), out())
        .unwrap();
    assert!(asset.path.starts_with("frames/double-border/"));
    assert!(asset.path.ends_with(".png"));
    assert_eq!(asset.content_type, PNG_CONTENT_TYPE);

    let bytes = store.get(&asset).unwrap();
    assert_eq!(asset.byte_len, bytes.len() as u64);
    let frame = FrameRGBA::decode(&bytes).unwrap();
    assert_eq!((frame.width, frame.height), (100, 160));
    assert_eq!(frame.pixel(50, 80)[3], 0);
    assert_eq!(frame.pixel(50, 0)[3], 255);
}

#[test]
fn identical_exports_share_one_path() {
    let store = storage();
    let ex = exporter(store.clone());
    let shape = ShapeId::from("star-burst");
    let a = ex.export_raster(&shape, &params(), out()).unwrap();
    let b = ex.export_raster(&shape, &params(), out()).unwrap();
    assert_eq!(a, b);
    assert_eq!(store.len(), 1);

    let mut other = params();
    other.border_width = 9.0;
    let c = ex.export_raster(&shape, &other, out()).unwrap();
    assert_ne!(a.path, c.path);
    let d = ex
        .export_raster(&shape, &params(), Canvas::new(200, 320).unwrap())
        .unwrap();
    assert_ne!(a.path, d.path);
    assert_eq!(store.len(), 3);
}

#[test]
fn caption_changes_the_fingerprint() {
    let draft = TemplateDraft::catalog("o", "n", "rounded-thick", Rgba8::rgb(1, 2, 3), 14.0, 16.0);
    let with_text = draft.clone().with_text(CustomText {
        text: "Thank you!".to_owned(),
        position: TextPosition::Bottom,
        color: Rgba8::WHITE,
        font: "sans-serif".to_owned(),
    });
    let blank = draft.clone().with_text(CustomText {
        text: "   ".to_owned(),
        position: TextPosition::Top,
        color: Rgba8::WHITE,
        font: "sans-serif".to_owned(),
    });
    let ex = exporter(storage());
    let design = Canvas::new(200, 320).unwrap();
    let plain = ex.export_draft(&draft, design, out()).unwrap();
    let captioned = ex.export_draft(&with_text, design, out()).unwrap();
    let blanked = ex.export_draft(&blank, design, out()).unwrap();
    assert_ne!(plain.path, captioned.path);
    assert_eq!(plain.path, blanked.path);
}

#[test]
fn caption_style_and_font_never_share_a_path() {
    let font = std::fs::read("tests/data/fonts/DejaVuSans.ttf").unwrap();
    let draft = TemplateDraft::catalog("o", "n", "rounded-thick", Rgba8::rgb(6, 182, 212), 14.0, 16.0)
        .with_text(CustomText {
            text: "Thank you!".to_owned(),
            position: TextPosition::Bottom,
            color: Rgba8::WHITE,
            font: "DejaVu Sans".to_owned(),
        });
    let design = Canvas::new(200, 320).unwrap();
    let store = storage();
    let light = exporter(store.clone())
        .with_caption_font(font.clone())
        .with_style(RenderStyle::light());
    let dark = exporter(store.clone())
        .with_caption_font(font)
        .with_style(RenderStyle::dark());
    let fontless = exporter(store.clone()).with_style(RenderStyle::light());

    let a = light.export_draft(&draft, design, out()).unwrap();
    let a_bytes = store.get(&a).unwrap();
    let b = dark.export_draft(&draft, design, out()).unwrap();
    let c = fontless.export_draft(&draft, design, out()).unwrap();
    assert_ne!(a.path, b.path);
    assert_ne!(a.path, c.path);
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(&a).unwrap(), a_bytes);
    assert_eq!(a.byte_len, a_bytes.len() as u64);

    // Without a caption the style has nothing to draw.
    let plain = TemplateDraft::catalog("o", "n", "rounded-thick", Rgba8::rgb(6, 182, 212), 14.0, 16.0);
    assert_eq!(
        light.export_draft(&plain, design, out()).unwrap().path,
        dark.export_draft(&plain, design, out()).unwrap().path
    );
}

#[test]
fn unknown_shape_and_bad_params_are_validation_errors() {
    let ex = exporter(storage());
    let err = ex
        .export_raster(&ShapeId::from("nope"), &params(), out())
        .unwrap_err();
    assert!(err.is_validation());

    let mut p = params();
    p.border_width = 0.5;
    let err = ex
        .export_raster(&ShapeId::from("rounded-thin"), &p, out())
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn ai_drafts_are_not_exported() {
    let mut draft = TemplateDraft::catalog("o", "n", "rounded-thin", Rgba8::BLACK, 4.0, 0.0);
    draft.shape = crate::model::template::ShapeRef::AiGenerated;
    let err = exporter(storage())
        .export_draft(&draft, Canvas::new(200, 320).unwrap(), out())
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn storage_failures_surface_as_export_errors() {
    let err = exporter(Arc::new(BrokenStorage))
        .export_raster(&ShapeId::from("rounded-thin"), &params(), out())
        .unwrap_err();
    assert!(matches!(err, FrameError::Export(ref m) if m.contains("bucket unreachable")));
}

#[test]
fn batch_keeps_job_order_and_isolates_failures() {
    let store = storage();
    let ex = exporter(store.clone()).with_threads(Some(2));
    let job = |shape: &str| ExportJob {
        shape: ShapeId::from(shape),
        params: params(),
        text: None,
        output: out(),
    };
    let jobs = vec![job("wave-gentle"), job("missing"), job("neon-glow")];
    let results = ex.export_batch(&jobs).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().path.starts_with("frames/wave-gentle/"));
    assert!(results[1].as_ref().unwrap_err().is_validation());
    assert!(results[2].as_ref().unwrap().path.starts_with("frames/neon-glow/"));
    assert_eq!(store.len(), 2);
}

#[test]
fn zero_threads_is_rejected() {
    let ex = exporter(storage()).with_threads(Some(0));
    assert!(ex.export_batch(&[]).unwrap_err().is_validation());
}

fn ai_png(w: u32, h: u32, paint_center: bool) -> Vec<u8> {
    let mut frame = FrameRGBA::transparent(w, h);
    frame.premultiplied = false;
    for y in 0..h {
        for x in 0..w {
            let edge = x < 4 || y < 4 || x >= w - 4 || y >= h - 4;
            let center = paint_center && x == w / 2 && y == h / 2;
            if edge || center {
                let i = ((y * w + x) * 4) as usize;
                frame.data[i..i + 4].copy_from_slice(&[255, 200, 0, 255]);
            }
        }
    }
    frame.encode_png().unwrap()
}

#[test]
fn ai_raster_with_clear_interior_is_accepted() {
    let frame = validate_ai_raster(&ai_png(100, 160, false), out(), 0.2).unwrap();
    assert_eq!((frame.width, frame.height), (100, 160));
}

#[test]
fn ai_raster_is_rejected_when_malformed() {
    assert!(validate_ai_raster(b"not an image", out(), 0.2)
        .unwrap_err()
        .is_validation());
    assert!(validate_ai_raster(&ai_png(90, 160, false), out(), 0.2)
        .unwrap_err()
        .is_validation());
    assert!(validate_ai_raster(&ai_png(100, 160, true), out(), 0.2)
        .unwrap_err()
        .is_validation());
    assert!(validate_ai_raster(&ai_png(100, 160, false), out(), 0.5)
        .unwrap_err()
        .is_validation());
}
