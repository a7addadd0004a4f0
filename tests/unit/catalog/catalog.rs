use super::*;
use crate::foundation::core::Point;

fn params(w: u32, h: u32, bw: f64, r: f64) -> ShapeParams {
    ShapeParams {
        canvas: Canvas::new(w, h).unwrap(),
        primary_color: Rgba8::rgb(6, 182, 212),
        border_width: bw,
        border_radius: r,
    }
}

#[test]
fn builtin_catalog_lists_every_shape_once() {
    let catalog = ShapeCatalog::builtin();
    let ids: Vec<&str> = catalog.iter().map(|d| d.id).collect();
    assert_eq!(
        ids,
        vec![
            "rounded-thin",
            "rounded-thick",
            "square-classic",
            "star-burst",
            "heart-love",
            "cloud-puff",
            "spike-edge",
            "scallop-edge",
            "wave-gentle",
            "wave-bold",
            "neon-glow",
            "double-border",
            "rainbow-gradient",
            "sunset-gradient",
        ]
    );
    assert_eq!(catalog.len(), 14);
}

#[test]
fn unknown_shape_is_a_validation_error() {
    let catalog = ShapeCatalog::builtin();
    let err = catalog
        .generate(&ShapeId::from("triangle-party"), &params(200, 200, 8.0, 0.0))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(!catalog.contains(&ShapeId::from("ai-generated")));
}

#[test]
fn register_rejects_duplicates() {
    let mut catalog = ShapeCatalog::empty();
    let desc = ShapeCatalog::builtin()
        .get(&ShapeId::from("neon-glow"))
        .unwrap()
        .clone();
    catalog.register(desc.clone()).unwrap();
    assert!(catalog.register(desc).is_err());
    assert_eq!(catalog.len(), 1);
}

#[test]
fn params_validate_legal_ranges() {
    assert!(params(160, 320, 1.0, 0.0).validate().is_ok());
    assert!(params(160, 320, 20.0, 80.0).validate().is_ok());
    assert!(params(160, 320, 0.5, 0.0).validate().is_err());
    assert!(params(160, 320, 20.5, 0.0).validate().is_err());
    assert!(params(160, 320, 4.0, 80.5).validate().is_err());
    assert!(params(160, 320, 4.0, -1.0).validate().is_err());
    assert!(params(160, 320, f64::NAN, 0.0).validate().is_err());

    let mut tiny = params(160, 320, 4.0, 0.0);
    tiny.canvas.width = 8;
    assert!(tiny.validate().is_err());
}

#[test]
fn scaled_to_is_uniform_and_stays_legal() {
    let p = params(540, 960, 14.0, 16.0);
    let s = p.scaled_to(Canvas::new(1080, 1920).unwrap()).unwrap();
    assert_eq!(s.border_width, 28.0);
    assert_eq!(s.border_radius, 32.0);
    assert_eq!(s.canvas.width, 1080);

    let down = params(540, 960, 1.0, 0.0)
        .scaled_to(Canvas::new(54, 96).unwrap())
        .unwrap();
    assert_eq!(down.border_width, 1.0);
    assert!(down.validate().is_ok());
}

#[test]
fn every_shape_generates_for_its_defaults() {
    let catalog = ShapeCatalog::builtin();
    for d in catalog.iter() {
        let p = params(400, 600, d.default_width, d.default_radius);
        let program = d.generate(&p).unwrap();
        assert!(!program.is_empty(), "{} drew nothing", d.id);
        assert_eq!(program.canvas, p.canvas);

        let band = d.band(&p);
        assert!(band > p.border_width, "{} band {band}", d.id);
        assert!(band < p.canvas.min_side() / 2.0, "{} band {band}", d.id);
    }
}

#[test]
fn generate_rejects_illegal_params() {
    let d = ShapeCatalog::builtin();
    let d = d.get(&ShapeId::from("rounded-thick")).unwrap();
    assert!(d.generate(&params(100, 100, 40.0, 0.0)).unwrap_err().is_validation());
}

#[test]
fn glow_draws_three_fading_strokes() {
    let catalog = ShapeCatalog::builtin();
    let program = catalog
        .generate(&ShapeId::from("neon-glow"), &params(300, 300, 8.0, 24.0))
        .unwrap();
    let strokes: Vec<(f64, u8)> = program
        .ops
        .iter()
        .map(|op| match &op.style {
            PaintStyle::Stroke {
                paint: Paint::Solid(c),
                width,
            } => (*width, c.a),
            other => panic!("unexpected style {other:?}"),
        })
        .collect();
    assert_eq!(strokes.len(), 3);
    assert!(strokes[0].0 > strokes[1].0 && strokes[1].0 > strokes[2].0);
    assert!(strokes[0].1 < strokes[1].1 && strokes[1].1 < strokes[2].1);
}

#[test]
fn gradient_band_is_an_even_odd_fill() {
    let catalog = ShapeCatalog::builtin();
    let program = catalog
        .generate(&ShapeId::from("rainbow-gradient"), &params(300, 300, 16.0, 24.0))
        .unwrap();
    assert_eq!(program.len(), 1);
    match &program.ops[0].style {
        PaintStyle::Fill {
            paint: Paint::LinearGradient { stops, .. },
            rule,
        } => {
            assert_eq!(*rule, FillRule::EvenOdd);
            assert!(stops.len() >= 3);
        }
        other => panic!("unexpected style {other:?}"),
    }
}

#[test]
fn motif_places_corner_and_edge_glyphs() {
    let catalog = ShapeCatalog::builtin();
    let p = params(400, 400, 8.0, 0.0);
    let program = catalog.generate(&ShapeId::from("heart-love"), &p).unwrap();
    // Base stroke, four corners, then (per_edge - 1) glyphs on each of four edges.
    assert_eq!(program.len(), 1 + 4 + 4 * 4);
    assert!(matches!(program.ops[0].style, PaintStyle::Stroke { .. }));
    assert!(
        program.ops[1..]
            .iter()
            .all(|op| matches!(op.style, PaintStyle::Fill { .. }))
    );
}

#[test]
fn square_classic_ignores_radius() {
    let catalog = ShapeCatalog::builtin();
    let program = catalog
        .generate(&ShapeId::from("square-classic"), &params(200, 200, 10.0, 50.0))
        .unwrap();
    match &program.ops[0].geometry {
        Geometry::RoundedRect { radius, .. } => assert_eq!(*radius, 0.0),
        other => panic!("unexpected geometry {other:?}"),
    }
}

#[test]
fn interior_shrinks_corner_radius_with_band() {
    let p = params(200, 200, 10.0, 40.0);
    let inner = p.interior(11.0);
    assert_eq!(inner.rect(), Rect::new(11.0, 11.0, 189.0, 189.0));
    assert_eq!(inner.radii().top_left, 29.0);
    assert_eq!(p.interior(60.0).radii().top_left, 0.0);
}

fn path_points(program: &DrawProgram) -> (Point, Vec<Point>) {
    assert_eq!(program.ops.len(), 1);
    let Geometry::Path(path) = &program.ops[0].geometry else {
        panic!("wave shapes draw a single path");
    };
    let mut start = None;
    let mut points = Vec::new();
    for el in path.elements() {
        match *el {
            kurbo::PathEl::MoveTo(p) => start = Some(p),
            kurbo::PathEl::LineTo(p) => points.push(p),
            kurbo::PathEl::ClosePath => {}
            other => panic!("unexpected path element {other:?}"),
        }
    }
    (start.unwrap(), points)
}

#[test]
fn wave_edges_are_sampled_sine_perturbations() {
    let catalog = ShapeCatalog::builtin();
    for (id, amplitude, wavelength) in [("wave-gentle", 0.35, 8.0), ("wave-bold", 0.75, 5.0)] {
        let bw = 8.0;
        let p = params(360, 640, bw, 0.0);
        let program = catalog.generate(&ShapeId::from(id), &p).unwrap();
        let (start, points) = path_points(&program);

        let amp = amplitude * bw;
        let d = 0.5 * bw + amp;
        let (w, h) = (360.0, 640.0);
        assert_eq!(start, Point::new(d, d));

        let edge_cycles = |len: f64| (len / (wavelength * bw)).round().max(1.0) as usize;
        let expected = 2 * (edge_cycles(w - 2.0 * d) + edge_cycles(h - 2.0 * d))
            * shapes::WAVE_SAMPLES_PER_CYCLE;
        assert_eq!(points.len(), expected, "{id}: sample count");

        let deviation = |q: &Point| {
            [q.x - d, w - d - q.x, q.y - d, h - d - q.y]
                .into_iter()
                .map(f64::abs)
                .fold(f64::INFINITY, f64::min)
        };
        let max = points.iter().map(deviation).fold(0.0, f64::max);
        assert!(max <= amp + 1e-9, "{id}: deviation {max} exceeds amplitude {amp}");
        assert!(max >= 0.99 * amp, "{id}: edges never reach the amplitude ({max})");
    }
}

#[test]
fn double_border_is_two_separate_concentric_rings() {
    let bw = 12.0;
    let p = params(200, 320, bw, 16.0);
    let program = ShapeCatalog::builtin()
        .generate(&ShapeId::from("double-border"), &p)
        .unwrap();
    assert_eq!(program.ops.len(), 2);

    let mut insets = Vec::new();
    for op in &program.ops {
        let Geometry::RoundedRect { rect, .. } = &op.geometry else {
            panic!("double border rings are rounded rects");
        };
        assert!(matches!(op.style, PaintStyle::Stroke { width, .. } if width == 0.5 * bw));
        insets.push(rect.x0);
        assert_eq!(rect.x0, rect.y0);
        assert_eq!(200.0 - rect.x1, rect.x0);
        assert_eq!(320.0 - rect.y1, rect.y0);
    }
    assert_eq!(insets, vec![0.25 * bw, 1.25 * bw]);

    let frame = crate::render::RasterRenderer::new()
        .render(&program, None)
        .unwrap();
    // Outer ring paints depth 0..6, inner ring 12..18; the gap between stays clear.
    assert_eq!(frame.pixel(100, 2)[3], 255);
    assert_eq!(frame.pixel(2, 160)[3], 255);
    for depth in 7..11 {
        assert_eq!(frame.pixel(100, depth)[3], 0, "gap row {depth}");
        assert_eq!(frame.pixel(depth, 160)[3], 0, "gap column {depth}");
    }
    assert_eq!(frame.pixel(100, 14)[3], 255);
    assert_eq!(frame.pixel(100, 160)[3], 0);
}
