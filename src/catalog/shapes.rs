use std::f64::consts::{FRAC_1_SQRT_2, PI, TAU};

use kurbo::Shape as _;

use crate::catalog::program::{
    DrawProgram, FillRule, Geometry, GradientStop, PATH_TOLERANCE, Paint, PaintStyle,
};
use crate::catalog::{ShapeDescriptor, ShapeParams};
use crate::foundation::core::{BezPath, Point, Rgba8, Vec2};

/// Extra depth added to every band so anti-aliased edges never reach the interior.
const AA_MARGIN: f64 = 1.0;
/// Wave paths are sampled at a fixed phase step.
pub(crate) const WAVE_SAMPLES_PER_CYCLE: usize = 24;

const RAINBOW: &[(f32, Rgba8)] = &[
    (0.0, Rgba8::rgb(0xef, 0x44, 0x44)),
    (0.2, Rgba8::rgb(0xf9, 0x73, 0x16)),
    (0.4, Rgba8::rgb(0xea, 0xb3, 0x08)),
    (0.6, Rgba8::rgb(0x22, 0xc5, 0x5e)),
    (0.8, Rgba8::rgb(0x3b, 0x82, 0xf6)),
    (1.0, Rgba8::rgb(0x8b, 0x5c, 0xf6)),
];

const SUNSET: &[(f32, Rgba8)] = &[
    (0.0, Rgba8::rgb(0xff, 0x51, 0x2f)),
    (0.5, Rgba8::rgb(0xf0, 0x98, 0x19)),
    (1.0, Rgba8::rgb(0xdd, 0x24, 0x76)),
];

/// Repeated ornament of the motif family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Glyph {
    /// Five-pointed star, one point facing out.
    Star,
    /// Upright heart.
    Heart,
    /// Cluster of overlapping lobes.
    Cloud,
    /// Triangle pointing into the canvas.
    Spike,
    /// Disk straddling the base line.
    Scallop,
}

impl Glyph {
    /// Depth of glyph centers for a glyph radius `g`.
    fn center_depth(self, g: f64) -> f64 {
        match self {
            Self::Scallop => 0.35 * g,
            _ => g,
        }
    }

    fn geometry(self, c: Point, inward: Vec2, g: f64) -> Geometry {
        match self {
            Self::Star => {
                let spin = (-inward.y).atan2(-inward.x);
                let mut p = BezPath::new();
                for k in 0..10 {
                    let r = if k % 2 == 0 { g } else { 0.45 * g };
                    let a = spin + f64::from(k) * PI / 5.0;
                    let pt = c + Vec2::new(a.cos(), a.sin()) * r;
                    if k == 0 {
                        p.move_to(pt);
                    } else {
                        p.line_to(pt);
                    }
                }
                p.close_path();
                Geometry::Path(p)
            }
            Self::Heart => {
                // Unit heart; every control point sits inside the unit disk after the 0.9 scale.
                let s = 0.9 * g;
                let at = |x: f64, y: f64| c + Vec2::new(x, y) * s;
                let mut p = BezPath::new();
                p.move_to(at(0.0, 0.8));
                p.curve_to(at(-0.5, 0.45), at(-0.85, 0.1), at(-0.8, -0.3));
                p.curve_to(at(-0.75, -0.7), at(-0.2, -0.75), at(0.0, -0.4));
                p.curve_to(at(0.2, -0.75), at(0.75, -0.7), at(0.8, -0.3));
                p.curve_to(at(0.85, 0.1), at(0.5, 0.45), at(0.0, 0.8));
                p.close_path();
                Geometry::Path(p)
            }
            Self::Cloud => {
                const LOBES: [(f64, f64, f64); 4] = [
                    (-0.45, 0.1, 0.42),
                    (0.45, 0.1, 0.42),
                    (0.0, -0.15, 0.55),
                    (0.0, 0.2, 0.45),
                ];
                let mut p = BezPath::new();
                for (dx, dy, r) in LOBES {
                    let lobe = kurbo::Circle::new(c + Vec2::new(dx, dy) * g, r * g);
                    p.extend(lobe.path_elements(PATH_TOLERANCE));
                }
                Geometry::Path(p)
            }
            Self::Spike => {
                let t = Vec2::new(-inward.y, inward.x);
                let mut p = BezPath::new();
                p.move_to(c + inward * g);
                p.line_to(c - inward * (0.6 * g) + t * (0.6 * g));
                p.line_to(c - inward * (0.6 * g) - t * (0.6 * g));
                p.close_path();
                Geometry::Path(p)
            }
            Self::Scallop => Geometry::Circle {
                center: c,
                radius: g,
            },
        }
    }
}

/// Shape family with its family-specific parameters.
///
/// Sizes are factors of the border width so a design scales with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeFamily {
    /// One rounded-rect stroke.
    Simple {
        /// Ignore the radius and draw square corners.
        square: bool,
    },
    /// Thin base stroke with glyphs at the corners and along every edge.
    Motif {
        /// Ornament.
        glyph: Glyph,
        /// Edge length is divided by this count to place edge glyphs.
        per_edge: u32,
        /// Glyph radius as a factor of the border width.
        size: f64,
    },
    /// Sine-perturbed edges.
    Wave {
        /// Amplitude as a factor of the border width.
        amplitude: f64,
        /// Target wavelength as a factor of the border width.
        wavelength: f64,
    },
    /// Three concentric strokes of growing width and falling opacity.
    Glow,
    /// Two independent concentric rings.
    Double,
    /// Gradient band with an even-odd cut-out.
    Gradient {
        /// Stops from the top-left to the bottom-right corner.
        stops: &'static [(f32, Rgba8)],
    },
}

impl ShapeFamily {
    /// Family name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple { .. } => "simple",
            Self::Motif { .. } => "motif",
            Self::Wave { .. } => "wave",
            Self::Glow => "glow",
            Self::Double => "compound",
            Self::Gradient { .. } => "gradient",
        }
    }

    pub(crate) fn band(&self, p: &ShapeParams) -> f64 {
        let bw = p.border_width;
        let depth = match self {
            Self::Simple { .. } | Self::Gradient { .. } => bw,
            Self::Motif { glyph, size, .. } => {
                let g = size * bw;
                glyph.center_depth(g) + g.max(0.5 * base_stroke_width(bw))
            }
            Self::Wave { amplitude, .. } => bw + 2.0 * amplitude * bw,
            Self::Glow => 2.6 * bw,
            Self::Double => 1.5 * bw,
        };
        depth + AA_MARGIN
    }

    pub(crate) fn generate(&self, p: &ShapeParams) -> DrawProgram {
        let mut out = DrawProgram::new(p.canvas);
        let bw = p.border_width;
        let color = p.primary_color;
        let corner = p.corner_radius();

        match self {
            Self::Simple { square } => {
                let corner = if *square { 0.0 } else { corner };
                out.push(ring(p, 0.5 * bw, corner), PaintStyle::stroke(color, bw));
            }
            Self::Motif {
                glyph,
                per_edge,
                size,
            } => {
                let g = size * bw;
                let cd = glyph.center_depth(g);
                out.push(
                    ring(p, cd, corner),
                    PaintStyle::stroke(color, base_stroke_width(bw)),
                );
                for (c, inward) in motif_positions(p, cd, corner, g, *per_edge) {
                    out.push(glyph.geometry(c, inward, g), PaintStyle::fill(color));
                }
            }
            Self::Wave {
                amplitude,
                wavelength,
            } => {
                let path = wave_path(p, amplitude * bw, (wavelength * bw).max(1.0));
                out.push(Geometry::Path(path), PaintStyle::stroke(color, bw));
            }
            Self::Glow => {
                for (factor, alpha) in [(2.6, 0.18), (1.8, 0.4), (1.0, 1.0)] {
                    out.push(
                        ring(p, 1.3 * bw, corner),
                        PaintStyle::stroke(color.fade(alpha), factor * bw),
                    );
                }
            }
            Self::Double => {
                out.push(ring(p, 0.25 * bw, corner), PaintStyle::stroke(color, 0.5 * bw));
                out.push(ring(p, 1.25 * bw, corner), PaintStyle::stroke(color, 0.5 * bw));
            }
            Self::Gradient { stops } => {
                let mut band = p.outline(0.0, corner).to_path(PATH_TOLERANCE);
                band.extend(p.outline(bw, corner).path_elements(PATH_TOLERANCE));
                let end = Point::new(f64::from(p.canvas.width), f64::from(p.canvas.height));
                out.push(
                    Geometry::Path(band),
                    PaintStyle::Fill {
                        paint: Paint::LinearGradient {
                            start: Point::ORIGIN,
                            end,
                            stops: stops
                                .iter()
                                .map(|&(offset, color)| GradientStop { offset, color })
                                .collect(),
                        },
                        rule: FillRule::EvenOdd,
                    },
                );
            }
        }
        out
    }
}

fn base_stroke_width(bw: f64) -> f64 {
    (0.3 * bw).max(1.0)
}

fn ring(p: &ShapeParams, depth: f64, corner: f64) -> Geometry {
    let o = p.outline(depth, corner);
    Geometry::rounded_rect(o.rect(), o.radii().top_left)
}

/// Glyph centers and inward unit normals: four corners, then each edge's interior positions.
fn motif_positions(
    p: &ShapeParams,
    cd: f64,
    corner: f64,
    g: f64,
    per_edge: u32,
) -> Vec<(Point, Vec2)> {
    let w = f64::from(p.canvas.width);
    let h = f64::from(p.canvas.height);
    let (x0, y0, x1, y1) = (cd, cd, w - cd, h - cd);
    let rc = (corner - cd).max(0.0);

    let mut out = Vec::new();
    for (cx, cy, dx, dy) in [
        (x0 + rc, y0 + rc, -1.0, -1.0),
        (x1 - rc, y0 + rc, 1.0, -1.0),
        (x1 - rc, y1 - rc, 1.0, 1.0),
        (x0 + rc, y1 - rc, -1.0, 1.0),
    ] {
        let outward = Vec2::new(dx, dy) * FRAC_1_SQRT_2;
        out.push((Point::new(cx, cy) + outward * rc, -outward));
    }

    let edges = [
        (Point::new(x0 + rc, y0), Point::new(x1 - rc, y0), Vec2::new(0.0, 1.0)),
        (Point::new(x1, y0 + rc), Point::new(x1, y1 - rc), Vec2::new(-1.0, 0.0)),
        (Point::new(x1 - rc, y1), Point::new(x0 + rc, y1), Vec2::new(0.0, -1.0)),
        (Point::new(x0, y1 - rc), Point::new(x0, y0 + rc), Vec2::new(1.0, 0.0)),
    ];
    for (a, b, inward) in edges {
        let len = (b - a).hypot();
        // Never pack glyphs tighter than their diameter.
        let fit = (len / (2.0 * g)).floor().max(1.0) as u32;
        let n = per_edge.min(fit).max(1);
        for i in 1..n {
            let t = f64::from(i) / f64::from(n);
            out.push((a.lerp(b, t), inward));
        }
    }
    out
}

/// Closed path whose edges oscillate between depth `bw/2` and `bw/2 + 2 * amp`.
fn wave_path(p: &ShapeParams, amp: f64, wavelength: f64) -> BezPath {
    let w = f64::from(p.canvas.width);
    let h = f64::from(p.canvas.height);
    let d = 0.5 * p.border_width + amp;
    let corners = [
        Point::new(d, d),
        Point::new(w - d, d),
        Point::new(w - d, h - d),
        Point::new(d, h - d),
    ];
    let inward = [
        Vec2::new(0.0, 1.0),
        Vec2::new(-1.0, 0.0),
        Vec2::new(0.0, -1.0),
        Vec2::new(1.0, 0.0),
    ];

    let mut path = BezPath::new();
    path.move_to(corners[0]);
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let cycles = ((b - a).hypot() / wavelength).round().max(1.0);
        let samples = cycles as usize * WAVE_SAMPLES_PER_CYCLE;
        for s in 1..=samples {
            let t = s as f64 / samples as f64;
            let offset = amp * (TAU * cycles * t).sin();
            path.line_to(a.lerp(b, t) + inward[i] * offset);
        }
    }
    path.close_path();
    path
}

pub(crate) fn builtin_descriptors() -> Vec<ShapeDescriptor> {
    let simple = ShapeFamily::Simple { square: false };
    let motif = |glyph, per_edge, size| ShapeFamily::Motif {
        glyph,
        per_edge,
        size,
    };
    let d = |id, label, family, default_width, default_radius| ShapeDescriptor {
        id,
        label,
        family,
        default_width,
        default_radius,
    };

    vec![
        d("rounded-thin", "Rounded Thin", simple.clone(), 6.0, 24.0),
        d("rounded-thick", "Rounded Thick", simple, 14.0, 16.0),
        d(
            "square-classic",
            "Square Classic",
            ShapeFamily::Simple { square: true },
            10.0,
            0.0,
        ),
        d("star-burst", "Star Burst", motif(Glyph::Star, 6, 1.1), 8.0, 12.0),
        d("heart-love", "Heart Love", motif(Glyph::Heart, 5, 1.0), 8.0, 20.0),
        d("cloud-puff", "Cloud Puff", motif(Glyph::Cloud, 6, 1.0), 8.0, 24.0),
        d("spike-edge", "Spike Edge", motif(Glyph::Spike, 10, 0.9), 6.0, 0.0),
        d("scallop-edge", "Scallop Edge", motif(Glyph::Scallop, 12, 0.8), 6.0, 8.0),
        d(
            "wave-gentle",
            "Gentle Wave",
            ShapeFamily::Wave {
                amplitude: 0.35,
                wavelength: 8.0,
            },
            8.0,
            0.0,
        ),
        d(
            "wave-bold",
            "Bold Wave",
            ShapeFamily::Wave {
                amplitude: 0.75,
                wavelength: 5.0,
            },
            10.0,
            0.0,
        ),
        d("neon-glow", "Neon Glow", ShapeFamily::Glow, 8.0, 24.0),
        d("double-border", "Double Border", ShapeFamily::Double, 12.0, 16.0),
        d(
            "rainbow-gradient",
            "Rainbow",
            ShapeFamily::Gradient { stops: RAINBOW },
            16.0,
            24.0,
        ),
        d(
            "sunset-gradient",
            "Sunset",
            ShapeFamily::Gradient { stops: SUNSET },
            16.0,
            24.0,
        ),
    ]
}
