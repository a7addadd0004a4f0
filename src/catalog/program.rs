use kurbo::Shape as _;

use crate::foundation::core::{BezPath, Canvas, Point, Rect, Rgba8};

/// Flattening tolerance used when primitives are converted to paths.
pub const PATH_TOLERANCE: f64 = 0.1;

/// Fill rule for filled paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Non-zero winding.
    #[default]
    NonZero,
    /// Even-odd parity; used for cut-out bands.
    EvenOdd,
}

impl FillRule {
    /// SVG `fill-rule` attribute value.
    pub fn svg_name(self) -> &'static str {
        match self {
            Self::NonZero => "nonzero",
            Self::EvenOdd => "evenodd",
        }
    }
}

/// Color stop of a linear gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position in `[0, 1]`.
    pub offset: f32,
    /// Straight-alpha color.
    pub color: Rgba8,
}

/// What a primitive is painted with.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// Single color.
    Solid(Rgba8),
    /// Multi-stop linear gradient in canvas space.
    LinearGradient {
        /// Gradient start point.
        start: Point,
        /// Gradient end point.
        end: Point,
        /// Ordered stops.
        stops: Vec<GradientStop>,
    },
}

/// Fill or stroke.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintStyle {
    /// Fill the interior.
    Fill {
        /// Paint.
        paint: Paint,
        /// Fill rule.
        rule: FillRule,
    },
    /// Stroke the outline with round joins and caps.
    Stroke {
        /// Paint.
        paint: Paint,
        /// Stroke width.
        width: f64,
    },
}

impl PaintStyle {
    /// Solid non-zero fill.
    pub fn fill(color: Rgba8) -> Self {
        Self::Fill {
            paint: Paint::Solid(color),
            rule: FillRule::NonZero,
        }
    }

    /// Solid stroke.
    pub fn stroke(color: Rgba8, width: f64) -> Self {
        Self::Stroke {
            paint: Paint::Solid(color),
            width,
        }
    }
}

/// Geometry of a draw operation, in canvas coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Axis-aligned rectangle with uniform corner radius.
    RoundedRect {
        /// Outer rectangle.
        rect: Rect,
        /// Corner radius, already clamped to half the shorter side.
        radius: f64,
    },
    /// Circle.
    Circle {
        /// Center.
        center: Point,
        /// Radius.
        radius: f64,
    },
    /// Arbitrary path.
    Path(BezPath),
}

impl Geometry {
    /// Rounded rectangle, clamping the radius to what the rectangle can hold.
    pub fn rounded_rect(rect: Rect, radius: f64) -> Self {
        let max_r = 0.5 * rect.width().min(rect.height());
        Self::RoundedRect {
            rect,
            radius: radius.clamp(0.0, max_r.max(0.0)),
        }
    }

    /// Path form used by rasterizers.
    pub fn to_bezpath(&self) -> BezPath {
        match self {
            Self::RoundedRect { rect, radius } => {
                kurbo::RoundedRect::from_rect(*rect, *radius).to_path(PATH_TOLERANCE)
            }
            Self::Circle { center, radius } => {
                kurbo::Circle::new(*center, *radius).to_path(PATH_TOLERANCE)
            }
            Self::Path(p) => p.clone(),
        }
    }
}

/// One primitive with its paint.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawOp {
    /// Shape.
    pub geometry: Geometry,
    /// How it is painted.
    pub style: PaintStyle,
}

/// Ordered primitives a shape generator emits for a canvas.
///
/// Both the live vector overlay and the raster exporter consume the same program, which is what
/// keeps them visually in step.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawProgram {
    /// Canvas the coordinates refer to.
    pub canvas: Canvas,
    /// Painter's-order operations.
    pub ops: Vec<DrawOp>,
}

impl DrawProgram {
    /// Empty program.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ops: Vec::new(),
        }
    }

    /// Append an operation.
    pub fn push(&mut self, geometry: Geometry, style: PaintStyle) {
        self.ops.push(DrawOp { geometry, style });
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
