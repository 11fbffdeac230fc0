use tracing::debug;

use crate::error::{ConfigError, GeometryError, Result};
use crate::math::{wrap_unit, Point3, Vector3, TOLERANCE};

use super::arc_length::{ArcLengthTable, ArcLengthView};
use super::{Curve, CurveDomain};

/// Fewest control points that define a closed loop.
pub const MIN_CONTROL_POINTS: usize = 3;

/// Number of chords used to approximate arc length.
pub const ARC_LENGTH_DIVISIONS: usize = 200;

/// Knot spacings shorter than this fall back to a neighbouring spacing.
const MIN_KNOT_SPACING: f64 = 1e-4;

/// Parametrization of the Catmull-Rom segments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SplineKind {
    /// Knot spacing proportional to the square root of chord length.
    /// Avoids cusps and self-intersections inside a segment.
    #[default]
    Centripetal,
    /// Knot spacing proportional to chord length.
    Chordal,
    /// Uniform knots; tangents are `tension * (next - previous)`.
    Uniform { tension: f64 },
}

impl SplineKind {
    /// Classic Catmull-Rom: uniform knots with tension `0.5`.
    #[must_use]
    pub fn uniform() -> Self {
        Self::Uniform { tension: 0.5 }
    }
}

/// A closed Catmull-Rom spline through an ordered ring of control points.
///
/// The curve is parametrized over `[0, 1)` with one equal-width parameter
/// interval per control point, so `point_at(i / n)` is control point `i`.
/// Parameters outside the unit interval wrap around: the curve has period 1.
///
/// Parameter speed is not uniform in arc length; use
/// [`point_at_arc_length`](Self::point_at_arc_length) for constant-speed
/// sampling.
#[derive(Debug, Clone)]
pub struct ClosedSpline {
    points: Vec<Point3>,
    kind: SplineKind,
    arc_lengths: ArcLengthTable,
}

impl ClosedSpline {
    /// Creates a closed spline through `points` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewControlPoints`] if fewer than three points
    /// are given, or [`ConfigError::ParameterOutOfRange`] if a uniform spline's
    /// tension is not finite.
    pub fn new(points: Vec<Point3>, kind: SplineKind) -> Result<Self> {
        if points.len() < MIN_CONTROL_POINTS {
            return Err(ConfigError::TooFewControlPoints {
                count: points.len(),
                min: MIN_CONTROL_POINTS,
            }
            .into());
        }
        if let SplineKind::Uniform { tension } = kind {
            if !tension.is_finite() {
                return Err(ConfigError::ParameterOutOfRange {
                    parameter: "tension",
                    value: tension,
                    min: f64::MIN,
                    max: f64::MAX,
                }
                .into());
            }
        }

        let mut spline = Self {
            points,
            kind,
            arc_lengths: ArcLengthTable::default(),
        };
        spline.arc_lengths =
            ArcLengthTable::build(ARC_LENGTH_DIVISIONS, |p| spline.point_at(p));

        debug!(
            control_points = spline.points.len(),
            kind = ?spline.kind,
            length = spline.length(),
            "built closed spline"
        );
        Ok(spline)
    }

    /// Returns the control points in curve order.
    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.points
    }

    /// Returns the segment parametrization.
    #[must_use]
    pub fn kind(&self) -> SplineKind {
        self.kind
    }

    /// Returns the approximate total arc length of the loop.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.arc_lengths.total()
    }

    /// Evaluates the curve at parameter `p`, wrapped into `[0, 1)`.
    #[must_use]
    pub fn point_at(&self, p: f64) -> Point3 {
        let (index, weight) = self.locate(p);
        self.segment(index).position(weight)
    }

    /// Returns the derivative `dC/dp` at parameter `p`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn derivative_at(&self, p: f64) -> Vector3 {
        let (index, weight) = self.locate(p);
        // each segment spans 1/n of the parameter range
        self.segment(index).velocity(weight) * self.points.len() as f64
    }

    /// Returns the unit tangent at parameter `p`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] where the curve is stationary,
    /// which only happens with coincident control points.
    pub fn tangent_at(&self, p: f64) -> Result<Vector3> {
        let d = self.derivative_at(p);
        let len = d.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(d / len)
    }

    /// Evaluates the curve at the fraction `u` of its arc length.
    #[must_use]
    pub fn point_at_arc_length(&self, u: f64) -> Point3 {
        self.point_at(self.arc_lengths.u_to_t(wrap_unit(u)))
    }

    /// Returns the unit tangent at the fraction `u` of the arc length.
    ///
    /// # Errors
    ///
    /// Same as [`tangent_at`](Self::tangent_at).
    pub fn tangent_at_arc_length(&self, u: f64) -> Result<Vector3> {
        self.tangent_at(self.arc_lengths.u_to_t(wrap_unit(u)))
    }

    /// Maps an arc-length fraction to the curve parameter.
    #[must_use]
    pub fn arc_length_to_parameter(&self, u: f64) -> f64 {
        self.arc_lengths.u_to_t(wrap_unit(u))
    }

    /// Returns a view of this spline reparametrized by arc length.
    #[must_use]
    pub fn by_arc_length(&self) -> ArcLengthView<'_> {
        ArcLengthView::new(self)
    }

    /// Splits `p` into a segment index and the local weight within it.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn locate(&self, p: f64) -> (usize, f64) {
        let n = self.points.len();
        let scaled = wrap_unit(p) * n as f64;
        let whole = scaled.floor();
        (whole as usize % n, scaled - whole)
    }

    fn segment(&self, index: usize) -> Segment {
        let n = self.points.len();
        let p0 = self.points[(index + n - 1) % n].coords;
        let p1 = self.points[index].coords;
        let p2 = self.points[(index + 1) % n].coords;
        let p3 = self.points[(index + 2) % n].coords;

        match self.kind {
            SplineKind::Centripetal => Segment::nonuniform(p0, p1, p2, p3, 0.5),
            SplineKind::Chordal => Segment::nonuniform(p0, p1, p2, p3, 1.0),
            SplineKind::Uniform { tension } => {
                Segment::hermite(p1, p2, (p2 - p0) * tension, (p3 - p1) * tension)
            }
        }
    }
}

impl Curve for ClosedSpline {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        Ok(self.point_at(t))
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        self.tangent_at(t)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, 1.0)
    }

    fn is_closed(&self) -> bool {
        true
    }
}

/// Cubic `c0 + c1 w + c2 w^2 + c3 w^3` over one segment, `w` in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    c0: Vector3,
    c1: Vector3,
    c2: Vector3,
    c3: Vector3,
}

impl Segment {
    /// Hermite cubic from `x1` to `x2` with end tangents `t1`, `t2`.
    fn hermite(x1: Vector3, x2: Vector3, t1: Vector3, t2: Vector3) -> Self {
        Self {
            c0: x1,
            c1: t1,
            c2: x1 * -3.0 + x2 * 3.0 - t1 * 2.0 - t2,
            c3: x1 * 2.0 - x2 * 2.0 + t1 + t2,
        }
    }

    /// Non-uniform Catmull-Rom with knot spacing `|chord|^alpha`.
    fn nonuniform(x0: Vector3, x1: Vector3, x2: Vector3, x3: Vector3, alpha: f64) -> Self {
        let mut dt0 = (x1 - x0).norm().powf(alpha);
        let mut dt1 = (x2 - x1).norm().powf(alpha);
        let mut dt2 = (x3 - x2).norm().powf(alpha);

        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        let t1 = ((x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1) * dt1;
        let t2 = ((x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2) * dt1;
        Self::hermite(x1, x2, t1, t2)
    }

    fn position(&self, w: f64) -> Point3 {
        Point3::from(self.c0 + (self.c1 + (self.c2 + self.c3 * w) * w) * w)
    }

    fn velocity(&self, w: f64) -> Vector3 {
        self.c1 + (self.c2 * 2.0 + self.c3 * (3.0 * w)) * w
    }
}
