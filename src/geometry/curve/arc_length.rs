use crate::error::Result;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{ClosedSpline, Curve, CurveDomain};

/// Cumulative chord lengths of a curve sampled at equal parameter steps.
#[derive(Debug, Clone, Default)]
pub struct ArcLengthTable {
    cumulative: Vec<f64>,
}

impl ArcLengthTable {
    /// Samples `f` at `divisions + 1` evenly spaced parameters in `[0, 1]`.
    #[must_use]
    pub fn build(divisions: usize, f: impl Fn(f64) -> Point3) -> Self {
        let divisions = divisions.max(1);
        let mut cumulative = Vec::with_capacity(divisions + 1);
        cumulative.push(0.0);

        let mut last = f(0.0);
        let mut sum = 0.0;
        for i in 1..=divisions {
            #[allow(clippy::cast_precision_loss)]
            let current = f(i as f64 / divisions as f64);
            sum += (current - last).norm();
            cumulative.push(sum);
            last = current;
        }
        Self { cumulative }
    }

    /// Returns the total length.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Maps an arc-length fraction `u` in `[0, 1]` to a curve parameter.
    ///
    /// Linear interpolation within the chord that contains the target length.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn u_to_t(&self, u: f64) -> f64 {
        let total = self.total();
        let divisions = self.cumulative.len().saturating_sub(1);
        if divisions == 0 || total < TOLERANCE {
            return u;
        }

        let target = u.clamp(0.0, 1.0) * total;
        let i = self
            .cumulative
            .partition_point(|&len| len <= target)
            .saturating_sub(1)
            .min(divisions - 1);

        let before = self.cumulative[i];
        let chord = self.cumulative[i + 1] - before;
        let frac = if chord > TOLERANCE {
            (target - before) / chord
        } else {
            0.0
        };
        (i as f64 + frac) / divisions as f64
    }
}

/// A [`ClosedSpline`] viewed through its arc-length parametrization.
///
/// Evaluating at `u` gives the point a fraction `u` of the way around the
/// loop by length, so equal steps in `u` are equal distances along the curve.
#[derive(Debug, Clone, Copy)]
pub struct ArcLengthView<'a> {
    spline: &'a ClosedSpline,
}

impl<'a> ArcLengthView<'a> {
    /// Wraps a spline.
    #[must_use]
    pub fn new(spline: &'a ClosedSpline) -> Self {
        Self { spline }
    }

    /// Returns the underlying spline.
    #[must_use]
    pub fn spline(&self) -> &'a ClosedSpline {
        self.spline
    }
}

impl Curve for ArcLengthView<'_> {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        Ok(self.spline.point_at_arc_length(t))
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        self.spline.tangent_at_arc_length(t)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, 1.0)
    }

    fn is_closed(&self) -> bool {
        true
    }
}
