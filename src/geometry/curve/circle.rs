use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// A full circle in 3D space; the tube's cross-section.
///
/// `P(t) = center + radius * (cos(t) * ref_dir + sin(t) * (axis x ref_dir))`
/// over the domain `[0, 2*pi)`.
#[derive(Debug, Clone)]
pub struct Circle {
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
}

impl Circle {
    /// Creates a new circle.
    ///
    /// # Arguments
    ///
    /// * `center` - Center of the circle
    /// * `radius` - Radius (must be positive)
    /// * `axis` - Normal of the circle plane
    /// * `ref_dir` - Direction of `t = 0` (must be perpendicular to `axis`)
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, a direction is
    /// zero-length, or `ref_dir` is not perpendicular to `axis`.
    pub fn new(center: Point3, radius: f64, axis: Vector3, ref_dir: Vector3) -> Result<Self> {
        if radius.is_nan() || radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("circle radius must be positive".into()).into(),
            );
        }

        let axis = axis
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;
        let ref_dir = ref_dir
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;

        // frames built by rotation drift slightly off perpendicular
        if axis.dot(&ref_dir).abs() > 1e-6 {
            return Err(GeometryError::Degenerate(
                "reference direction must be perpendicular to axis".into(),
            )
            .into());
        }

        Ok(Self {
            center,
            radius,
            axis,
            ref_dir,
        })
    }

    /// Builds the cross-section ring at a frame along a path.
    ///
    /// `t = 0` lies on the `-normal` side and the ring runs towards
    /// `binormal`, matching the winding of a tube extruded along `tangent`.
    ///
    /// # Errors
    ///
    /// Same as [`Circle::new`].
    pub fn cross_section(
        center: Point3,
        radius: f64,
        tangent: &Vector3,
        normal: &Vector3,
    ) -> Result<Self> {
        Self::new(center, radius, -tangent, -normal)
    }

    /// Returns the center of the circle.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius of the circle.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the unit normal of the circle plane.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Unit vector from the center towards `P(t)`.
    #[must_use]
    pub fn outward(&self, t: f64) -> Vector3 {
        self.ref_dir * t.cos() + self.binormal() * t.sin()
    }

    fn binormal(&self) -> Vector3 {
        self.axis.cross(&self.ref_dir)
    }
}

impl Curve for Circle {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        Ok(self.center + self.outward(t) * self.radius)
    }

    fn tangent(&self, t: f64) -> Result<Vector3> {
        let d = self.ref_dir * -t.sin() + self.binormal() * t.cos();
        d.try_normalize(TOLERANCE)
            .ok_or_else(|| GeometryError::ZeroVector.into())
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(0.0, std::f64::consts::TAU)
    }

    fn is_closed(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, TAU};

    fn xy_circle(radius: f64) -> Circle {
        Circle::new(Point3::origin(), radius, Vector3::z(), Vector3::x()).unwrap()
    }

    #[test]
    fn evaluate_quarter_turns() {
        let c = xy_circle(2.0);
        assert_relative_eq!(c.evaluate(0.0).unwrap(), Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(
            c.evaluate(FRAC_PI_2).unwrap(),
            Point3::new(0.0, 2.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn tangent_at_zero_is_plus_y() {
        let t = xy_circle(1.0).tangent(0.0).unwrap();
        assert_relative_eq!(t, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn domain_is_full_turn_and_closed() {
        let c = xy_circle(1.0);
        assert!(c.is_closed());
        assert_relative_eq!(c.domain().t_max, TAU);
    }

    #[test]
    fn cross_section_starts_opposite_normal() {
        let ring = Circle::cross_section(
            Point3::new(0.0, 0.0, 5.0),
            0.5,
            &Vector3::z(),
            &Vector3::x(),
        )
        .unwrap();
        assert_relative_eq!(ring.outward(0.0), -Vector3::x(), epsilon = 1e-12);
        // binormal = tangent x normal = z x x = y
        assert_relative_eq!(ring.outward(FRAC_PI_2), Vector3::y(), epsilon = 1e-12);
        let p = ring.evaluate(0.3).unwrap();
        assert_relative_eq!((p - ring.center()).norm(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn invalid_radius() {
        assert!(Circle::new(Point3::origin(), 0.0, Vector3::z(), Vector3::x()).is_err());
        assert!(Circle::new(Point3::origin(), f64::NAN, Vector3::z(), Vector3::x()).is_err());
    }

    #[test]
    fn non_perpendicular_ref_dir() {
        let r = Circle::new(
            Point3::origin(),
            1.0,
            Vector3::z(),
            Vector3::new(1.0, 0.0, 1.0),
        );
        assert!(r.is_err());
    }
}
