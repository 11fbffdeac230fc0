use crate::error::{GeometryError, Result};
use crate::math::{Matrix4, Point3, UnitQuaternion, Vector3, TOLERANCE};

/// Sine of the smallest angle between view direction and up that is used
/// as given.
const UP_TOLERANCE: f64 = 1e-6;

/// Camera placement for one frame.
///
/// `parameter` and `target_parameter` are the curve positions the two points
/// were sampled at; the target always sits `lookahead_fraction` further along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Eye position on the path.
    pub position: Point3,
    /// Look-at point ahead on the path.
    pub target: Point3,
    /// Curve parameter of `position`, in `[0, 1)`.
    pub parameter: f64,
    /// Curve parameter of `target`, in `[0, 1)`.
    pub target_parameter: f64,
}

impl CameraPose {
    /// Unit vector from `position` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] if the two points coincide.
    pub fn forward(&self) -> Result<Vector3> {
        (self.target - self.position)
            .try_normalize(TOLERANCE)
            .ok_or_else(|| GeometryError::ZeroVector.into())
    }

    /// Rotation that turns a camera looking down `-Z` towards the target,
    /// keeping `up` as close to vertical as possible.
    ///
    /// When the view direction is parallel to `up` (or `up` is zero), the
    /// world Z axis, failing that the X axis, serves as up instead.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] if the pose has no direction.
    pub fn orientation(&self, up: &Vector3) -> Result<UnitQuaternion> {
        let forward = self.forward()?;
        let up = usable_up(&forward, up);
        Ok(UnitQuaternion::face_towards(&-forward, &up))
    }

    /// Right-handed world-to-camera matrix.
    ///
    /// # Errors
    ///
    /// Same as [`orientation`](Self::orientation).
    pub fn view_matrix(&self, up: &Vector3) -> Result<Matrix4> {
        let forward = self.forward()?;
        let up = usable_up(&forward, up);
        Ok(nalgebra::Isometry3::look_at_rh(&self.position, &self.target, &up).to_homogeneous())
    }

    /// Largest displacement of either point between two poses.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.position - other.position)
            .norm()
            .max((self.target - other.target).norm())
    }
}

fn usable_up(forward: &Vector3, up: &Vector3) -> Vector3 {
    // x and z cannot both be parallel to a unit forward
    [*up, Vector3::z(), Vector3::x()]
        .into_iter()
        .find(|candidate| forward.cross(candidate).norm() > UP_TOLERANCE * candidate.norm())
        .unwrap_or_else(Vector3::x)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pose(position: Point3, target: Point3) -> CameraPose {
        CameraPose {
            position,
            target,
            parameter: 0.0,
            target_parameter: 0.03,
        }
    }

    #[test]
    fn forward_is_unit_direction() {
        let p = pose(Point3::origin(), Point3::new(0.0, 0.0, -4.0));
        assert_relative_eq!(p.forward().unwrap(), -Vector3::z());
    }

    #[test]
    fn coincident_points_have_no_forward() {
        let p = pose(Point3::origin(), Point3::origin());
        assert!(p.forward().is_err());
        assert!(p.view_matrix(&Vector3::y()).is_err());
    }

    #[test]
    fn orientation_maps_minus_z_to_forward() {
        let p = pose(Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 2.0, 3.0));
        let q = p.orientation(&Vector3::y()).unwrap();
        assert_relative_eq!(q * -Vector3::z(), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn view_matrix_moves_target_onto_minus_z() {
        let p = pose(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, -2.0));
        let view = p.view_matrix(&Vector3::y()).unwrap();
        let t = view.transform_point(&p.target);
        assert_relative_eq!(t, Point3::new(0.0, 0.0, -3.0), epsilon = 1e-12);
        let eye = view.transform_point(&p.position);
        assert_relative_eq!(eye, Point3::origin(), epsilon = 1e-12);
    }

    #[test]
    fn vertical_view_falls_back_to_another_up() {
        let p = pose(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 5.0, 0.0));
        let q = p.orientation(&Vector3::y()).unwrap();
        assert_relative_eq!(q * -Vector3::z(), Vector3::y(), epsilon = 1e-12);

        let view = p.view_matrix(&Vector3::y()).unwrap();
        let t = view.transform_point(&p.target);
        assert_relative_eq!(t, Point3::new(0.0, 0.0, -5.0), epsilon = 1e-12);
        assert!(view.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn looking_down_z_with_z_up_uses_x() {
        let p = pose(Point3::origin(), Point3::new(0.0, 0.0, -2.0));
        let view = p.view_matrix(&Vector3::z()).unwrap();
        let t = view.transform_point(&p.target);
        assert_relative_eq!(t, Point3::new(0.0, 0.0, -2.0), epsilon = 1e-12);
    }

    #[test]
    fn zero_up_still_orients() {
        let p = pose(Point3::origin(), Point3::new(3.0, 0.0, 0.0));
        let q = p.orientation(&Vector3::zeros()).unwrap();
        assert_relative_eq!(q * -Vector3::z(), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn distance_takes_larger_displacement() {
        let a = pose(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        let b = pose(Point3::new(0.5, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(a.distance_to(&b), 2.0);
    }
}
