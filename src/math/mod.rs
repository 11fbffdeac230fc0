pub mod color;

pub use color::{hsl_to_rgb, Rgb};

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Unit quaternion used for orientations.
pub type UnitQuaternion = nalgebra::UnitQuaternion<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Wraps `p` into the half-open unit interval `[0, 1)`.
///
/// Non-finite input maps to `0.0`.
#[must_use]
pub fn wrap_unit(p: f64) -> f64 {
    if !p.is_finite() {
        return 0.0;
    }
    let w = p.rem_euclid(1.0);
    // rem_euclid rounds tiny negative values up to exactly 1.0
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unit_identity_inside_interval() {
        assert!((wrap_unit(0.25) - 0.25).abs() < f64::EPSILON);
        assert!(wrap_unit(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wrap_unit_wraps_above_and_below() {
        assert!((wrap_unit(1.25) - 0.25).abs() < 1e-12);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-12);
        assert!(wrap_unit(1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wrap_unit_never_returns_one() {
        let w = wrap_unit(-1e-20);
        assert!((0.0..1.0).contains(&w));
    }

    #[test]
    fn wrap_unit_non_finite_is_zero() {
        assert!(wrap_unit(f64::NAN).abs() < f64::EPSILON);
        assert!(wrap_unit(f64::INFINITY).abs() < f64::EPSILON);
    }
}
