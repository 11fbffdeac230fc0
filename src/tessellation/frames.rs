use nalgebra::Unit;

use crate::error::{Result, TessellationError};
use crate::geometry::Curve;
use crate::math::{UnitQuaternion, Vector3};

/// Rotation-minimizing frames sampled along a curve.
///
/// Entry `i` belongs to the fraction `i / segments` of the curve domain;
/// every list holds `segments + 1` entries.
#[derive(Debug, Clone, Default)]
pub struct Frames {
    /// Unit tangents of the curve.
    pub tangents: Vec<Vector3>,
    /// Unit normals, transported without twist.
    pub normals: Vec<Vector3>,
    /// `tangent x normal` at each sample.
    pub binormals: Vec<Vector3>,
}

/// Computes parallel-transport frames at `segments + 1` evenly spaced
/// parameters.
///
/// The first normal is perpendicular to the tangent and to the world axis the
/// tangent is least aligned with. Each following normal is the previous one
/// rotated by the turn between consecutive tangents. For `closed` curves the
/// residual twist between the first and last frame is spread evenly over all
/// frames so the ends line up.
///
/// # Errors
///
/// Returns [`TessellationError::InvalidParameters`] for zero segments, or any
/// error from evaluating tangents.
#[allow(clippy::cast_precision_loss)]
pub fn compute_frames<C: Curve + ?Sized>(
    curve: &C,
    segments: usize,
    closed: bool,
) -> Result<Frames> {
    if segments == 0 {
        return Err(TessellationError::InvalidParameters(
            "frames need at least one segment".to_owned(),
        )
        .into());
    }

    let domain = curve.domain();
    let tangents = (0..=segments)
        .map(|i| curve.tangent(domain.lerp(i as f64 / segments as f64)))
        .collect::<Result<Vec<_>>>()?;

    let t0 = tangents[0];
    let seed_axis = least_aligned_axis(&t0);
    let side = t0.cross(&seed_axis).normalize();

    let mut normals = Vec::with_capacity(segments + 1);
    normals.push(t0.cross(&side));

    for i in 1..=segments {
        let mut normal = normals[i - 1];
        let axis = tangents[i - 1].cross(&tangents[i]);
        if axis.norm() > f64::EPSILON {
            let theta = tangents[i - 1].dot(&tangents[i]).clamp(-1.0, 1.0).acos();
            normal = UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), theta) * normal;
        }
        normals.push(normal);
    }

    if closed {
        let cross = normals[0].cross(&normals[segments]);
        let mut theta =
            cross.norm().atan2(normals[0].dot(&normals[segments])) / segments as f64;
        if tangents[0].dot(&cross) > 0.0 {
            theta = -theta;
        }
        for (i, normal) in normals.iter_mut().enumerate().skip(1) {
            let twist = UnitQuaternion::from_axis_angle(
                &Unit::new_normalize(tangents[i]),
                theta * i as f64,
            );
            *normal = twist * *normal;
        }
    }

    let binormals = tangents
        .iter()
        .zip(&normals)
        .map(|(t, n)| t.cross(n))
        .collect();

    Ok(Frames {
        tangents,
        normals,
        binormals,
    })
}

fn least_aligned_axis(t: &Vector3) -> Vector3 {
    let (x, y, z) = (t.x.abs(), t.y.abs(), t.z.abs());
    if x <= y && x <= z {
        Vector3::x()
    } else if y <= z {
        Vector3::y()
    } else {
        Vector3::z()
    }
}
