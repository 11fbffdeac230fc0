use std::f64::consts::TAU;

use tracing::debug;

use crate::error::{Result, TessellationError};
use crate::geometry::{Circle, Curve};
use crate::math::Point2;

use super::frames::compute_frames;
use super::TriangleMesh;

/// Shape of the extruded tube.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TubeParams {
    /// Rings along the path.
    pub tubular_segments: usize,
    /// Radius of the circular cross-section.
    pub radius: f64,
    /// Vertices around each ring.
    pub radial_segments: usize,
    /// Whether the last ring reuses the first ring's frame.
    pub closed: bool,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            tubular_segments: 222,
            radius: 0.65,
            radial_segments: 16,
            closed: true,
        }
    }
}

impl TubeParams {
    /// Checks segment counts and radius.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::InvalidParameters`] for zero tubular
    /// segments, fewer than three radial segments, or a non-positive radius.
    pub fn validate(&self) -> Result<()> {
        if self.tubular_segments == 0 {
            return Err(invalid("tubular_segments must be at least 1"));
        }
        if self.radial_segments < 3 {
            return Err(invalid("radial_segments must be at least 3"));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(invalid("tube radius must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> crate::error::TubeflightError {
    TessellationError::InvalidParameters(msg.to_owned()).into()
}

/// Extrudes a circular cross-section along a curve.
///
/// Produces `tubular_segments + 1` rings of `radial_segments + 1` vertices.
/// The duplicated seam vertices carry distinct UVs (`u` runs along the path,
/// `v` around the ring).
#[derive(Debug, Clone, Copy)]
pub struct TessellateTube {
    params: TubeParams,
}

impl TessellateTube {
    /// Creates a new tube tessellation operation.
    #[must_use]
    pub fn new(params: TubeParams) -> Self {
        Self { params }
    }

    /// Executes the extrusion along `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::InvalidParameters`] for invalid params and
    /// geometry errors when the path has a degenerate tangent.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn execute<C: Curve + ?Sized>(&self, path: &C) -> Result<TriangleMesh> {
        self.params.validate()?;
        let TubeParams {
            tubular_segments: segments,
            radius,
            radial_segments: radial,
            closed,
        } = self.params;

        let frames = compute_frames(path, segments, closed)?;
        let domain = path.domain();

        let ring_len = radial + 1;
        let vertex_count = (segments + 1) * ring_len;
        let mut mesh = TriangleMesh {
            vertices: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            uvs: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(segments * radial * 2),
        };

        for i in 0..=segments {
            // a closed tube ends on exactly the ring it started with
            let k = if closed && i == segments { 0 } else { i };
            let center = path.evaluate(domain.lerp(k as f64 / segments as f64))?;
            let ring =
                Circle::cross_section(center, radius, &frames.tangents[k], &frames.normals[k])?;

            let u = i as f64 / segments as f64;
            for j in 0..=radial {
                let v = j as f64 / radial as f64;
                let angle = v * TAU;
                mesh.vertices.push(ring.evaluate(angle)?);
                mesh.normals.push(ring.outward(angle));
                mesh.uvs.push(Point2::new(u, v));
            }
        }

        for i in 1..=segments {
            for j in 1..=radial {
                let a = (ring_len * (i - 1) + (j - 1)) as u32;
                let b = (ring_len * i + (j - 1)) as u32;
                let c = (ring_len * i + j) as u32;
                let d = (ring_len * (i - 1) + j) as u32;
                mesh.indices.push([a, b, d]);
                mesh.indices.push([b, c, d]);
            }
        }

        debug!(
            vertices = mesh.vertices.len(),
            triangles = mesh.indices.len(),
            "tessellated tube"
        );
        Ok(mesh)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{ClosedSpline, SplineKind};
    use crate::math::{Point3, Vector3};
    use approx::assert_relative_eq;

    fn loop_path() -> ClosedSpline {
        ClosedSpline::new(
            vec![
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(0.0, 4.0, 1.0),
                Point3::new(-4.0, 0.0, 0.0),
                Point3::new(0.0, -4.0, -1.0),
            ],
            SplineKind::Centripetal,
        )
        .unwrap()
    }

    fn small() -> TubeParams {
        TubeParams {
            tubular_segments: 40,
            radius: 0.5,
            radial_segments: 8,
            closed: true,
        }
    }

    #[test]
    fn default_params_match_demo() {
        let p = TubeParams::default();
        assert_eq!(p.tubular_segments, 222);
        assert_eq!(p.radial_segments, 16);
        assert_relative_eq!(p.radius, 0.65);
        assert!(p.closed);
    }

    #[test]
    fn rejects_bad_params() {
        let path = loop_path();
        for params in [
            TubeParams { tubular_segments: 0, ..small() },
            TubeParams { radial_segments: 2, ..small() },
            TubeParams { radius: 0.0, ..small() },
            TubeParams { radius: f64::NAN, ..small() },
        ] {
            assert!(TessellateTube::new(params).execute(&path).is_err());
        }
    }

    #[test]
    fn vertex_and_triangle_counts() {
        let mesh = TessellateTube::new(small()).execute(&loop_path()).unwrap();
        assert_eq!(mesh.vertices.len(), 41 * 9);
        assert_eq!(mesh.normals.len(), 41 * 9);
        assert_eq!(mesh.uvs.len(), 41 * 9);
        assert_eq!(mesh.indices.len(), 40 * 8 * 2);
        let max = mesh.indices.iter().flatten().copied().max().unwrap();
        assert_eq!(max as usize, mesh.vertices.len() - 1);
    }

    #[test]
    fn vertices_sit_on_the_tube_wall() {
        let path = loop_path();
        let mesh = TessellateTube::new(small()).execute(&path).unwrap();
        for (i, ring) in mesh.vertices.chunks(9).enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let center = path.point_at(i as f64 / 40.0);
            for v in ring {
                assert_relative_eq!((v - center).norm(), 0.5, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn normals_are_unit_and_across_the_path() {
        let path = loop_path();
        let mesh = TessellateTube::new(small()).execute(&path).unwrap();
        for (i, ring) in mesh.normals.chunks(9).enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let tangent = path.tangent_at(i as f64 / 40.0).unwrap();
            for n in ring {
                assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-9);
                assert!(n.dot(&tangent).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn closed_tube_seam_matches() {
        let mesh = TessellateTube::new(small()).execute(&loop_path()).unwrap();
        let first = &mesh.vertices[..9];
        let last = &mesh.vertices[mesh.vertices.len() - 9..];
        assert_eq!(first, last);
        // the ring's own seam
        assert_relative_eq!(mesh.vertices[0], mesh.vertices[8], epsilon = 1e-12);
    }

    #[test]
    fn uvs_span_unit_square() {
        let mesh = TessellateTube::new(small()).execute(&loop_path()).unwrap();
        let last = mesh.uvs.last().unwrap();
        assert_relative_eq!(last.x, 1.0);
        assert_relative_eq!(last.y, 1.0);
        assert_eq!(mesh.uvs[0], Point2::origin());
    }

    #[test]
    fn torus_from_circle_path() {
        let c = Circle::new(Point3::origin(), 3.0, Vector3::z(), Vector3::x()).unwrap();
        let mesh = TessellateTube::new(small()).execute(&c).unwrap();
        for v in &mesh.vertices {
            let ring_dist = (v.x.hypot(v.y) - 3.0).hypot(v.z);
            assert_relative_eq!(ring_dist, 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn wireframe_edges_cover_grid() {
        let mesh = TessellateTube::new(small()).execute(&loop_path()).unwrap();
        // per quad: two sides shared, one diagonal
        let rings = 40;
        let radial = 8;
        let expected = rings * radial * 3 + rings + radial;
        assert_eq!(mesh.unique_edges().len(), expected);
    }
}
