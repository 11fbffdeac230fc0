mod frames;
mod tessellate_curve;
mod tessellate_tube;

pub use frames::{compute_frames, Frames};
pub use tessellate_curve::TessellateCurve;
pub use tessellate_tube::{TessellateTube, TubeParams};

use std::collections::BTreeSet;

use crate::math::{Point2, Point3, Vector3};

/// A polyline approximation of a curve.
#[derive(Debug, Clone, Default)]
pub struct Polyline {
    /// The ordered vertices of the polyline.
    pub points: Vec<Point3>,
}

impl Polyline {
    /// Returns whether the last vertex repeats the first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() > 2 && first == last,
            _ => false,
        }
    }

    /// Sum of segment lengths.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

/// A triangle mesh approximation of a surface.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// UV coordinates.
    pub uvs: Vec<Point2>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Returns every distinct undirected triangle edge, smaller index first,
    /// in ascending order. This is the wireframe overlay of the mesh.
    #[must_use]
    pub fn unique_edges(&self) -> Vec<[u32; 2]> {
        let mut edges = BTreeSet::new();
        for &[a, b, c] in &self.indices {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                edges.insert(if u < v { [u, v] } else { [v, u] });
            }
        }
        edges.into_iter().collect()
    }
}
