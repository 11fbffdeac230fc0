use std::f64::consts::PI;

use rand::Rng;
use slotmap::new_key_type;

use crate::error::{ConfigError, Result};
use crate::geometry::ClosedSpline;
use crate::math::{hsl_to_rgb, wrap_unit, Point3, Rgb, UnitQuaternion, Vector3};
use crate::rig::Sampling;

new_key_type! {
    /// Handle of a decoration in a [`Scene`](super::Scene).
    pub struct DecorationId;
}

/// Placement and coloring of the decorations scattered along the tube.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecorationParams {
    /// Number of wireframe boxes.
    pub box_count: usize,
    /// Edge length of each box.
    pub box_size: f64,
    /// Number of glowing sphere markers.
    pub marker_count: usize,
    /// Radius of each marker.
    pub marker_radius: f64,
    /// Random extra path fraction added to each evenly spaced slot.
    pub spread: f64,
    /// Jitter on x and z is drawn from `[-jitter_bias, 1 - jitter_bias)`.
    pub jitter_bias: f64,
    /// Hue at path position zero; hue decreases along the path.
    pub hue_start: f64,
    /// Hue advance per elapsed millisecond.
    pub hue_rate_per_ms: f64,
    /// HSL saturation of every decoration.
    pub saturation: f64,
    /// HSL lightness of every decoration.
    pub lightness: f64,
}

impl Default for DecorationParams {
    fn default() -> Self {
        Self {
            box_count: 55,
            box_size: 0.075,
            marker_count: 20,
            marker_radius: 0.02,
            spread: 0.1,
            jitter_bias: 0.4,
            hue_start: 0.7,
            hue_rate_per_ms: 0.0001,
            saturation: 1.0,
            lightness: 0.5,
        }
    }
}

impl DecorationParams {
    /// Checks sizes and rates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParameterOutOfRange`] for non-positive sizes or
    /// non-finite spread, jitter, hue or rate values.
    pub fn validate(&self) -> Result<()> {
        for (parameter, value) in [
            ("box_size", self.box_size),
            ("marker_radius", self.marker_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(out_of_range(parameter, value, f64::MIN_POSITIVE));
            }
        }
        for (parameter, value) in [
            ("spread", self.spread),
            ("jitter_bias", self.jitter_bias),
            ("hue_start", self.hue_start),
            ("hue_rate_per_ms", self.hue_rate_per_ms),
            ("saturation", self.saturation),
            ("lightness", self.lightness),
        ] {
            if !value.is_finite() {
                return Err(out_of_range(parameter, value, f64::MIN));
            }
        }
        Ok(())
    }
}

fn out_of_range(parameter: &'static str, value: f64, min: f64) -> crate::error::TubeflightError {
    ConfigError::ParameterOutOfRange {
        parameter,
        value,
        min,
        max: f64::MAX,
    }
    .into()
}

/// Corner index pairs that differ in exactly one bit.
const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// An axis-aligned cube of side `size`, rotated and moved into place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireBox {
    /// World-space center.
    pub center: Point3,
    /// Edge length.
    pub size: f64,
    /// Rotation about the center.
    pub orientation: UnitQuaternion,
}

impl WireBox {
    /// The eight corners in world space.
    #[must_use]
    pub fn corners(&self) -> [Point3; 8] {
        let h = self.size * 0.5;
        let mut corners = [Point3::origin(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let local = Vector3::new(
                if i & 1 == 0 { -h } else { h },
                if i & 2 == 0 { -h } else { h },
                if i & 4 == 0 { -h } else { h },
            );
            *corner = self.center + self.orientation * local;
        }
        corners
    }

    /// The twelve cube edges in world space.
    #[must_use]
    pub fn edges(&self) -> [[Point3; 2]; 12] {
        let c = self.corners();
        CUBE_EDGES.map(|(a, b)| [c[a], c[b]])
    }
}

/// A small glowing sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowMarker {
    /// World-space center.
    pub center: Point3,
    /// Sphere radius.
    pub radius: f64,
}

/// Geometry of a decoration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Twelve-edge wireframe cube.
    WireBox(WireBox),
    /// Emissive sphere.
    GlowMarker(GlowMarker),
}

/// A static scene ornament whose color follows the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoration {
    /// Geometry in world space.
    pub shape: Shape,
    /// Path position the decoration was placed at.
    pub path_parameter: f64,
    /// Hue at elapsed time zero, before wrapping.
    pub base_hue: f64,
    /// Color for the most recent [`cycle_hues`](super::Scene::cycle_hues) call.
    pub color: Rgb,
}

impl Decoration {
    /// World-space center.
    #[must_use]
    pub fn position(&self) -> Point3 {
        match &self.shape {
            Shape::WireBox(b) => b.center,
            Shape::GlowMarker(m) => m.center,
        }
    }
}

/// Hue of a decoration after `elapsed_ms`, wrapped into `[0, 1)`.
///
/// Negative and non-finite times count as zero.
#[must_use]
pub fn cycled_hue(base_hue: f64, elapsed_ms: f64, rate_per_ms: f64) -> f64 {
    let elapsed = if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
        elapsed_ms
    } else {
        0.0
    };
    wrap_unit(base_hue + elapsed * rate_per_ms)
}

/// Color of a decoration after `elapsed_ms`.
#[must_use]
pub fn decoration_color(params: &DecorationParams, base_hue: f64, elapsed_ms: f64) -> Rgb {
    hsl_to_rgb(
        cycled_hue(base_hue, elapsed_ms, params.hue_rate_per_ms),
        params.saturation,
        params.lightness,
    )
}

/// Scatters boxes and markers along `path`.
///
/// Slot `i` of `n` sits at `(i / n + rand * spread) mod 1`, nudged on x and z
/// by `rand - jitter_bias`. Boxes get a random XYZ rotation in `[0, pi)` per
/// axis. Base hues fall off from `hue_start` along the path.
pub(crate) fn scatter<R: Rng>(
    path: &ClosedSpline,
    sampling: Sampling,
    params: &DecorationParams,
    rng: &mut R,
) -> Vec<Decoration> {
    let mut out = Vec::with_capacity(params.box_count + params.marker_count);

    for i in 0..params.box_count {
        let (p, center) = slot(path, sampling, params, i, params.box_count, rng);
        let (rx, ry, rz) = (
            rng.random::<f64>() * PI,
            rng.random::<f64>() * PI,
            rng.random::<f64>() * PI,
        );
        // intrinsic XYZ Euler angles: Rx * Ry * Rz
        let orientation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), rx)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), ry)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), rz);
        out.push(new_decoration(
            params,
            p,
            Shape::WireBox(WireBox {
                center,
                size: params.box_size,
                orientation,
            }),
        ));
    }

    for i in 0..params.marker_count {
        let (p, center) = slot(path, sampling, params, i, params.marker_count, rng);
        out.push(new_decoration(
            params,
            p,
            Shape::GlowMarker(GlowMarker {
                center,
                radius: params.marker_radius,
            }),
        ));
    }

    out
}

#[allow(clippy::cast_precision_loss)]
fn slot<R: Rng>(
    path: &ClosedSpline,
    sampling: Sampling,
    params: &DecorationParams,
    i: usize,
    n: usize,
    rng: &mut R,
) -> (f64, Point3) {
    let p = wrap_unit(i as f64 / n as f64 + rng.random::<f64>() * params.spread);
    let mut center = match sampling {
        Sampling::Parametric => path.point_at(p),
        Sampling::ArcLength => path.point_at_arc_length(p),
    };
    center.x += rng.random::<f64>() - params.jitter_bias;
    center.z += rng.random::<f64>() - params.jitter_bias;
    (p, center)
}

fn new_decoration(params: &DecorationParams, p: f64, shape: Shape) -> Decoration {
    let base_hue = params.hue_start - p;
    Decoration {
        shape,
        path_parameter: p,
        base_hue,
        color: decoration_color(params, base_hue, 0.0),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::PathGenerator;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn unit_box_has_twelve_unit_edges() {
        let b = WireBox {
            center: Point3::new(1.0, 2.0, 3.0),
            size: 1.0,
            orientation: UnitQuaternion::from_euler_angles(0.3, 1.1, -0.4),
        };
        let edges = b.edges();
        assert_eq!(edges.len(), 12);
        for [a, c] in edges {
            assert_relative_eq!((c - a).norm(), 1.0, epsilon = 1e-12);
        }
        let centroid = b
            .corners()
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / 8.0;
        assert_relative_eq!(Point3::from(centroid), b.center, epsilon = 1e-12);
    }

    #[test]
    fn hue_cycles_with_period() {
        let rate = 0.0001;
        let h0 = cycled_hue(0.7, 0.0, rate);
        let h1 = cycled_hue(0.7, 10_000.0, rate);
        assert_relative_eq!(h0, 0.7);
        assert_relative_eq!(h0, h1, epsilon = 1e-12);
        assert_relative_eq!(cycled_hue(0.7, 2500.0, rate), 0.95, epsilon = 1e-12);
    }

    #[test]
    fn negative_time_keeps_base_hue() {
        assert_relative_eq!(cycled_hue(-0.2, -50.0, 0.01), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn scatter_counts_and_ranges() {
        let path = PathGenerator::new(10, 5.0).with_seed(42).generate().unwrap();
        let params = DecorationParams::default();
        let mut rng = StdRng::seed_from_u64(1);
        let decorations = scatter(&path, Sampling::Parametric, &params, &mut rng);
        assert_eq!(decorations.len(), 75);

        let boxes = decorations
            .iter()
            .filter(|d| matches!(d.shape, Shape::WireBox(_)))
            .count();
        assert_eq!(boxes, 55);

        for d in &decorations {
            assert!((0.0..1.0).contains(&d.path_parameter));
            assert_relative_eq!(d.base_hue, 0.7 - d.path_parameter);
            let on_path = path.point_at(d.path_parameter);
            let offset = d.position() - on_path;
            assert!(offset.y.abs() < 1e-12);
            assert!((-0.4 - 1e-9..0.6 + 1e-9).contains(&offset.x));
            assert!((-0.4 - 1e-9..0.6 + 1e-9).contains(&offset.z));
        }
    }

    #[test]
    fn validate_rejects_bad_sizes() {
        let params = DecorationParams {
            box_size: 0.0,
            ..DecorationParams::default()
        };
        assert!(params.validate().is_err());
        let params = DecorationParams {
            hue_rate_per_ms: f64::NAN,
            ..DecorationParams::default()
        };
        assert!(params.validate().is_err());
        assert!(DecorationParams::default().validate().is_ok());
    }
}
