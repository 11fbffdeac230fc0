use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::geometry::curve::MIN_CONTROL_POINTS;
use crate::geometry::{ClosedSpline, SplineKind};
use crate::math::Point3;

/// Largest accepted `coordinate_range`. Squared chord lengths between
/// control points must stay finite.
pub const MAX_COORDINATE_RANGE: f64 = 1e100;

/// Settings for procedural path generation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathParams {
    /// How many random control points the loop passes through.
    pub num_control_points: usize,
    /// Each coordinate is drawn from `[-coordinate_range, coordinate_range]`.
    pub coordinate_range: f64,
    /// Segment parametrization of the resulting spline.
    pub kind: SplineKind,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            num_control_points: 10,
            coordinate_range: 5.0,
            kind: SplineKind::Centripetal,
        }
    }
}

impl PathParams {
    /// Checks the parameters without generating anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooFewControlPoints`] for fewer than three
    /// points and [`ConfigError::ParameterOutOfRange`] for a non-positive or
    /// non-finite coordinate range, or one above [`MAX_COORDINATE_RANGE`].
    pub fn validate(&self) -> Result<()> {
        if self.num_control_points < MIN_CONTROL_POINTS {
            return Err(ConfigError::TooFewControlPoints {
                count: self.num_control_points,
                min: MIN_CONTROL_POINTS,
            }
            .into());
        }
        if !(self.coordinate_range > 0.0 && self.coordinate_range <= MAX_COORDINATE_RANGE) {
            return Err(ConfigError::ParameterOutOfRange {
                parameter: "coordinate_range",
                value: self.coordinate_range,
                min: f64::MIN_POSITIVE,
                max: MAX_COORDINATE_RANGE,
            }
            .into());
        }
        Ok(())
    }
}

/// Generates a randomized closed spline that serves as both the tube's
/// centerline and the camera track.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    params: PathParams,
    seed: Option<u64>,
}

impl PathGenerator {
    /// Creates a generator for `num_control_points` points within
    /// `[-coordinate_range, coordinate_range]` on every axis.
    #[must_use]
    pub fn new(num_control_points: usize, coordinate_range: f64) -> Self {
        Self::from_params(PathParams {
            num_control_points,
            coordinate_range,
            ..PathParams::default()
        })
    }

    /// Creates a generator from a full parameter set.
    #[must_use]
    pub fn from_params(params: PathParams) -> Self {
        Self { params, seed: None }
    }

    /// Fixes the random seed so the same curve is produced every time.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Selects the spline parametrization.
    #[must_use]
    pub fn with_kind(mut self, kind: SplineKind) -> Self {
        self.params.kind = kind;
        self
    }

    /// Returns the generation parameters.
    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Generates the curve. Without a seed the points come from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns an invalid-configuration error if the parameters are rejected
    /// by [`PathParams::validate`].
    pub fn generate(&self) -> Result<ClosedSpline> {
        self.params.validate()?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let points = self.sample_control_points(&mut rng);
        debug!(
            seed = ?self.seed,
            control_points = points.len(),
            range = self.params.coordinate_range,
            "generated path control points"
        );
        ClosedSpline::new(points, self.params.kind)
    }

    /// Draws the control points from `rng` in curve order.
    pub fn sample_control_points<R: Rng>(&self, rng: &mut R) -> Vec<Point3> {
        let r = self.params.coordinate_range;
        (0..self.params.num_control_points)
            .map(|_| {
                Point3::new(
                    rng.random_range(-r..=r),
                    rng.random_range(-r..=r),
                    rng.random_range(-r..=r),
                )
            })
            .collect()
    }
}
