mod pose;

pub use pose::CameraPose;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{ConfigError, Result};
use crate::geometry::ClosedSpline;
use crate::math::wrap_unit;

/// How a normalized loop position maps onto the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sampling {
    /// Evaluate the spline parameter directly. Speed varies with
    /// control-point spacing.
    #[default]
    Parametric,
    /// Evaluate by arc-length fraction for constant speed.
    ArcLength,
}

/// Timing settings of the fly-through.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigParams {
    /// Scaled milliseconds for one full traversal.
    pub loop_duration_ms: f64,
    /// How far ahead of the eye the look-at target sits, as a curve fraction.
    pub lookahead_fraction: f64,
    /// Multiplier applied to elapsed time before looping.
    pub time_scale: f64,
    /// Curve sampling mode.
    pub sampling: Sampling,
}

impl Default for RigParams {
    fn default() -> Self {
        Self {
            loop_duration_ms: 8000.0,
            lookahead_fraction: 0.03,
            time_scale: 1.0,
            sampling: Sampling::Parametric,
        }
    }
}

impl RigParams {
    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParameterOutOfRange`] when the loop duration or
    /// time scale is not a positive finite number, or the lookahead is outside
    /// `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        positive("loop_duration_ms", self.loop_duration_ms)?;
        positive("time_scale", self.time_scale)?;
        // a zero lookahead puts the target on the eye
        if !(self.lookahead_fraction > 0.0 && self.lookahead_fraction < 1.0) {
            return Err(ConfigError::ParameterOutOfRange {
                parameter: "lookahead_fraction",
                value: self.lookahead_fraction,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        Ok(())
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ParameterOutOfRange {
            parameter,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        }
        .into())
    }
}

/// Moves a camera around a closed path, one loop every
/// `loop_duration_ms / time_scale` milliseconds of elapsed time.
///
/// The rig holds no per-frame state: [`update`](Self::update) is a pure
/// function of the elapsed time.
#[derive(Debug, Clone)]
pub struct FlightRig {
    path: Arc<ClosedSpline>,
    params: RigParams,
}

impl FlightRig {
    /// Creates a rig on `path` with default timing.
    #[must_use]
    pub fn new(path: Arc<ClosedSpline>) -> Self {
        Self {
            path,
            params: RigParams::default(),
        }
    }

    /// Creates a rig with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an invalid-configuration error if `params` fail validation.
    pub fn with_params(path: Arc<ClosedSpline>, params: RigParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { path, params })
    }

    /// Sets the loop duration and the lookahead distance.
    ///
    /// On error the previous settings are kept.
    ///
    /// # Errors
    ///
    /// Returns an invalid-configuration error for a non-positive duration or
    /// a lookahead outside `(0, 1)`.
    pub fn configure(&mut self, loop_duration_ms: f64, lookahead_fraction: f64) -> Result<()> {
        self.reconfigure(RigParams {
            loop_duration_ms,
            lookahead_fraction,
            ..self.params
        })
    }

    /// Replaces all settings at once.
    ///
    /// # Errors
    ///
    /// Same as [`RigParams::validate`].
    pub fn reconfigure(&mut self, params: RigParams) -> Result<()> {
        params.validate()?;
        debug!(?params, "flight rig configured");
        self.params = params;
        Ok(())
    }

    /// Returns the current settings.
    #[must_use]
    pub fn params(&self) -> &RigParams {
        &self.params
    }

    /// Returns the path the camera travels.
    #[must_use]
    pub fn path(&self) -> &Arc<ClosedSpline> {
        &self.path
    }

    /// Elapsed milliseconds after which the pose repeats.
    #[must_use]
    pub fn period_ms(&self) -> f64 {
        self.params.loop_duration_ms / self.params.time_scale
    }

    /// Normalized loop position in `[0, 1)` for an elapsed time.
    ///
    /// Negative and non-finite times count as zero.
    #[must_use]
    pub fn progress(&self, elapsed_ms: f64) -> f64 {
        let elapsed = if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            elapsed_ms
        } else {
            0.0
        };
        let looped = (elapsed * self.params.time_scale) % self.params.loop_duration_ms;
        wrap_unit(looped / self.params.loop_duration_ms)
    }

    /// Computes the camera pose for an elapsed time.
    #[must_use]
    pub fn update(&self, elapsed_ms: f64) -> CameraPose {
        let parameter = self.progress(elapsed_ms);
        let target_parameter = wrap_unit(parameter + self.params.lookahead_fraction);

        let (position, target) = match self.params.sampling {
            Sampling::Parametric => (
                self.path.point_at(parameter),
                self.path.point_at(target_parameter),
            ),
            Sampling::ArcLength => (
                self.path.point_at_arc_length(parameter),
                self.path.point_at_arc_length(target_parameter),
            ),
        };

        trace!(elapsed_ms, parameter, target_parameter, "camera pose");
        CameraPose {
            position,
            target,
            parameter,
            target_parameter,
        }
    }
}
