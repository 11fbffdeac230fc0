use tracing::debug;

use crate::error::{Result, TessellationError};
use crate::geometry::Curve;

use super::Polyline;

/// Samples a curve at evenly spaced parameters.
#[derive(Debug, Clone, Copy)]
pub struct TessellateCurve {
    divisions: usize,
}

impl TessellateCurve {
    /// Creates a new `TessellateCurve` operation producing `divisions`
    /// segments (`divisions + 1` points).
    #[must_use]
    pub fn new(divisions: usize) -> Self {
        Self { divisions }
    }

    /// Executes the tessellation, returning a polyline.
    ///
    /// A closed curve yields a closed polyline whose last point is exactly
    /// its first.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::InvalidParameters`] if `divisions` is zero,
    /// or any error from evaluating the curve.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute<C: Curve + ?Sized>(&self, curve: &C) -> Result<Polyline> {
        if self.divisions == 0 {
            return Err(TessellationError::InvalidParameters(
                "at least one division is required".to_owned(),
            )
            .into());
        }

        let domain = curve.domain();
        let mut points = Vec::with_capacity(self.divisions + 1);
        for i in 0..self.divisions {
            points.push(curve.evaluate(domain.lerp(i as f64 / self.divisions as f64))?);
        }
        let last = if curve.is_closed() {
            points[0]
        } else {
            curve.evaluate(domain.t_max)?
        };
        points.push(last);

        debug!(points = points.len(), "tessellated curve");
        Ok(Polyline { points })
    }
}
