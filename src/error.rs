use thiserror::Error;

/// Top-level error type for tubeflight.
#[derive(Debug, Error)]
pub enum TubeflightError {
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors raised while validating setup parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a closed curve needs at least {min} control points, got {count}")]
    TooFewControlPoints { count: usize, min: usize },

    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation parameters: {0}")]
    InvalidParameters(String),
}

/// Errors reported by the host render loop.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("renderer backend failed: {0}")]
    Backend(String),
}

/// Convenience type alias for results using [`TubeflightError`].
pub type Result<T> = std::result::Result<T, TubeflightError>;
