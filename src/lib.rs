pub mod error;
pub mod geometry;
pub mod host;
pub mod math;
pub mod operations;
pub mod rig;
pub mod scene;
pub mod tessellation;

pub use error::{Result, TubeflightError};
pub use geometry::{ClosedSpline, Curve};
pub use host::{FlightLoop, Frame, Renderer, Viewport};
pub use operations::creation::{PathGenerator, PathParams};
pub use rig::{CameraPose, FlightRig, RigParams, Sampling};
pub use scene::{Scene, SceneParams};
