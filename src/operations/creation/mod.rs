mod generate_path;

pub use generate_path::{PathGenerator, PathParams, MAX_COORDINATE_RANGE};
