pub mod curve;

pub use curve::{ArcLengthView, Circle, ClosedSpline, Curve, CurveDomain, SplineKind};
