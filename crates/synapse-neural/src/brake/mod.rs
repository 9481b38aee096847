//! Debt brake module
pub mod curve;

pub use self::curve::BrakeCurve;
