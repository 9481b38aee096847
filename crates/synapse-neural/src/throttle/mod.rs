//! Throttle combination module
pub mod combiner;

pub use self::combiner::ThrottleCombiner;
