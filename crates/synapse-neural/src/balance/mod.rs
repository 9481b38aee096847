//! Hardware/software balance module
pub mod model;

pub use self::model::{BalanceModel, DEFAULT_TARGET_THROUGHPUT, DEFAULT_WINDOW, MAX_WINDOW};
