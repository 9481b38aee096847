//! Integration debt index module
pub mod scorer;

pub use self::scorer::{DebtScorer, IntegrationStats};
