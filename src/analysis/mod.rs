//! Analysis modules.
//!
//! Reshapes upstream scores into chart series and summaries.

pub mod aggregator;

pub use aggregator::*;
