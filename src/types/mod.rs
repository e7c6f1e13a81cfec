//! Type definitions for the extraneous purchase predictor

pub mod prediction;
pub mod transaction;

pub use prediction::PredictionReport;
pub use transaction::Transaction;
