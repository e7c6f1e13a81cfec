//! Extraneous Purchase Predictor Library
//!
//! Scores a single transaction with a pre-trained classifier bundle and
//! labels it as extraneous (discretionary) spending or not.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::PredictError;
pub use feature_extractor::{derive, FeatureVector};
pub use models::{ArtifactBundle, BundleLoader, Predictor};
pub use types::{prediction::PredictionReport, transaction::Transaction};
