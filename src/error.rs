//! Error types for feature derivation and prediction

use thiserror::Error;

/// Errors raised while turning a transaction into a label.
///
/// Every variant except `InvalidThreshold` points at a bundle that does not
/// match this build (or is malformed). None of them are recoverable.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("unknown feature '{0}' in bundle feature_cols")]
    UnknownFeature(String),

    #[error("{stage}: expected {expected} features, got {actual}")]
    FeatureCountMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("invalid artifact bundle: {0}")]
    InvalidBundle(String),

    #[error("classifier failed: {0}")]
    Classifier(String),
}

pub type Result<T> = std::result::Result<T, PredictError>;
