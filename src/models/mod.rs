//! Model artifacts and inference components

pub mod bundle;
pub mod classifier;
pub mod inference;
pub mod loader;
pub mod poly;
pub mod scaler;

pub use bundle::ArtifactBundle;
pub use classifier::{Classifier, LogisticRegression};
pub use inference::{Prediction, Predictor, DEFAULT_THRESHOLD};
pub use loader::BundleLoader;
pub use poly::PolynomialFeatures;
pub use scaler::StandardScaler;
