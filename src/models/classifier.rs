//! Binary classifiers exposing class probabilities

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};

/// A fitted binary classifier.
///
/// `predict_proba` returns one probability per class for a single expanded
/// row; index 1 is the extraneous class.
pub trait Classifier: Send + Sync {
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>>;

    /// Expected input width, if the classifier knows it
    fn n_features(&self) -> Option<usize> {
        None
    }

    /// Short name for logs
    fn kind(&self) -> &'static str;
}

/// Logistic regression with stored coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    pub fn decision_function(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coef.len() {
            return Err(PredictError::FeatureCountMismatch {
                stage: "classifier",
                expected: self.coef.len(),
                actual: row.len(),
            });
        }
        let dot: f64 = self.coef.iter().zip(row).map(|(w, x)| w * x).sum();
        Ok(dot + self.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
        let p = sigmoid(self.decision_function(row)?);
        Ok(vec![1.0 - p, p])
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coef.len())
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Narrow a row to `f32`, rejecting values that overflow.
#[cfg(any(feature = "onnx", test))]
fn narrow_row(row: &[f64]) -> Result<Vec<f32>> {
    let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
    if let Some(i) = features.iter().position(|v| !v.is_finite()) {
        return Err(PredictError::Classifier(format!(
            "column {} ({}) does not fit in f32",
            i, row[i]
        )));
    }
    Ok(features)
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use super::Classifier;
    use crate::error::{PredictError, Result};
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Tensor;
    use std::path::Path;
    use std::sync::Mutex;
    use tracing::{debug, info};

    fn ort_error(e: impl std::fmt::Display) -> PredictError {
        PredictError::Classifier(e.to_string())
    }

    /// ONNX export of the classifier, run with ONNX Runtime
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        input_name: String,
        output_name: String,
    }

    impl OnnxClassifier {
        /// Load an ONNX model from file
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();

            let session = Session::builder()
                .map_err(ort_error)?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(ort_error)?
                .with_intra_threads(1)
                .map_err(ort_error)?
                .commit_from_file(path)
                .map_err(|e| {
                    PredictError::Classifier(format!("failed to load {}: {}", path.display(), e))
                })?;

            let input_name = session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| "float_input".to_string());

            // skl2onnx names the probability output "probabilities"
            let output_name = session
                .outputs
                .iter()
                .find(|o| o.name.contains("prob"))
                .or_else(|| session.outputs.last())
                .map(|o| o.name.clone())
                .unwrap_or_else(|| "probabilities".to_string());

            info!(
                path = %path.display(),
                input = %input_name,
                output = %output_name,
                "ONNX classifier loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                output_name,
            })
        }
    }

    impl Classifier for OnnxClassifier {
        fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
            let features = super::narrow_row(row)?;
            let shape = vec![1_i64, features.len() as i64];
            let input = Tensor::from_array((shape, features)).map_err(ort_error)?;

            let mut session = self
                .session
                .lock()
                .map_err(|e| PredictError::Classifier(format!("lock error: {}", e)))?;
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input])
                .map_err(ort_error)?;

            let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
                PredictError::Classifier(format!("missing output '{}'", self.output_name))
            })?;
            let (_, data) = output.try_extract_tensor::<f32>().map_err(ort_error)?;

            debug!(output = %self.output_name, values = data.len(), "ONNX probabilities");
            Ok(data.iter().map(|&p| p as f64).collect())
        }

        fn kind(&self) -> &'static str {
            "onnx"
        }
    }
}
