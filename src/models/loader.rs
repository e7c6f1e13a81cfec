//! Artifact bundle loader

use crate::models::bundle::{ArtifactBundle, BundleFile, ModelSpec};
use crate::models::classifier::Classifier;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Loader for JSON artifact bundles
#[derive(Debug, Default)]
pub struct BundleLoader;

impl BundleLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load and validate a bundle from file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ArtifactBundle> {
        let path = path.as_ref();

        info!(path = %path.display(), "Loading artifact bundle");

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact bundle {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let bundle = self
            .load_from_str(&json, base_dir)
            .with_context(|| format!("Invalid artifact bundle {}", path.display()))?;

        info!(
            path = %path.display(),
            model = bundle.model().kind(),
            features = bundle.feature_cols().len(),
            expanded_features = bundle.poly().n_output_features(),
            categories = bundle.rel_stats().len(),
            global_q90 = bundle.global_q90(),
            global_q95 = bundle.global_q95(),
            "Artifact bundle loaded"
        );

        Ok(bundle)
    }

    /// Build a bundle from JSON text. Relative model paths resolve against `base_dir`.
    pub fn load_from_str(&self, json: &str, base_dir: &Path) -> Result<ArtifactBundle> {
        let file: BundleFile =
            serde_json::from_str(json).context("Failed to parse artifact bundle")?;
        self.build(file, base_dir)
    }

    fn build(&self, file: BundleFile, base_dir: &Path) -> Result<ArtifactBundle> {
        let BundleFile {
            model,
            scaler,
            poly,
            feature_cols,
            rel_stats,
            global_q90,
            global_q95,
        } = file;

        let model = self.build_classifier(model, base_dir)?;

        let bundle = ArtifactBundle::new(
            model,
            scaler,
            poly,
            feature_cols,
            rel_stats,
            global_q90,
            global_q95,
        )?;
        Ok(bundle)
    }

    fn build_classifier(&self, spec: ModelSpec, base_dir: &Path) -> Result<Box<dyn Classifier>> {
        match spec {
            ModelSpec::LogisticRegression(model) => Ok(Box::new(model)),
            ModelSpec::Onnx { path } => self.load_onnx(&base_dir.join(path)),
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        use crate::models::classifier::OnnxClassifier;

        let model = OnnxClassifier::load(path)
            .with_context(|| format!("Failed to load ONNX classifier {}", path.display()))?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        anyhow::bail!(
            "bundle references ONNX model {} but this build lacks the `onnx` feature",
            path.display()
        )
    }
}
