//! Artifact bundle produced by the training pipeline

use crate::error::{PredictError, Result};
use crate::feature_extractor::{self, Feature, FeatureVector, RelStats};
use crate::models::classifier::{Classifier, LogisticRegression};
use crate::models::poly::PolynomialFeatures;
use crate::models::scaler::StandardScaler;
use crate::types::transaction::Transaction;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Classifier section of the bundle file
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression(LogisticRegression),
    /// ONNX export, path relative to the bundle file
    Onnx { path: PathBuf },
}

/// On-disk layout of the bundle. Key names match the training artifacts.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleFile {
    pub model: ModelSpec,
    pub scaler: StandardScaler,
    pub poly: PolynomialFeatures,
    pub feature_cols: Vec<String>,
    pub rel_stats: RelStats,
    pub global_q90: f64,
    pub global_q95: f64,
}

/// Everything needed to score a transaction. Immutable once built.
pub struct ArtifactBundle {
    model: Box<dyn Classifier>,
    scaler: StandardScaler,
    poly: PolynomialFeatures,
    feature_cols: Vec<String>,
    rel_stats: RelStats,
    global_q90: f64,
    global_q95: f64,
}

impl ArtifactBundle {
    /// Assemble and validate a bundle.
    pub fn new(
        model: Box<dyn Classifier>,
        scaler: StandardScaler,
        mut poly: PolynomialFeatures,
        feature_cols: Vec<String>,
        rel_stats: RelStats,
        global_q90: f64,
        global_q95: f64,
    ) -> Result<Self> {
        poly.prepare()?;
        let bundle = Self {
            model,
            scaler,
            poly,
            feature_cols,
            rel_stats,
            global_q90,
            global_q95,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check the artifacts agree with each other and with this build.
    pub fn validate(&self) -> Result<()> {
        if !self.global_q90.is_finite() || !self.global_q95.is_finite() {
            return Err(PredictError::InvalidBundle(
                "global quantiles must be finite".to_string(),
            ));
        }
        if self.global_q90 > self.global_q95 {
            return Err(PredictError::InvalidBundle(format!(
                "global_q90 ({}) exceeds global_q95 ({})",
                self.global_q90, self.global_q95
            )));
        }

        if self.feature_cols.is_empty() {
            return Err(PredictError::InvalidBundle("feature_cols is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for name in &self.feature_cols {
            Feature::from_str(name)?;
            if !seen.insert(name.as_str()) {
                return Err(PredictError::InvalidBundle(format!(
                    "duplicate feature column '{}'",
                    name
                )));
            }
        }

        self.scaler.validate()?;
        let width = self.feature_cols.len();
        check_width("scaler", self.scaler.n_features(), width)?;
        check_width("polynomial expansion", self.poly.n_features_in, width)?;

        if let Some(expected) = self.model.n_features() {
            check_width("classifier", expected, self.poly.n_output_features())?;
        }
        Ok(())
    }

    /// Derive the ordered raw feature row for a transaction
    pub fn derive(&self, tx: &Transaction) -> Result<FeatureVector> {
        feature_extractor::derive(
            tx,
            &self.rel_stats,
            self.global_q90,
            self.global_q95,
            &self.feature_cols,
        )
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn poly(&self) -> &PolynomialFeatures {
        &self.poly
    }

    pub fn feature_cols(&self) -> &[String] {
        &self.feature_cols
    }

    pub fn rel_stats(&self) -> &RelStats {
        &self.rel_stats
    }

    pub fn global_q90(&self) -> f64 {
        self.global_q90
    }

    pub fn global_q95(&self) -> f64 {
        self.global_q95
    }
}

fn check_width(stage: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(PredictError::FeatureCountMismatch {
            stage,
            expected,
            actual,
        });
    }
    Ok(())
}

impl fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("model", &self.model.kind())
            .field("scaler", &self.scaler)
            .field("poly", &self.poly)
            .field("feature_cols", &self.feature_cols)
            .field("categories", &self.rel_stats.len())
            .field("global_q90", &self.global_q90)
            .field("global_q95", &self.global_q95)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feature_extractor::CategoryStats;

    pub(crate) fn canonical_cols() -> Vec<String> {
        Feature::ALL.iter().map(|f| f.name().to_string()).collect()
    }

    pub(crate) fn dining_stats() -> RelStats {
        [("Dining".to_string(), CategoryStats::new(40.0, Some(10.0)))]
            .into_iter()
            .collect()
    }

    /// Bundle with identity scaling and degree-1 expansion without bias, so
    /// the classifier sees the raw features.
    pub(crate) fn linear_bundle(model: Box<dyn Classifier>) -> ArtifactBundle {
        ArtifactBundle::new(
            model,
            StandardScaler::new(vec![0.0; 6], vec![1.0; 6]),
            PolynomialFeatures::new(1, false, false, 6).unwrap(),
            canonical_cols(),
            dining_stats(),
            100.0,
            200.0,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_bundle() {
        let bundle = linear_bundle(Box::new(LogisticRegression::new(vec![0.0; 6], 0.0)));
        assert_eq!(bundle.feature_cols().len(), 6);
        assert_eq!(bundle.poly().n_output_features(), 6);

        let fv = bundle.derive(&Transaction::new(60.0, "Dining", "Bistro")).unwrap();
        assert_eq!(fv.get(Feature::ZAmountRelated), Some(2.0));
    }

    #[test]
    fn test_rejects_inverted_quantiles() {
        let err = ArtifactBundle::new(
            Box::new(LogisticRegression::new(vec![0.0; 6], 0.0)),
            StandardScaler::new(vec![0.0; 6], vec![1.0; 6]),
            PolynomialFeatures::new(1, false, false, 6).unwrap(),
            canonical_cols(),
            dining_stats(),
            300.0,
            200.0,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::InvalidBundle(_)));
    }

    #[test]
    fn test_rejects_unknown_and_duplicate_columns() {
        let build = |cols: Vec<String>| {
            ArtifactBundle::new(
                Box::new(LogisticRegression::new(vec![0.0; 6], 0.0)),
                StandardScaler::new(vec![0.0; 6], vec![1.0; 6]),
                PolynomialFeatures::new(1, false, false, 6).unwrap(),
                cols,
                dining_stats(),
                100.0,
                200.0,
            )
        };

        let mut unknown = canonical_cols();
        unknown[5] = "merchant_risk".to_string();
        assert!(matches!(build(unknown), Err(PredictError::UnknownFeature(_))));

        let mut duplicate = canonical_cols();
        duplicate[5] = "Amount".to_string();
        assert!(matches!(build(duplicate), Err(PredictError::InvalidBundle(_))));
    }

    #[test]
    fn test_rejects_inconsistent_widths() {
        let err = ArtifactBundle::new(
            Box::new(LogisticRegression::new(vec![0.0; 27], 0.0)),
            StandardScaler::new(vec![0.0; 6], vec![1.0; 6]),
            PolynomialFeatures::new(2, false, true, 6).unwrap(),
            canonical_cols(),
            dining_stats(),
            100.0,
            200.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PredictError::FeatureCountMismatch {
                stage: "classifier",
                expected: 27,
                actual: 28
            }
        ));

        let err = ArtifactBundle::new(
            Box::new(LogisticRegression::new(vec![0.0; 6], 0.0)),
            StandardScaler::new(vec![0.0; 5], vec![1.0; 5]),
            PolynomialFeatures::new(1, false, false, 6).unwrap(),
            canonical_cols(),
            dining_stats(),
            100.0,
            200.0,
        )
        .unwrap_err();
        assert!(matches!(err, PredictError::FeatureCountMismatch { stage: "scaler", .. }));
    }

    #[test]
    fn test_unprepared_expander_is_prepared() {
        struct UnknownWidth;
        impl Classifier for UnknownWidth {
            fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>> {
                Ok(vec![0.5, 0.5])
            }
            fn kind(&self) -> &'static str {
                "unknown_width"
            }
        }

        let poly: PolynomialFeatures =
            serde_json::from_str(r#"{"degree": 2, "n_features_in": 6}"#).unwrap();
        assert_eq!(poly.n_output_features(), 0);

        let bundle = ArtifactBundle::new(
            Box::new(UnknownWidth),
            StandardScaler::new(vec![0.0; 6], vec![1.0; 6]),
            poly,
            canonical_cols(),
            dining_stats(),
            100.0,
            200.0,
        )
        .unwrap();
        assert_eq!(bundle.poly().n_output_features(), 28);
        assert_eq!(bundle.poly().transform(&[1.0; 6]).unwrap().len(), 28);
    }

    #[test]
    fn test_model_spec_tagging() {
        let spec: ModelSpec = serde_json::from_str(
            r#"{"type": "logistic_regression", "coef": [0.5, -0.5], "intercept": 0.1}"#,
        )
        .unwrap();
        match spec {
            ModelSpec::LogisticRegression(lr) => {
                assert_eq!(lr.coef, vec![0.5, -0.5]);
                assert_eq!(lr.intercept, 0.1);
            }
            other => panic!("unexpected spec: {:?}", other),
        }

        let spec: ModelSpec =
            serde_json::from_str(r#"{"type": "onnx", "path": "model.onnx"}"#).unwrap();
        assert!(matches!(spec, ModelSpec::Onnx { .. }));
    }
}
