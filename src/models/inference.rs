//! Extraneous purchase predictor

use crate::error::{PredictError, Result};
use crate::feature_extractor::FeatureVector;
use crate::models::bundle::ArtifactBundle;
use crate::types::prediction::PredictionReport;
use crate::types::transaction::Transaction;
use std::sync::Arc;
use tracing::debug;

/// Default probability cut-off for the extraneous label
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Result of scoring one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Probability of the extraneous class
    pub probability: f64,
    /// 1 if extraneous, else 0
    pub label: u8,
    /// Threshold the label was cut at
    pub threshold: f64,
    /// Raw features fed to the scaler
    pub features: FeatureVector,
}

impl Prediction {
    /// Convert into a serializable report for `transaction`
    pub fn to_report(&self, transaction: &Transaction) -> PredictionReport {
        PredictionReport::new(transaction.clone(), self.probability, self.label, self.threshold)
            .with_features(
                self.features
                    .iter()
                    .map(|(feature, value)| (feature.name().to_string(), value)),
            )
    }
}

/// Scores transactions against a shared, read-only artifact bundle.
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ArtifactBundle>,
}

impl Predictor {
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self::from_shared(Arc::new(bundle))
    }

    pub fn from_shared(bundle: Arc<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Derive features, scale, expand. Returns the raw features and the
    /// classifier input row.
    fn prepare(&self, tx: &Transaction) -> Result<(FeatureVector, Vec<f64>)> {
        let features = self.bundle.derive(tx)?;
        let scaled = self.bundle.scaler().transform(features.values())?;
        let expanded = self.bundle.poly().transform(&scaled)?;
        if let Some(i) = expanded.iter().position(|v| !v.is_finite()) {
            return Err(PredictError::Classifier(format!(
                "input contains non-finite value {} at column {}",
                expanded[i], i
            )));
        }
        Ok((features, expanded))
    }

    fn positive_probability(&self, row: &[f64]) -> Result<f64> {
        let proba = self.bundle.model().predict_proba(row)?;
        let p = proba.get(1).copied().ok_or_else(|| {
            PredictError::Classifier(format!(
                "expected at least 2 class probabilities, got {}",
                proba.len()
            ))
        })?;
        if !p.is_finite() {
            return Err(PredictError::Classifier(format!(
                "classifier returned non-finite probability {}",
                p
            )));
        }
        Ok(p)
    }

    /// Probability that `tx` is extraneous
    pub fn predict_proba(&self, tx: &Transaction) -> Result<f64> {
        let (_, row) = self.prepare(tx)?;
        self.positive_probability(&row)
    }

    /// Label `tx`: 1 when the extraneous probability reaches `threshold`
    pub fn predict(&self, tx: &Transaction, threshold: f64) -> Result<u8> {
        self.predict_detailed(tx, threshold).map(|p| p.label)
    }

    /// Label `tx` and keep the probability and features
    pub fn predict_detailed(&self, tx: &Transaction, threshold: f64) -> Result<Prediction> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PredictError::InvalidThreshold(threshold));
        }

        let (features, row) = self.prepare(tx)?;
        let probability = self.positive_probability(&row)?;
        let label = u8::from(probability >= threshold);

        debug!(
            category = %tx.category,
            amount = tx.amount,
            probability,
            threshold,
            label,
            "Transaction scored"
        );

        Ok(Prediction {
            probability,
            label,
            threshold,
            features,
        })
    }
}
