//! Prediction report data structures

use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable outcome of scoring one transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Unique prediction identifier
    pub prediction_id: String,

    /// The scored transaction
    pub transaction: Transaction,

    /// Probability of the extraneous class (0.0 - 1.0)
    pub probability: f64,

    /// 1 if extraneous, else 0
    pub label: u8,

    /// Threshold applied to the probability
    pub threshold: f64,

    /// Raw feature values by name
    pub features: BTreeMap<String, f64>,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl PredictionReport {
    pub fn new(transaction: Transaction, probability: f64, label: u8, threshold: f64) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            transaction,
            probability,
            label,
            threshold,
            features: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the named feature values
    pub fn with_features<I>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        self.features = features.into_iter().collect();
        self
    }

    /// Whether the transaction was labeled extraneous
    pub fn is_extraneous(&self) -> bool {
        self.label == 1
    }
}
