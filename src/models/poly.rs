//! Fitted polynomial feature expansion

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};

fn default_include_bias() -> bool {
    true
}

/// Polynomial and interaction terms, laid out like scikit-learn's
/// `PolynomialFeatures`.
///
/// Terms are grouped by total degree (bias first when enabled). Within a
/// degree, terms are the index combinations of the input columns in
/// lexicographic order, with replacement unless `interaction_only`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    pub degree: usize,
    #[serde(default)]
    pub interaction_only: bool,
    #[serde(default = "default_include_bias")]
    pub include_bias: bool,
    pub n_features_in: usize,
    #[serde(skip)]
    terms: Vec<Vec<usize>>,
}

impl PolynomialFeatures {
    pub fn new(
        degree: usize,
        interaction_only: bool,
        include_bias: bool,
        n_features_in: usize,
    ) -> Result<Self> {
        let mut poly = Self {
            degree,
            interaction_only,
            include_bias,
            n_features_in,
            terms: Vec::new(),
        };
        poly.prepare()?;
        Ok(poly)
    }

    /// Validate the configuration and precompute the output terms.
    ///
    /// Must run once after deserializing.
    pub fn prepare(&mut self) -> Result<()> {
        if self.degree == 0 {
            return Err(PredictError::InvalidBundle(
                "polynomial degree must be at least 1".to_string(),
            ));
        }
        if self.n_features_in == 0 {
            return Err(PredictError::InvalidBundle(
                "polynomial expander has no input features".to_string(),
            ));
        }

        let start = if self.include_bias { 0 } else { 1 };
        self.terms = (start..=self.degree)
            .flat_map(|d| combinations(self.n_features_in, d, !self.interaction_only))
            .collect();
        Ok(())
    }

    /// Number of output columns
    pub fn n_output_features(&self) -> usize {
        self.terms.len()
    }

    /// Expand a single row
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features_in {
            return Err(PredictError::FeatureCountMismatch {
                stage: "polynomial expansion",
                expected: self.n_features_in,
                actual: row.len(),
            });
        }

        Ok(self
            .terms
            .iter()
            .map(|term| term.iter().map(|&i| row[i]).product())
            .collect())
    }
}

/// Index combinations of length `k` over `0..n`, lexicographic.
fn combinations(n: usize, k: usize, with_replacement: bool) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    extend_combinations(n, k, with_replacement, 0, &mut current, &mut out);
    out
}

fn extend_combinations(
    n: usize,
    k: usize,
    with_replacement: bool,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == k {
        out.push(current.clone());
        return;
    }
    for i in start..n {
        current.push(i);
        let next = if with_replacement { i } else { i + 1 };
        extend_combinations(n, k, with_replacement, next, current, out);
        current.pop();
    }
}
