//! Fitted standardization transform

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};

/// Per-column standardization, `x' = (x - mean) / scale`.
///
/// Mirrors a fitted scikit-learn `StandardScaler`: an absent `mean` means the
/// scaler was fit with `with_mean=False`, an absent `scale` means
/// `with_std=False`. At least one of them must be present so the fitted width
/// is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            mean: Some(mean),
            scale: Some(scale),
        }
    }

    /// Number of columns the scaler was fit on
    pub fn n_features(&self) -> usize {
        self.mean
            .as_ref()
            .or(self.scale.as_ref())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Check the fitted parameters are consistent
    pub fn validate(&self) -> Result<()> {
        if self.mean.is_none() && self.scale.is_none() {
            return Err(PredictError::InvalidBundle(
                "scaler has neither mean nor scale".to_string(),
            ));
        }
        if let (Some(mean), Some(scale)) = (&self.mean, &self.scale) {
            if mean.len() != scale.len() {
                return Err(PredictError::InvalidBundle(format!(
                    "scaler mean has {} columns but scale has {}",
                    mean.len(),
                    scale.len()
                )));
            }
        }
        Ok(())
    }

    /// Scale a single row
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        let expected = self.n_features();
        if row.len() != expected {
            return Err(PredictError::FeatureCountMismatch {
                stage: "scaler",
                expected,
                actual: row.len(),
            });
        }

        let mut out = row.to_vec();
        if let Some(mean) = &self.mean {
            out.iter_mut().zip(mean).for_each(|(x, m)| *x -= m);
        }
        if let Some(scale) = &self.scale {
            // scikit-learn stores 1.0 for constant columns; older exports may carry 0.0
            out.iter_mut()
                .zip(scale)
                .for_each(|(x, &s)| *x /= if s == 0.0 { 1.0 } else { s });
        }
        Ok(out)
    }
}
