//! Feature derivation for extraneous purchase inference.
//!
//! Turns one transaction plus the bundle's category statistics and global
//! amount quantiles into the feature row the fitted scaler expects. The
//! positional order always comes from the bundle's `feature_cols`; nothing
//! here assumes the canonical order.

use crate::error::{PredictError, Result};
use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Features this build knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Amount,
    ZAmountRelated,
    IsLargeGlobal,
    IsVeryLargeGlobal,
    MonthCatShare,
    CategoryFreq,
}

impl Feature {
    /// Canonical training order
    pub const ALL: [Feature; 6] = [
        Feature::Amount,
        Feature::ZAmountRelated,
        Feature::IsLargeGlobal,
        Feature::IsVeryLargeGlobal,
        Feature::MonthCatShare,
        Feature::CategoryFreq,
    ];

    /// Column name used in the training data
    pub fn name(self) -> &'static str {
        match self {
            Feature::Amount => "Amount",
            Feature::ZAmountRelated => "z_amount_related",
            Feature::IsLargeGlobal => "is_large_global",
            Feature::IsVeryLargeGlobal => "is_very_large_global",
            Feature::MonthCatShare => "month_cat_share",
            Feature::CategoryFreq => "category_freq",
        }
    }
}

impl FromStr for Feature {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self> {
        Feature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| PredictError::UnknownFeature(s.to_string()))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Historical amount statistics for one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub rel_mean: f64,
    /// `None` when the training set could not define a spread (e.g. one sample)
    #[serde(default)]
    pub rel_std: Option<f64>,
}

impl CategoryStats {
    pub fn new(rel_mean: f64, rel_std: Option<f64>) -> Self {
        Self { rel_mean, rel_std }
    }

    /// Standard deviation with undefined mapped to NaN
    pub fn std_or_nan(&self) -> f64 {
        self.rel_std.unwrap_or(f64::NAN)
    }
}

/// Per-category statistics table from the bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelStats(HashMap<String, CategoryStats>);

impl RelStats {
    pub fn new(stats: HashMap<String, CategoryStats>) -> Self {
        Self(stats)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<&CategoryStats> {
        self.0.get(category)
    }

    /// Statistics of a "typical" category: the plain mean of every category's
    /// mean and std. NaN stds poison the average, and an empty table yields
    /// NaN for both.
    pub fn population_average(&self) -> (f64, f64) {
        let n = self.0.len() as f64;
        let (mean_sum, std_sum) = self
            .0
            .values()
            .fold((0.0, 0.0), |(m, s), stats| (m + stats.rel_mean, s + stats.std_or_nan()));
        (mean_sum / n, std_sum / n)
    }

    /// Resolve `(rel_mean, rel_std)` for a category, falling back to the
    /// population average for categories not seen in training.
    pub fn resolve(&self, category: &str) -> (f64, f64) {
        match self.0.get(category) {
            Some(stats) => (stats.rel_mean, stats.std_or_nan()),
            None => self.population_average(),
        }
    }
}

impl FromIterator<(String, CategoryStats)> for RelStats {
    fn from_iter<I: IntoIterator<Item = (String, CategoryStats)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// All six features for one transaction, before ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub amount: f64,
    pub z_amount_related: f64,
    pub is_large_global: bool,
    pub is_very_large_global: bool,
    /// Training-time monthly aggregate; fixed at inference
    pub month_cat_share: f64,
    /// Training-time frequency aggregate; fixed at inference
    pub category_freq: f64,
}

impl DerivedFeatures {
    /// Compute every feature for `tx`.
    pub fn compute(tx: &Transaction, stats: &RelStats, global_q90: f64, global_q95: f64) -> Self {
        let (rel_mean, rel_std) = stats.resolve(&tx.category);

        let z_amount_related = if rel_std == 0.0 || rel_std.is_nan() {
            0.0
        } else {
            (tx.amount - rel_mean) / rel_std
        };

        // The two aggregates below cannot be computed from a single row.
        // These constants are what the deployed model has always been fed.
        Self {
            amount: tx.amount,
            z_amount_related,
            is_large_global: tx.amount > global_q90,
            is_very_large_global: tx.amount > global_q95,
            month_cat_share: 0.0,
            category_freq: 1.0,
        }
    }

    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Amount => self.amount,
            Feature::ZAmountRelated => self.z_amount_related,
            Feature::IsLargeGlobal => flag(self.is_large_global),
            Feature::IsVeryLargeGlobal => flag(self.is_very_large_global),
            Feature::MonthCatShare => self.month_cat_share,
            Feature::CategoryFreq => self.category_freq,
        }
    }

    /// Lay the features out in `feature_order`.
    pub fn ordered<S: AsRef<str>>(&self, feature_order: &[S]) -> Result<FeatureVector> {
        let features = feature_order
            .iter()
            .map(|name| name.as_ref().parse::<Feature>())
            .collect::<Result<Vec<_>>>()?;
        let values = features.iter().map(|&f| self.value(f)).collect();

        Ok(FeatureVector { features, values })
    }
}

fn flag(set: bool) -> f64 {
    if set {
        1.0
    } else {
        0.0
    }
}

/// A named, ordered feature row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    features: Vec<Feature>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.features
            .iter()
            .position(|&f| f == feature)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.features.iter().copied().zip(self.values.iter().copied())
    }
}

/// Derive the feature row for `tx` in the order given by `feature_order`.
///
/// Fails with [`PredictError::UnknownFeature`] if the order names a column
/// this build does not produce.
pub fn derive<S: AsRef<str>>(
    tx: &Transaction,
    stats: &RelStats,
    global_q90: f64,
    global_q95: f64,
    feature_order: &[S],
) -> Result<FeatureVector> {
    DerivedFeatures::compute(tx, stats, global_q90, global_q95).ordered(feature_order)
}
