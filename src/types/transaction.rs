//! Transaction record scored by the predictor

use serde::{Deserialize, Serialize};

/// Date used when the caller does not supply one.
pub const DEFAULT_DATE: &str = "2024-01-01";

/// A single purchase to classify.
///
/// `merchant` and `date` are accepted so callers keep a stable input shape,
/// but no current feature reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Purchase amount
    #[serde(alias = "Amount")]
    pub amount: f64,

    /// Spending category (e.g. "Groceries")
    #[serde(alias = "Category")]
    pub category: String,

    /// Merchant name
    #[serde(alias = "Merchant")]
    pub merchant: String,

    /// Purchase date as supplied by the caller
    #[serde(alias = "Date", default = "default_date")]
    pub date: String,
}

fn default_date() -> String {
    DEFAULT_DATE.to_string()
}

impl Transaction {
    /// Create a transaction with the default date
    pub fn new(amount: f64, category: impl Into<String>, merchant: impl Into<String>) -> Self {
        Self {
            amount,
            category: category.into(),
            merchant: merchant.into(),
            date: default_date(),
        }
    }

    /// Replace the purchase date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_date() {
        let tx = Transaction::new(12.5, "Dining", "Cafe");
        assert_eq!(tx.date, DEFAULT_DATE);

        let tx = tx.with_date("2024-06-30");
        assert_eq!(tx.date, "2024-06-30");
    }

    #[test]
    fn test_deserialize_training_column_names() {
        let json = r#"{"Amount": 60.0, "Category": "Dining", "Merchant": "Bistro"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.amount, 60.0);
        assert_eq!(tx.category, "Dining");
        assert_eq!(tx.merchant, "Bistro");
        assert_eq!(tx.date, DEFAULT_DATE);
    }
}
