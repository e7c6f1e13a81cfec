//! Extraneous Purchase Predictor - Main Entry Point
//!
//! Scores one transaction from the command line and prints its label.

use anyhow::{Context, Result};
use clap::Parser;
use extraneous_predictor::{
    config::{AppConfig, LogFormat, LoggingConfig},
    models::{BundleLoader, Predictor},
    types::transaction::{Transaction, DEFAULT_DATE},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "extraneous-predict")]
#[command(about = "Predict whether a purchase is extraneous", long_about = None)]
struct Cli {
    /// Amount of the purchase
    #[arg(long, value_parser = parse_amount)]
    amount: f64,
    /// Category name
    #[arg(long)]
    category: String,
    /// Merchant name
    #[arg(long)]
    merchant: String,
    /// Optional date
    #[arg(long, default_value = DEFAULT_DATE)]
    date: String,
    /// Config file path (defaults to config/config.toml when present)
    #[arg(short, long)]
    config: Option<String>,
    /// Artifact bundle path, overrides the configured one
    #[arg(long, env = "EXTRANEOUS_BUNDLE")]
    bundle: Option<String>,
    /// Probability threshold, overrides the configured one
    #[arg(long)]
    threshold: Option<f64>,
    /// Print a JSON report instead of the bare label
    #[arg(long)]
    json: bool,
}

fn parse_amount(s: &str) -> Result<f64, String> {
    let amount: f64 = s.parse().map_err(|e| format!("invalid amount '{}': {}", s, e))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount must be a non-negative number, got {}", s));
    }
    Ok(amount)
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("extraneous_predictor={}", logging.level))
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    if let Some(bundle) = &cli.bundle {
        config.model.bundle_path = bundle.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.model.threshold = threshold;
    }
    config.validate()?;

    init_logging(&config.logging)?;
    debug!(config = ?config, "Configuration loaded");

    let bundle = BundleLoader::new()
        .load(&config.model.bundle_path)
        .context("Failed to load artifact bundle")?;
    let predictor = Predictor::new(bundle);

    let transaction = Transaction::new(cli.amount, cli.category, cli.merchant).with_date(cli.date);
    let prediction = predictor.predict_detailed(&transaction, config.model.threshold)?;

    info!(
        category = %transaction.category,
        amount = transaction.amount,
        probability = prediction.probability,
        threshold = prediction.threshold,
        label = prediction.label,
        "Prediction complete"
    );

    if cli.json {
        let report = prediction.to_report(&transaction);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", prediction.label);
    }

    Ok(())
}
