use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetch: FetchPolicy,
    pub backtest: BacktestSettings,
    pub alerts: AlertSettings,
}

/// Controls how the resilient fetch layer talks to the market-data provider.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchPolicy {
    /// Retry ceiling per symbol. A symbol is given up on once this many
    /// attempts have failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts, in milliseconds.
    /// The delay before retry N is `backoff_base_ms * 2^N` (N starting at 0).
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// The provider's time range keyword (e.g., "1mo", "1y").
    #[serde(default = "default_period")]
    pub period: String,
    /// The provider's sampling interval keyword (e.g., "1d", "1wk").
    #[serde(default = "default_interval")]
    pub interval: String,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            period: default_period(),
            interval: default_interval(),
        }
    }
}

/// Contains parameters for a single dollar-cost-averaging backtest run.
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestSettings {
    /// The reference index the contributions are simulated against (e.g., "SPY").
    pub reference_symbol: String,
    /// The calendar month of this date anchors the first contribution.
    pub start_date: NaiveDate,
    /// One contribution amount per month, in order.
    pub contributions: Vec<Decimal>,
}

/// Contains the caller-supplied target prices for threshold alerts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertSettings {
    /// Mapping of symbol to target price.
    #[serde(default)]
    pub targets: HashMap<String, Decimal>,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_period() -> String {
    "1y".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}
