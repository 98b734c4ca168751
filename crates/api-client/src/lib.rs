use crate::error::ProviderError;
use crate::responses::{ChartResponse, ChartResult};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use core_types::{PricePoint, PriceSeries};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

pub mod error;
pub mod responses;

/// The generic, abstract interface for a historical time-series source.
/// This trait is the contract the fetch layer depends on, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait TimeSeriesSource: Send + Sync {
    /// Fetches the closing-price history for one symbol.
    ///
    /// `period` and `interval` use the provider's range keywords
    /// (e.g., "1y" / "1d"). A successful call may still yield an empty
    /// series; callers decide how to treat that.
    async fn get_series(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceSeries, ProviderError>;
}

/// A concrete implementation of `TimeSeriesSource` for the Yahoo Finance
/// chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url("https://query1.finance.yahoo.com")
    }

    /// Points the client at an alternate host. Used by tests to target a
    /// local stub server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            // Yahoo rejects requests without a browser-like user agent.
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; cadence/0.1)")
                .build()
                .expect("Failed to build reqwest client"),
            base_url: base_url.into(),
        }
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeSeriesSource for YahooClient {
    async fn get_series(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceSeries, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", period), ("interval", interval)])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed = serde_json::from_str::<ChartResponse>(&text).map_err(|e| {
            if status.is_success() {
                ProviderError::Deserialization(e.to_string())
            } else {
                ProviderError::Provider(format!("HTTP {}: {}", status, text))
            }
        })?;

        if let Some(err) = parsed.chart.error {
            return Err(ProviderError::Provider(format!(
                "{}: {}",
                err.code, err.description
            )));
        }

        let result = parsed
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| {
                ProviderError::Deserialization("chart response carried no result".to_string())
            })?;

        series_from_chart(result)
    }
}

/// Converts one raw chart result into a validated `PriceSeries`.
///
/// Null and non-positive closes are dropped (halted sessions), and
/// observations that do not advance the calendar date are collapsed so the
/// strictly-increasing invariant holds for any provider interval.
fn series_from_chart(result: ChartResult) -> Result<PriceSeries, ProviderError> {
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Deserialization("chart result carried no quote".to_string()))?;

    let mut points: Vec<PricePoint> = Vec::with_capacity(result.timestamp.len());
    for (ts, close) in result.timestamp.iter().zip(quote.close.iter()) {
        let Some(close) = close else { continue };
        if *close <= 0.0 {
            continue;
        }

        let date = Utc
            .timestamp_opt(*ts, 0)
            .single()
            .ok_or_else(|| ProviderError::InvalidData(format!("Invalid timestamp: {}", ts)))?
            .date_naive();
        if points.last().is_some_and(|p| p.date >= date) {
            continue;
        }

        let close = Decimal::from_f64(*close)
            .ok_or_else(|| ProviderError::InvalidData(format!("Unrepresentable close: {}", close)))?;
        points.push(PricePoint { date, close });
    }

    PriceSeries::from_points(points).map_err(|e| ProviderError::InvalidData(e.to_string()))
}
