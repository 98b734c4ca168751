use api_client::TimeSeriesSource;
use configuration::FetchPolicy;
use core_types::{FetchFailure, PriceSeries};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The outcome of one resilient fetch call: a possibly *partial* mapping of
/// symbol to series, plus one terminal record per symbol that exhausted its
/// retry budget. A call where every symbol fails yields an empty mapping,
/// never an error — callers must check for absent symbols explicitly.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub series: HashMap<String, PriceSeries>,
    pub failures: Vec<FetchFailure>,
}

/// Terminal state of one symbol's retry loop.
#[derive(Debug)]
enum SymbolOutcome {
    Succeeded(PriceSeries),
    Failed(FetchFailure),
}

/// Wraps a `TimeSeriesSource` with bounded retries, exponential backoff, and
/// per-symbol failure isolation.
///
/// Each symbol runs on its own tokio task: synchronous within the worker,
/// concurrent across workers, so one symbol's backoff sleeps never delay
/// another symbol's progress. The result mapping receives exactly one
/// insertion per symbol.
pub struct ResilientFetcher {
    source: Arc<dyn TimeSeriesSource>,
    max_attempts: u32,
    backoff_base: Duration,
    cancel: CancellationToken,
}

impl ResilientFetcher {
    pub fn new(source: Arc<dyn TimeSeriesSource>, policy: &FetchPolicy) -> Self {
        Self {
            source,
            max_attempts: policy.max_attempts.max(1),
            backoff_base: Duration::from_millis(policy.backoff_base_ms),
            cancel: CancellationToken::new(),
        }
    }

    /// A token that aborts in-flight retry loops when cancelled. It is checked
    /// before each attempt and raced against every backoff sleep, bounding the
    /// worst-case total retry time (symbols x retries x backoff).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fetches every requested symbol independently. Duplicate symbols are
    /// collapsed so no two workers write the same key.
    pub async fn fetch(&self, symbols: &[String], period: &str, interval: &str) -> FetchReport {
        let mut seen = std::collections::HashSet::new();
        let tasks: Vec<_> = symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .map(|symbol| {
                let source = Arc::clone(&self.source);
                let symbol = symbol.clone();
                let period = period.to_string();
                let interval = interval.to_string();
                let max_attempts = self.max_attempts;
                let backoff_base = self.backoff_base;
                let cancel = self.cancel.clone();

                tokio::spawn(async move {
                    let outcome = fetch_symbol(
                        source.as_ref(),
                        &symbol,
                        &period,
                        &interval,
                        max_attempts,
                        backoff_base,
                        &cancel,
                    )
                    .await;
                    (symbol, outcome)
                })
            })
            .collect();

        let mut report = FetchReport::default();
        for result in join_all(tasks).await {
            match result {
                Ok((symbol, SymbolOutcome::Succeeded(series))) => {
                    report.series.insert(symbol, series);
                }
                Ok((_, SymbolOutcome::Failed(failure))) => {
                    tracing::warn!(
                        symbol = %failure.symbol,
                        attempts = failure.attempts,
                        reason = %failure.reason,
                        "Giving up on symbol after exhausting retries."
                    );
                    report.failures.push(failure);
                }
                Err(e) => {
                    tracing::error!(error = ?e, "A per-symbol fetch task failed to complete.");
                }
            }
        }
        report
    }
}

/// One symbol's self-contained retry loop.
///
/// A successful attempt is one that returns a non-empty series; provider
/// errors and empty-but-successful responses are equally retryable. Backoff
/// (`base * 2^attempt`) is applied only between attempts — never after the
/// final attempt or after success.
async fn fetch_symbol(
    source: &dyn TimeSeriesSource,
    symbol: &str,
    period: &str,
    interval: &str,
    max_attempts: u32,
    backoff_base: Duration,
    cancel: &CancellationToken,
) -> SymbolOutcome {
    let mut reason = String::new();
    let mut attempts = 0;

    for attempt in 0..max_attempts {
        if cancel.is_cancelled() {
            reason = "fetch cancelled".to_string();
            break;
        }
        attempts = attempt + 1;

        match source.get_series(symbol, period, interval).await {
            Ok(series) if !series.is_empty() => return SymbolOutcome::Succeeded(series),
            Ok(_) => reason = "provider returned an empty series".to_string(),
            Err(e) => reason = e.to_string(),
        }
        tracing::warn!(symbol, attempt = attempts, reason = %reason, "Fetch attempt failed.");

        if attempt + 1 < max_attempts {
            let delay = backoff_base * 2u32.saturating_pow(attempt);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    reason = "fetch cancelled".to_string();
                    break;
                }
            }
        }
    }

    SymbolOutcome::Failed(FetchFailure {
        symbol: symbol.to_string(),
        attempts,
        reason,
    })
}
