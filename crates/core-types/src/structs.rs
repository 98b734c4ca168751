use crate::enums::AlertDirection;
use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single daily observation of an instrument's closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// A chronologically ordered closing-price history for one symbol.
///
/// A series is validated at construction (strictly increasing dates, positive
/// closes) and is read-only afterwards. An *empty* series is a legitimate,
/// representable state — consumers must treat it as "no data", not as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Creates an empty series (no observations for the symbol).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a series from already-ordered points, enforcing the invariants:
    /// dates strictly increasing, every close strictly positive.
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, CoreError> {
        for window in points.windows(2) {
            if window[1].date <= window[0].date {
                return Err(CoreError::InvalidInput(
                    "PriceSeries".to_string(),
                    format!(
                        "dates must be strictly increasing, found {} after {}",
                        window[1].date, window[0].date
                    ),
                ));
            }
        }
        if let Some(point) = points.iter().find(|p| p.close <= Decimal::ZERO) {
            return Err(CoreError::InvalidInput(
                "PriceSeries".to_string(),
                format!("close on {} must be positive, got {}", point.date, point.close),
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// The most recent close in the series, if any.
    pub fn latest_close(&self) -> Option<Decimal> {
        self.points.last().map(|p| p.close)
    }
}

/// An ordered sequence of periodic (monthly) contribution amounts.
///
/// The plan itself is a plain value; positivity of every amount is enforced by
/// the backtest engine before any ledger entry is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPlan {
    amounts: Vec<Decimal>,
}

impl ContributionPlan {
    pub fn new(amounts: Vec<Decimal>) -> Self {
        Self { amounts }
    }

    pub fn amounts(&self) -> &[Decimal] {
        &self.amounts
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// One simulated purchase with its running totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub amount_contributed: Decimal,
    pub price_at_purchase: Decimal,
    pub shares_bought: Decimal,
    pub cumulative_invested: Decimal,
    pub cumulative_shares: Decimal,
    /// Holdings marked to the series' latest close ("value if sold today"),
    /// not to the price on `date`.
    pub portfolio_value: Decimal,
    pub unrealized_gain: Decimal,
}

/// The chronological record of one backtest run. Immutable once returned;
/// every run allocates a fresh ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }
}

/// Caller-supplied mapping of symbol to target price.
pub type AlertTargets = HashMap<String, Decimal>;

/// A threshold crossing between an observed price and its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    pub direction: AlertDirection,
    pub target: Decimal,
    pub observed: Decimal,
}

/// The terminal record for a symbol whose fetch exhausted its retry budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub symbol: String,
    /// Number of attempts actually made before giving up.
    pub attempts: u32,
    pub reason: String,
}
