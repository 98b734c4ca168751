use crate::error::BacktestError;
use chrono::{Datelike, Months, NaiveDate};
use core_types::{ContributionPlan, Ledger, LedgerEntry, PriceSeries};
use rust_decimal::Decimal;

pub mod error;
pub mod resolver;

/// A stateless engine that simulates a dollar-cost-averaging strategy against
/// one reference price series.
///
/// Each call to [`DcaBacktester::run`] produces a fresh, immutable [`Ledger`];
/// the engine retains no state across calls and the output is fully determined
/// by the `(plan, reference, start_date)` triple.
#[derive(Debug, Default)]
pub struct DcaBacktester {}

impl DcaBacktester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the simulation: one contribution on the first day of each
    /// successive calendar month, starting at `start_date`'s month.
    ///
    /// Fails with `InvalidPlan` when the plan is empty or carries a
    /// non-positive amount (no partial ledger is produced), and with
    /// `InsufficientData` when the reference series is empty. Periods whose
    /// price cannot be resolved are skipped with a diagnostic; periods past
    /// the end of the series are clipped.
    pub fn run(
        &self,
        plan: &ContributionPlan,
        reference: &PriceSeries,
        start_date: NaiveDate,
    ) -> Result<Ledger, BacktestError> {
        // --- 1. VALIDATE INPUT ---
        if plan.is_empty() {
            return Err(BacktestError::InvalidPlan(
                "plan must contain at least one contribution".to_string(),
            ));
        }
        for (i, amount) in plan.amounts().iter().enumerate() {
            if *amount <= Decimal::ZERO {
                return Err(BacktestError::InvalidPlan(format!(
                    "contribution #{} must be positive, got {}",
                    i + 1,
                    amount
                )));
            }
        }
        let last_date = reference
            .last()
            .map(|p| p.date)
            .ok_or(BacktestError::InsufficientData)?;

        // A mid-month start anchors the first contribution to the 1st of that month.
        let month_anchor = start_date.with_day(1).unwrap_or(start_date);

        // --- 2. ACCUMULATE THE LEDGER ---
        let mut entries = Vec::with_capacity(plan.len());
        let mut cumulative_invested = Decimal::ZERO;
        let mut cumulative_shares = Decimal::ZERO;

        for (period, amount) in plan.amounts().iter().enumerate() {
            let Some(target) = month_anchor.checked_add_months(Months::new(period as u32)) else {
                break;
            };
            if target > last_date {
                // The reference series cannot support this period. This is a
                // data-availability accommodation, not an error.
                tracing::debug!(date = %target, "Reference series ends before this period; clipping the run.");
                break;
            }

            let price = match resolver::resolve(reference, target) {
                Some(price) if price > Decimal::ZERO => price,
                Some(price) => {
                    tracing::warn!(date = %target, price = %price, "Period skipped: resolved price is not positive.");
                    continue;
                }
                None => {
                    tracing::warn!(date = %target, "Period skipped: no price at or before this date.");
                    continue;
                }
            };

            // Mark holdings to the series' most recent close, re-read each
            // step ("value if sold today", not a historical valuation).
            let latest_close = reference
                .latest_close()
                .ok_or(BacktestError::InsufficientData)?;

            let shares_bought = amount / price;
            cumulative_shares += shares_bought;
            cumulative_invested += *amount;
            let portfolio_value = cumulative_shares * latest_close;

            entries.push(LedgerEntry {
                date: target,
                amount_contributed: *amount,
                price_at_purchase: price,
                shares_bought,
                cumulative_invested,
                cumulative_shares,
                portfolio_value,
                unrealized_gain: portfolio_value - cumulative_invested,
            });
        }

        Ok(Ledger::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PricePoint;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(points: &[(NaiveDate, Decimal)]) -> PriceSeries {
        PriceSeries::from_points(
            points
                .iter()
                .map(|&(date, close)| PricePoint { date, close })
                .collect(),
        )
        .unwrap()
    }

    fn three_month_reference() -> PriceSeries {
        series(&[
            (date(2024, 1, 1), dec!(10)),
            (date(2024, 2, 1), dec!(20)),
            (date(2024, 3, 1), dec!(10)),
        ])
    }

    #[test]
    fn three_month_scenario_matches_expected_ledger() {
        let plan = ContributionPlan::new(vec![dec!(100); 3]);
        let ledger = DcaBacktester::new()
            .run(&plan, &three_month_reference(), date(2024, 1, 1))
            .unwrap();

        let entries = ledger.entries();
        assert_eq!(entries.len(), 3);

        let shares: Vec<Decimal> = entries.iter().map(|e| e.shares_bought).collect();
        assert_eq!(shares, vec![dec!(10), dec!(5), dec!(10)]);

        let invested: Vec<Decimal> = entries.iter().map(|e| e.cumulative_invested).collect();
        assert_eq!(invested, vec![dec!(100), dec!(200), dec!(300)]);

        let cumulative: Vec<Decimal> = entries.iter().map(|e| e.cumulative_shares).collect();
        assert_eq!(cumulative, vec![dec!(10), dec!(15), dec!(25)]);

        // Every row is marked to the latest close (10).
        let last = ledger.last().unwrap();
        assert_eq!(last.portfolio_value, dec!(250));
        assert_eq!(last.unrealized_gain, dec!(-50));
    }

    #[test]
    fn non_positive_amount_fails_before_any_entry() {
        let engine = DcaBacktester::new();
        let reference = three_month_reference();

        let zero = ContributionPlan::new(vec![dec!(100), dec!(0)]);
        assert!(matches!(
            engine.run(&zero, &reference, date(2024, 1, 1)),
            Err(BacktestError::InvalidPlan(_))
        ));

        let negative = ContributionPlan::new(vec![dec!(-50)]);
        assert!(matches!(
            engine.run(&negative, &reference, date(2024, 1, 1)),
            Err(BacktestError::InvalidPlan(_))
        ));
    }

    #[test]
    fn empty_plan_is_invalid() {
        let result = DcaBacktester::new().run(
            &ContributionPlan::new(vec![]),
            &three_month_reference(),
            date(2024, 1, 1),
        );

        assert!(matches!(result, Err(BacktestError::InvalidPlan(_))));
    }

    #[test]
    fn empty_reference_is_insufficient_data() {
        let result = DcaBacktester::new().run(
            &ContributionPlan::new(vec![dec!(100)]),
            &PriceSeries::empty(),
            date(2024, 1, 1),
        );

        assert!(matches!(result, Err(BacktestError::InsufficientData)));
    }

    #[test]
    fn identical_inputs_produce_identical_ledgers() {
        let plan = ContributionPlan::new(vec![dec!(250), dec!(125.50), dec!(300)]);
        let reference = three_month_reference();
        let engine = DcaBacktester::new();

        let first = engine.run(&plan, &reference, date(2024, 1, 1)).unwrap();
        let second = engine.run(&plan, &reference, date(2024, 1, 1)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn cumulative_columns_never_decrease() {
        let plan = ContributionPlan::new(vec![dec!(250), dec!(10), dec!(990.25)]);
        let ledger = DcaBacktester::new()
            .run(&plan, &three_month_reference(), date(2024, 1, 1))
            .unwrap();

        let entries = ledger.entries();
        for window in entries.windows(2) {
            assert!(window[1].cumulative_invested >= window[0].cumulative_invested);
            assert!(window[1].cumulative_shares >= window[0].cumulative_shares);
        }
        assert_eq!(
            ledger.last().unwrap().cumulative_invested,
            dec!(250) + dec!(10) + dec!(990.25)
        );
    }

    #[test]
    fn plan_longer_than_series_is_clipped() {
        let plan = ContributionPlan::new(vec![dec!(100); 6]);
        let ledger = DcaBacktester::new()
            .run(&plan, &three_month_reference(), date(2024, 1, 1))
            .unwrap();

        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn periods_before_the_first_observation_are_skipped() {
        let reference = series(&[
            (date(2024, 3, 10), dec!(50)),
            (date(2024, 4, 20), dec!(55)),
        ]);
        let plan = ContributionPlan::new(vec![dec!(100); 4]);

        let ledger = DcaBacktester::new()
            .run(&plan, &reference, date(2024, 1, 1))
            .unwrap();

        // January through March resolve to nothing; April buys at the
        // as-of price from March 10.
        assert_eq!(ledger.len(), 1);
        let entry = &ledger.entries()[0];
        assert_eq!(entry.date, date(2024, 4, 1));
        assert_eq!(entry.price_at_purchase, dec!(50));
    }

    #[test]
    fn mid_month_start_is_anchored_to_the_first() {
        let plan = ContributionPlan::new(vec![dec!(100)]);
        let ledger = DcaBacktester::new()
            .run(&plan, &three_month_reference(), date(2024, 1, 15))
            .unwrap();

        assert_eq!(ledger.entries()[0].date, date(2024, 1, 1));
    }

    #[test]
    fn purchase_uses_as_of_price_between_observations() {
        let reference = series(&[
            (date(2024, 1, 15), dec!(40)),
            (date(2024, 3, 15), dec!(80)),
        ]);
        let plan = ContributionPlan::new(vec![dec!(100); 2]);

        let ledger = DcaBacktester::new()
            .run(&plan, &reference, date(2024, 2, 1))
            .unwrap();

        // Feb 1 and Mar 1 both resolve to the Jan 15 close.
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[0].price_at_purchase, dec!(40));
        assert_eq!(ledger.entries()[1].price_at_purchase, dec!(40));
    }
}
