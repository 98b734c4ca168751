use core_types::{Alert, AlertDirection, AlertTargets};
use rust_decimal::Decimal;

/// A stateless evaluator that compares the latest observed prices against
/// caller-supplied target prices and produces one alert per crossing.
///
/// `latest_prices` is an ordered slice rather than a map so the output order
/// is the caller's order, keeping alert sequences deterministic across runs.
#[derive(Debug, Default)]
pub struct AlertEvaluator {}

impl AlertEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Above` when the observed price is strictly greater than the
    /// target and `Below` when strictly lower; equality emits nothing.
    /// Symbols present on only one side are silently skipped.
    pub fn evaluate(
        &self,
        latest_prices: &[(String, Decimal)],
        targets: &AlertTargets,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for (symbol, observed) in latest_prices {
            let Some(target) = targets.get(symbol) else {
                continue;
            };

            let direction = if observed > target {
                AlertDirection::Above
            } else if observed < target {
                AlertDirection::Below
            } else {
                continue;
            };

            alerts.push(Alert {
                symbol: symbol.clone(),
                direction,
                target: *target,
                observed: *observed,
            });
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn targets(pairs: &[(&str, Decimal)]) -> AlertTargets {
        pairs
            .iter()
            .map(|(s, p)| (s.to_string(), *p))
            .collect()
    }

    #[test]
    fn price_above_target_emits_above() {
        let alerts = AlertEvaluator::new().evaluate(
            &[("X".to_string(), dec!(105))],
            &targets(&[("X", dec!(100))]),
        );

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "X");
        assert_eq!(alerts[0].direction, AlertDirection::Above);
        assert_eq!(alerts[0].target, dec!(100));
        assert_eq!(alerts[0].observed, dec!(105));
    }

    #[test]
    fn price_below_target_emits_below() {
        let alerts = AlertEvaluator::new().evaluate(
            &[("X".to_string(), dec!(95))],
            &targets(&[("X", dec!(100))]),
        );

        assert_eq!(alerts[0].direction, AlertDirection::Below);
    }

    #[test]
    fn equality_emits_nothing() {
        let alerts = AlertEvaluator::new().evaluate(
            &[("X".to_string(), dec!(100))],
            &targets(&[("X", dec!(100))]),
        );

        assert!(alerts.is_empty());
    }

    #[test]
    fn symbols_missing_on_either_side_are_skipped() {
        // A target without an observation produces nothing.
        let alerts = AlertEvaluator::new().evaluate(
            &[("X".to_string(), dec!(105))],
            &targets(&[("Y", dec!(50))]),
        );
        assert!(alerts.is_empty());

        // An observation without a target produces nothing either.
        let alerts = AlertEvaluator::new().evaluate(
            &[("X".to_string(), dec!(105)), ("Z".to_string(), dec!(10))],
            &targets(&[("X", dec!(100))]),
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "X");
    }

    #[test]
    fn output_follows_caller_order() {
        let prices = vec![
            ("B".to_string(), dec!(10)),
            ("A".to_string(), dec!(10)),
            ("C".to_string(), dec!(10)),
        ];
        let alerts = AlertEvaluator::new().evaluate(
            &prices,
            &targets(&[("A", dec!(5)), ("B", dec!(5)), ("C", dec!(5))]),
        );

        let order: Vec<&str> = alerts.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }
}
