use chrono::NaiveDate;
use core_types::PriceSeries;
use rust_decimal::Decimal;

/// Resolves the effective price for an arbitrary date with "as-of" semantics:
/// the most recent point whose date is at or before the requested one.
///
/// Returns `None` when the series is empty or every observation is later than
/// the requested date. The resolver only reports presence or absence; it never
/// validates the magnitude of the resolved price.
pub fn resolve(series: &PriceSeries, on_or_before: NaiveDate) -> Option<Decimal> {
    let points = series.points();
    // The series is sorted by date, so a binary search finds the boundary.
    let idx = points.partition_point(|p| p.date <= on_or_before);
    if idx == 0 {
        None
    } else {
        Some(points[idx - 1].close)
    }
}
