//! Rounding and date helpers shared by the engines.
//!
//! Percentages are whole numbers rounded half-up, which is what learners see
//! in progress bars and what the snapshot tests compare against.

use chrono::{Months, NaiveDate};

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let value = (part as f64 / whole as f64 * 100.0).round();
    value.clamp(0.0, 100.0) as u8
}

/// Rounded arithmetic mean of percentage values, 0 for an empty input.
pub fn mean_percent(values: impl IntoIterator<Item = u8>) -> u8 {
    let (sum, count) = values
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), v| (sum + v as u64, count + 1));
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u8
}

/// Calendar addition of whole months.
///
/// Days past the end of the target month clamp to its last day
/// (2024-01-31 + 1 month = 2024-02-29).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
