use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// True for Saturday and Sunday; every other weekday is a working day.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Return the Monday that opens the week containing `date`.
///
/// Weekly hour buckets are keyed by this date.
///
/// # Example
///```
/// use chrono::NaiveDate;
/// use shared::time::week_start;
///
/// let thursday = NaiveDate::from_ymd_opt(2026, 7, 2).unwrap();
/// let monday = NaiveDate::from_ymd_opt(2026, 6, 29).unwrap();
/// assert_eq!(week_start(thursday), monday);
/// ```
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// All dates of a planning period: `7 * num_weeks` consecutive days starting
/// at `start`.
pub fn period_dates(start: NaiveDate, num_weeks: u32) -> Vec<NaiveDate> {
    (0..7 * num_weeks)
        .map(|offset| start + Duration::days(i64::from(offset)))
        .collect()
}
