//! Aggregation primitives for stat cards and charts.
//!
//! Everything here is computed in full precision; rounding happens only in
//! the `display_*`/`format_*` helpers used at presentation time.

pub mod report;
pub mod stats;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

pub use report::{
    enrollment_trend, CenterPerformance, CourseCompletion, DistrictReport, EnrollmentBreakdown,
    MonthlyEnrollment, PerformanceTier, RecentActivity, ReportPeriod, ReportScope,
};
pub use stats::{
    latest_students, ApprovalStats, AttendanceStats, CourseStats, StudentStats, Summary,
};

/// Group label for records with no value for the grouping key
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Trailing window used for "recent" counts and lists
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Number of groups shown in "top" charts such as students by district
pub const TOP_GROUPS: usize = 5;

pub fn count<'a, T, I, P>(records: I, mut predicate: P) -> usize
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    P: FnMut(&T) -> bool,
{
    records.into_iter().filter(|r| predicate(*r)).count()
}

/// `part / total * 100`, or 0 when there is nothing to divide by
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// `sum / total`, or 0 when there is nothing to divide by
pub fn average(sum: f64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        sum / total as f64
    }
}

/// Round a percentage to a whole number, halves rounding up
pub fn display_percent(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn format_one_decimal(value: f64) -> String {
    format!("{:.1}", value)
}

/// Percentage label with one decimal, e.g. "12.5%"
pub fn format_percent_one_decimal(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Round to one decimal place for values stored in report payloads
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Count records per key. Records without a key are counted under [`UNKNOWN_GROUP`].
pub fn group_by<'a, T, I, K>(records: I, mut key: K) -> BTreeMap<String, usize>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    K: FnMut(&T) -> Option<String>,
{
    let mut groups = BTreeMap::new();
    for record in records {
        let label = key(record)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string());
        *groups.entry(label).or_insert(0) += 1;
    }
    groups
}

/// Largest groups first; ties broken alphabetically
pub fn top_n(groups: &BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = groups
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

/// True when `timestamp` lies in `(now - window, now]`
pub fn within_window(timestamp: Option<&DateTime<Utc>>, window: Duration, now: DateTime<Utc>) -> bool {
    match timestamp {
        Some(ts) => *ts > now - window && *ts <= now,
        None => false,
    }
}

/// Records whose timestamp falls inside the trailing window
pub fn recent<'a, T, I, F>(records: I, mut timestamp: F, window: Duration, now: DateTime<Utc>) -> Vec<&'a T>
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    F: FnMut(&T) -> Option<DateTime<Utc>>,
{
    records
        .into_iter()
        .filter(|r| within_window(timestamp(*r).as_ref(), window, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_laws() {
        let values = vec![1, 2, 3, 4];
        assert_eq!(count(&values, |_| true), values.len());
        assert_eq!(count(&values, |v| v % 2 == 0), 2);
        let empty: Vec<i32> = Vec::new();
        assert_eq!(count(&empty, |_| true), 0);
    }

    #[test]
    fn test_percentage_guards_division_by_zero() {
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert!((percentage(1, 3) - 33.333_333).abs() < 0.001);
    }

    #[test]
    fn test_display_percent_rounds_halves_up() {
        assert_eq!(display_percent(percentage(1, 3)), 33);
        assert_eq!(display_percent(percentage(2, 3)), 67);
        assert_eq!(display_percent(12.5), 13);
        assert_eq!(display_percent(0.0), 0);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(10.0, 0), 0.0);
        assert_eq!(format_one_decimal(average(7.0, 2)), "3.5");
        assert_eq!(format_one_decimal(average(0.0, 0)), "0.0");
        assert_eq!(round_one_decimal(66.666), 66.7);
        assert_eq!(format_percent_one_decimal(percentage(1, 8)), "12.5%");
    }

    #[test]
    fn test_group_counts_sum_to_total() {
        let districts = vec![
            Some("Colombo"),
            Some("Galle"),
            Some("Colombo"),
            None,
            Some("  "),
        ];
        let groups = group_by(&districts, |d| d.map(|s| s.to_string()));
        assert_eq!(groups.values().sum::<usize>(), districts.len());
        assert_eq!(groups.get("Colombo"), Some(&2));
        assert_eq!(groups.get(UNKNOWN_GROUP), Some(&2));
    }

    #[test]
    fn test_top_n_orders_by_count_then_name() {
        let mut groups = BTreeMap::new();
        groups.insert("Kandy".to_string(), 3);
        groups.insert("Colombo".to_string(), 5);
        groups.insert("Galle".to_string(), 3);
        groups.insert("Matara".to_string(), 1);

        let top = top_n(&groups, 3);
        assert_eq!(
            top,
            vec![
                ("Colombo".to_string(), 5),
                ("Galle".to_string(), 3),
                ("Kandy".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_recency_window() {
        let now = Utc::now();
        let window = Duration::days(RECENT_WINDOW_DAYS);
        let two_days = now - Duration::days(2);
        let ten_days = now - Duration::days(10);
        let tomorrow = now + Duration::days(1);

        assert!(within_window(Some(&two_days), window, now));
        assert!(within_window(Some(&now), window, now));
        assert!(!within_window(Some(&ten_days), window, now));
        assert!(!within_window(Some(&(now - window)), window, now));
        assert!(!within_window(Some(&tomorrow), window, now));
        assert!(!within_window(None, window, now));

        let stamps = vec![Some(two_days), Some(ten_days), None];
        let recent_items = recent(&stamps, |s| *s, window, now);
        assert_eq!(recent_items.len(), 1);
    }
}
