use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};

/// Case-insensitive substring test. `query` must already be lowercased.
pub fn contains_ignore_case(haystack: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(query)
}

/// Compare two strings ignoring case, without allocating
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp like "Mar 15, 2024"; "N/A" when missing
pub fn format_datetime(dt: Option<&DateTime<Utc>>) -> String {
    dt.map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_date(date: Option<&NaiveDate>) -> String {
    date.map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Lowercase, dash-separated form of a title for file names
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}
