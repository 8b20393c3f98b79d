//! Field-level validation for form input.

use std::collections::BTreeMap;

use thiserror::Error;

/// Field name to message map, reported inline next to each form field
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("Validation failed: {}", summary(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

fn summary(fields: &BTreeMap<&'static str, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Record an error for a field. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Mobile numbers: optional `+`, optional leading `1`, then 9 to 15 digits.
pub fn is_valid_mobile(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let len = digits.len();
    (9..=15).contains(&len) || (digits.starts_with('1') && (10..=16).contains(&len))
}

/// Sri Lankan NIC: old format `#########V` / `#########X`, new format 12 digits.
pub fn is_valid_nic(s: &str) -> bool {
    let s = s.trim();
    if !s.is_ascii() {
        return false;
    }
    match s.len() {
        10 => {
            let (digits, suffix) = s.split_at(9);
            digits.chars().all(|c| c.is_ascii_digit())
                && matches!(suffix, "V" | "v" | "X" | "x")
        }
        12 => s.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

pub fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !s.chars().any(char::is_whitespace)
}
