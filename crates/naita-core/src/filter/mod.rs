//! Filter engine for dashboard tables.
//!
//! A view is filtered by a [`Criteria`]: zero or more free-text queries and
//! zero or more exact-match dropdown selections. A record is kept when every
//! query matches at least one of its searchable fields and every dropdown
//! selection equals the record's value for that field. Each entity type
//! describes its fields once through [`Filterable`].

pub mod fields;
pub mod sort;

use std::borrow::Cow;
use std::collections::BTreeSet;

pub use fields::{ApprovalField, AttendanceField, CenterField, CourseField, StudentField};
pub use sort::{sort_approvals, sort_courses, sort_students};

/// A column that can back a dropdown filter
pub trait FilterField: Copy + Eq + std::fmt::Debug + 'static {
    /// Dropdown label meaning "no constraint", e.g. "All Districts"
    fn sentinel(&self) -> &'static str;
}

/// A record type with a field table for search and dropdown filters
pub trait Filterable {
    type Field: FilterField;

    /// Fields checked by the free-text search
    const SEARCH_FIELDS: &'static [Self::Field];

    /// Display value of a field, `None` when the record has no value
    fn field_value(&self, field: Self::Field) -> Option<Cow<'_, str>>;
}

/// Current choice of one dropdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Any,
    Is(String),
}

impl Selection {
    /// Interpret a dropdown choice; the sentinel or an empty choice means `Any`
    pub fn from_choice(choice: &str, sentinel: &str) -> Self {
        let choice = choice.trim();
        if choice.is_empty() || choice == sentinel {
            Selection::Any
        } else {
            Selection::Is(choice.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactFilter<F> {
    pub field: F,
    pub selection: Selection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria<F> {
    queries: Vec<String>,
    exact: Vec<ExactFilter<F>>,
}

impl<F> Default for Criteria<F> {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            exact: Vec::new(),
        }
    }
}

impl<F: FilterField> Criteria<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free-text query. Blank queries are ignored.
    pub fn search(mut self, query: &str) -> Self {
        let query = query.trim();
        if !query.is_empty() {
            self.queries.push(query.to_lowercase());
        }
        self
    }

    /// Add a dropdown selection, interpreting the field's sentinel as "any"
    pub fn select(mut self, field: F, choice: &str) -> Self {
        let selection = Selection::from_choice(choice, field.sentinel());
        if selection != Selection::Any {
            self.exact.push(ExactFilter { field, selection });
        }
        self
    }

    /// Same as `select` for optional CLI flags
    pub fn select_opt(self, field: F, choice: Option<&str>) -> Self {
        match choice {
            Some(choice) => self.select(field, choice),
            None => self,
        }
    }

    /// Conjunction of two criteria
    pub fn and(mut self, other: Self) -> Self {
        self.queries.extend(other.queries);
        self.exact.extend(other.exact);
        self
    }

    /// True when the criteria impose no constraint
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty() && self.exact.is_empty()
    }

    pub fn matches<R>(&self, record: &R) -> bool
    where
        R: Filterable<Field = F>,
    {
        self.queries.iter().all(|q| matches_search(record, q))
            && self.exact.iter().all(|f| matches_exact(record, f))
    }
}

/// Query must already be lowercased
fn matches_search<R: Filterable>(record: &R, query: &str) -> bool {
    R::SEARCH_FIELDS.iter().any(|&field| {
        record
            .field_value(field)
            .map(|value| value.to_lowercase().contains(query))
            .unwrap_or(false)
    })
}

fn matches_exact<R: Filterable>(record: &R, filter: &ExactFilter<R::Field>) -> bool {
    match &filter.selection {
        Selection::Any => true,
        Selection::Is(expected) => record
            .field_value(filter.field)
            .map(|value| value.as_ref() == expected.as_str())
            .unwrap_or(false),
    }
}

/// Records matching all criteria, in their original order
pub fn apply<'a, R, I>(records: I, criteria: &Criteria<R::Field>) -> Vec<&'a R>
where
    R: Filterable + 'a,
    I: IntoIterator<Item = &'a R>,
{
    if criteria.is_empty() {
        return records.into_iter().collect();
    }
    records
        .into_iter()
        .filter(|r| criteria.matches(*r))
        .collect()
}

/// Dropdown options for a field: the sentinel, then distinct non-empty values sorted
pub fn dropdown_options<'a, R, I>(records: I, field: R::Field) -> Vec<String>
where
    R: Filterable + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let values: BTreeSet<String> = records
        .into_iter()
        .filter_map(|r| r.field_value(field))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();

    std::iter::once(field.sentinel().to_string())
        .chain(values)
        .collect()
}
