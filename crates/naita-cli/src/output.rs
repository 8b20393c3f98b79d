//! Plain-text rendering of tables and stat cards.

use naita_core::aggregate::{display_percent, format_one_decimal};
use naita_core::export::Tabular;
use naita_core::utils::truncate;

/// Widest a table cell may get before it is truncated
const MAX_CELL_WIDTH: usize = 32;

pub fn heading(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count()));
}

pub fn section(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "-".repeat(title.chars().count()));
}

/// One labelled number, e.g. `Total Students      42`
pub fn stat(label: &str, value: impl std::fmt::Display) {
    println!("  {:<28} {}", label, value);
}

/// A count with its share of the total, e.g. `Trained   3 (25%)`
pub fn stat_share(label: &str, part: usize, percent: f64) {
    println!("  {:<28} {} ({}%)", label, part, display_percent(percent));
}

pub fn stat_average(label: &str, value: f64) {
    println!("  {:<28} {}", label, format_one_decimal(value));
}

pub fn empty_state(what: &str) {
    println!("  No {} found.", what);
}

/// Print rows under a header, padding columns to the widest cell
pub fn table(headers: &[&str], rows: &[Vec<String>]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate(c, MAX_CELL_WIDTH)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    println!("  {}", render_row(headers, &widths));
    println!(
        "  {}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        println!("  {}", render_row(&values, &widths));
    }
}

fn render_row(values: &[&str], widths: &[usize]) -> String {
    values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Horizontal bar chart for small groupings
pub fn bars(entries: &[(String, usize)]) {
    let max = entries.iter().map(|(_, n)| *n).max().unwrap_or(0);
    let label_width = entries.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (label, n) in entries {
        let len = if max == 0 { 0 } else { n * 30 / max };
        println!("  {:<width$}  {:>4} {}", label, n, "#".repeat(len), width = label_width);
    }
}

pub fn status(message: &str) {
    eprintln!("! {}", message);
}

/// Print records as a table, or the empty-state line when there are none
pub fn records<T: Tabular>(records: &[&T], what: &str) {
    if records.is_empty() {
        empty_state(what);
        return;
    }
    let rows: Vec<Vec<String>> = records.iter().map(|r| r.row()).collect();
    table(T::headers(), &rows);
}
