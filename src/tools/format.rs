//! Output formatting for result sets.
//!
//! Results print as an ASCII table (like the MySQL CLI), a Markdown table or
//! JSON records. Column widths account for wide Unicode characters.

use crate::models::ResultSet;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::Write as _;
use unicode_width::UnicodeWidthStr;

/// Output format for result sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table format (like MySQL CLI)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// JSON array of records
    Json,
}

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// Render a result set in the requested format.
pub fn format_result_set(result: &ResultSet, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_as_table(result),
        OutputFormat::Markdown => format_as_markdown(result),
        OutputFormat::Json => format_as_json(result),
    }
}

pub const NO_RECORDS: &str = "No records found";

/// Text printed for a query result. An empty result is a notice, except in
/// JSON where it stays an empty array.
pub fn render_result(result: &ResultSet, format: OutputFormat) -> String {
    if result.is_empty() && format != OutputFormat::Json {
        return NO_RECORDS.to_string();
    }
    format_result_set(result, format)
}

/// Rows as JSON objects keyed by column name.
///
/// Duplicate column names keep the last value, as in a plain JSON object.
pub fn to_records(result: &ResultSet) -> Vec<serde_json::Map<String, JsonValue>> {
    result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()
        })
        .collect()
}

pub fn format_as_json(result: &ResultSet) -> String {
    serde_json::to_string_pretty(&to_records(result)).unwrap_or_default()
}

pub fn format_as_table(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "Empty set".to_string();
    }

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.width()).collect();
    for row in &result.rows {
        for (i, value) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(format_value(value).width());
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    for (name, w) in result.columns.iter().zip(&widths) {
        output.push_str(&format!("| {} ", pad_center(name, *w)));
    }
    output.push_str("|\n");
    output.push_str(&separator);

    for row in &result.rows {
        for (i, w) in widths.iter().enumerate() {
            let value = row.get(i).unwrap_or(&JsonValue::Null);
            let formatted = format_value(value);
            let cell = if matches!(value, JsonValue::Number(_)) {
                pad_left(&formatted, *w)
            } else {
                pad_right(&formatted, *w)
            };
            output.push_str(&format!("| {cell} "));
        }
        output.push_str("|\n");
    }

    output.push_str(&separator);

    let row_count = result.row_count();
    let row_text = if row_count == 1 { "row" } else { "rows" };
    let _ = writeln!(output, "{row_count} {row_text} in set");

    output
}

pub fn format_as_markdown(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();

    let header: String = result
        .columns
        .iter()
        .map(|c| format!("| {} ", escape_markdown(c)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = result.columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in &result.rows {
        let row_str: String = (0..result.columns.len())
            .map(|i| {
                let value = row.get(i).unwrap_or(&JsonValue::Null);
                format!("| {} ", escape_markdown(&format_value(value)))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    let row_count = result.row_count();
    let row_text = if row_count == 1 { "row" } else { "rows" };
    let _ = write!(output, "\n*{row_count} {row_text}*");

    output
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

// std's `{:<w$}` pads by char count, which misaligns wide characters.
fn pad_right(text: &str, width: usize) -> String {
    format!("{text}{}", " ".repeat(width.saturating_sub(text.width())))
}

fn pad_left(text: &str, width: usize) -> String {
    format!("{}{text}", " ".repeat(width.saturating_sub(text.width())))
}

fn pad_center(text: &str, width: usize) -> String {
    let total = width.saturating_sub(text.width());
    let left = total / 2;
    format!("{}{text}{}", " ".repeat(left), " ".repeat(total - left))
}
