//! Plain-text rendering of extracted tables for the console.

use std::fmt::Write;

use crate::materialize::{HEADING_COLUMN, TableMap, TableRecords};

const MAX_VALUE_CHARS: usize = 30;

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }
    let mut short = value.chars().take(MAX_VALUE_CHARS - 3).collect::<String>();
    short.push_str("...");
    short
}

/// Renders rows as `| a | b |` lines with columns padded to a common width.
#[must_use]
pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0_usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |row: &[String]| {
        let cells = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let cell = row.get(index).map_or("", String::as_str);
                format!("{cell:<width$}")
            })
            .collect::<Vec<_>>();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
    };

    push_row(headers);
    if !headers.is_empty() {
        let rule = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>();
        push_row(&rule);
    }
    for row in rows {
        push_row(row);
    }
    out
}

/// A table's records preceded by its key and heading.
#[must_use]
pub fn render_table(records: &TableRecords) -> String {
    let mut out = format!("--- Table {} ({} rows) ---\n", records.key, records.len());
    if !records.heading.is_empty() {
        let _ = writeln!(out, "{}", records.heading);
    }
    out.push_str(&render_grid(&records.headers, &records.rows));
    out
}

fn first_record(records: &TableRecords) -> String {
    records
        .record(0)
        .map(|pairs| {
            pairs
                .into_iter()
                .filter(|(column, _)| *column != HEADING_COLUMN)
                .map(|(column, value)| format!("{column}: {}", truncate(value)))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

/// One line per table: name, heading, record count and first record.
#[must_use]
pub fn render_summary(tables: &TableMap) -> String {
    if tables.is_empty() {
        return "No tables extracted.\n".to_string();
    }

    let headers = ["Table Name", "Heading", "Rows", "First Record"]
        .map(String::from)
        .to_vec();
    let rows = tables
        .iter()
        .map(|records| {
            vec![
                records.key.clone(),
                truncate(&records.heading),
                records.len().to_string(),
                first_record(records),
            ]
        })
        .collect::<Vec<_>>();

    let mut out = format!("Extracted {} table(s)\n", tables.len());
    out.push_str(&render_grid(&headers, &rows));
    out
}
