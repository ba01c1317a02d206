//! Output rendering: aligned tables, JSON arrays, and CSV, selected by
//! `--format`/`--json`, modeled on the teacher's `output` module but kept
//! to the three formats spec.md §6 names.

use colored::Colorize;
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cli::Format;

/// A row-oriented table: ordered column headers plus string cells, built by
/// each command before handing off to [`render`].
#[derive(Debug, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Renders `table` as aligned text to stdout.
pub fn render_table(table: &Table) {
    if table.rows.is_empty() {
        println!("(no results)");
        return;
    }

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.width()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }

    let header_line: Vec<String> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i]))
        .collect();
    println!("{}", header_line.join("  ").bold());

    for row in &table.rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths.get(i).copied().unwrap_or(0)))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn pad(s: &str, width: usize) -> String {
    let extra = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(extra))
}

/// Renders `rows` as a single JSON array to stdout.
///
/// # Errors
///
/// Returns an error if any row fails to serialize.
pub fn render_json<T: Serialize>(rows: &[T]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

/// Renders `table` as CSV to stdout, quoting any cell containing a comma,
/// quote, or newline.
pub fn render_csv(table: &Table) {
    println!("{}", table.headers.iter().map(|h| csv_field(h)).collect::<Vec<_>>().join(","));
    for row in &table.rows {
        println!("{}", row.iter().map(|c| csv_field(c)).collect::<Vec<_>>().join(","));
    }
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Dispatches to the format the caller resolved from `--format`/`--json`.
/// `json_rows` is used for [`Format::Json`]; `table` for the other two.
pub fn render<T: Serialize>(format: Format, table: &Table, json_rows: &[T]) -> anyhow::Result<()> {
    match format {
        Format::Table => render_table(table),
        Format::Json => render_json(json_rows)?,
        Format::Csv => render_csv(table),
    }
    Ok(())
}

/// Resolves the effective format: `--json` wins over an explicit `--format`,
/// which wins over the config's `display.format`, which wins over the
/// built-in default.
#[must_use]
pub fn resolve_format(
    json_flag: bool,
    explicit: Option<Format>,
    config_default: dox_core::config::DisplayFormat,
) -> Format {
    if json_flag {
        return Format::Json;
    }
    if let Some(f) = explicit {
        return f;
    }
    match config_default {
        dox_core::config::DisplayFormat::Table => Format::Table,
        dox_core::config::DisplayFormat::Json => Format::Json,
        dox_core::config::DisplayFormat::Csv => Format::Csv,
    }
}

/// Truncates `s` to at most `width` display columns, appending an ellipsis
/// when truncated.
#[must_use]
pub fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut total = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if total + w > width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        total += w;
    }
    out.push('…');
    out
}
