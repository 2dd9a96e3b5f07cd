//! Console rendering of tables and load diagnostics.
//!
//! Supports a row preview, a per-column summary, the aggregated totals
//! listing, and a JSON form of the summary for the log file.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::loader::TableSummary;
use crate::record::{COLUMNS, CountryTotal, Record};

/// Rows shown by the post-load preview.
pub const PREVIEW_ROWS: usize = 5;

/// Writes the header and the first `limit` rows as a `|`-separated grid.
pub fn write_preview<W: Write>(out: &mut W, rows: &[Record], limit: usize) -> io::Result<()> {
    let shown: Vec<[String; 12]> = rows.iter().take(limit).map(Record::cells).collect();

    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.len()).collect();
    for cells in &shown {
        for (w, cell) in widths.iter_mut().zip(cells) {
            *w = (*w).max(cell.len());
        }
    }

    writeln!(out, "{}", pad_row(COLUMNS.iter().copied(), &widths))?;
    for cells in &shown {
        writeln!(out, "{}", pad_row(cells.iter().map(String::as_str), &widths))?;
    }
    if rows.len() > limit {
        writeln!(out, "... {} more row(s)", rows.len() - limit)?;
    }
    Ok(())
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Writes the shape and the name/type/non-null table of a loaded dataset.
pub fn write_summary<W: Write>(out: &mut W, summary: &TableSummary) -> io::Result<()> {
    writeln!(
        out,
        "{} rows x {} columns",
        summary.rows,
        summary.columns.len()
    )?;
    let width = summary
        .columns
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    writeln!(out, " #  {:<width$}  {:>9}  Dtype", "Column", "Non-Null")?;
    for (i, col) in summary.columns.iter().enumerate() {
        writeln!(
            out,
            "{i:>2}  {:<width$}  {:>9}  {}",
            col.name, col.non_null, col.dtype
        )?;
    }
    Ok(())
}

/// Writes the per-country totals, one `name  total` line each.
pub fn write_totals<W: Write>(out: &mut W, totals: &[CountryTotal]) -> io::Result<()> {
    let width = totals
        .iter()
        .map(|t| t.country_name.len())
        .max()
        .unwrap_or(0)
        .max("Country_Name".len());
    writeln!(out, "{:<width$}  Total_Deaths", "Country_Name")?;
    for t in totals {
        writeln!(out, "{:<width$}  {}", t.country_name, t.total_deaths)?;
    }
    Ok(())
}

/// Logs the summary as JSON at debug level.
pub fn log_summary_json(summary: &TableSummary) {
    match serde_json::to_string(summary) {
        Ok(json) => debug!(summary = %json, "Table summary"),
        Err(e) => warn!(error = %e, "Could not serialize table summary"),
    }
}
