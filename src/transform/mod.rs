//! Cleaning and reshaping operations over a loaded record table.
//!
//! Every operation borrows its input and returns a fresh table; whether the
//! result replaces the session's table is decided by the caller.

pub mod aggregate;
pub mod outliers;
pub mod utility;

pub use aggregate::aggregate_by_country;
pub use outliers::{Band, death_rate_band, remove_outliers};

use crate::record::Record;

/// Year retained by [`filter_year`] in the interactive menu.
pub const TARGET_YEAR: i64 = 2020;

/// Removes every row with at least one missing cell.
pub fn drop_nulls(rows: &[Record]) -> Vec<Record> {
    rows.iter().filter(|r| r.is_complete()).cloned().collect()
}

/// Keeps only rows recorded for `year`.
pub fn filter_year(rows: &[Record], year: i64) -> Vec<Record> {
    rows.iter()
        .filter(|r| r.year == Some(year))
        .cloned()
        .collect()
}

/// Lower-cases and trims `Age_Group`; all other cells are left alone.
pub fn normalize_age_group(rows: &[Record]) -> Vec<Record> {
    rows.iter()
        .map(|r| Record {
            age_group: r.age_group.as_deref().map(|g| g.trim().to_lowercase()),
            ..r.clone()
        })
        .collect()
}
