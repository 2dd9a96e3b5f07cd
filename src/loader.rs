//! Parses the downloaded CSV into a [`RecordTable`].

use std::fs::File;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::record::{COLUMNS, Record, RecordTable};

/// Reads every row of the CSV at `path`.
///
/// # Errors
///
/// Returns [`EtlError::Io`] if the file cannot be opened and
/// [`EtlError::Parse`] on the first malformed row.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load(path: impl AsRef<Path>) -> Result<RecordTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| EtlError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);
    debug!(headers = ?rdr.headers()?, "CSV headers");

    let rows = rdr
        .deserialize::<Record>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    info!(rows = rows.len(), "CSV parsed");
    Ok(rows)
}

/// Shape and per-column fill of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub dtype: &'static str,
    pub non_null: usize,
}

/// Builds the column report shown after a load.
pub fn summarize(rows: &[Record]) -> TableSummary {
    let mut non_null = [0usize; 12];
    for r in rows {
        let present = [
            r.region_code.is_some(),
            r.region_name.is_some(),
            r.country_code.is_some(),
            r.country_name.is_some(),
            r.year.is_some(),
            r.sex.is_some(),
            r.age_group_code.is_some(),
            r.age_group.is_some(),
            r.number.is_some(),
            r.percentage_of_deaths.is_some(),
            r.age_standardized_rate.is_some(),
            r.death_rate.is_some(),
        ];
        for (count, p) in non_null.iter_mut().zip(present) {
            *count += usize::from(p);
        }
    }

    let dtypes = [
        "str", "str", "str", "str", "i64", "str", "str", "str", "i64", "f64", "f64", "f64",
    ];

    TableSummary {
        rows: rows.len(),
        columns: COLUMNS
            .iter()
            .zip(dtypes)
            .zip(non_null)
            .map(|((&name, dtype), non_null)| ColumnSummary {
                name,
                dtype,
                non_null,
            })
            .collect(),
    }
}
