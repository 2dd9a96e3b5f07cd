//! Error kinds raised by the pipeline stages.
//!
//! Each stage converts its library failure into one of these variants at the
//! point where it happens; the session reports it and returns to the menu.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Parse(#[from] csv::Error),
    #[error("cannot open database '{target}': {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("cannot create table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("insert into '{table}' failed after {submitted} row(s): {source}")]
    Insert {
        table: String,
        submitted: usize,
        #[source]
        source: rusqlite::Error,
    },
    #[error("cannot compute statistics: {0}")]
    Statistics(String),
}

impl EtlError {
    /// Short label used as the `kind` field in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::Network(_) | EtlError::InvalidUrl { .. } => "network",
            EtlError::Io { .. } => "io",
            EtlError::Parse(_) => "parse",
            EtlError::Connection { .. } => "connection",
            EtlError::Schema { .. } => "schema",
            EtlError::Insert { .. } => "insert",
            EtlError::Statistics(_) => "statistics",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
