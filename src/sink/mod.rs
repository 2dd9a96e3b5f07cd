//! Loading of transformed tables into the relational database.
//!
//! A [`Sink`] is opened per menu action and closed when that action ends.

pub mod schema;

pub use schema::{SqlRow, TableSpec};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::error::{EtlError, Result};

pub struct Sink {
    conn: Connection,
    target: String,
}

impl Sink {
    /// Opens (creating if needed) the configured database file.
    #[tracing::instrument(skip_all, fields(target = %config.path.display()))]
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let target = config.path.display().to_string();
        if config.user.is_some() || config.password.is_some() {
            debug!(user = ?config.user, "Credentials supplied; file database does not authenticate");
        }

        let conn = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|source| EtlError::Connection {
            target: target.clone(),
            source,
        })?;

        info!("Database connection established");
        Ok(Self { conn, target })
    }

    /// Runs the table's `CREATE TABLE`. Fails if the table already exists.
    pub fn create_table(&self, spec: &TableSpec) -> Result<()> {
        self.conn
            .execute(&spec.create_sql(), [])
            .map_err(|source| EtlError::Schema {
                table: spec.name.to_string(),
                source,
            })?;
        info!(table = spec.name, "Table created");
        Ok(())
    }

    /// Inserts `rows` one statement per row inside a single transaction.
    ///
    /// Either every row is committed or none is; on failure the error
    /// carries how many rows went through before the failing one.
    pub fn insert_rows<R: SqlRow>(&mut self, spec: &TableSpec, rows: &[R]) -> Result<usize> {
        let insert_err = |submitted: usize| {
            move |source| EtlError::Insert {
                table: spec.name.to_string(),
                submitted,
                source,
            }
        };

        let tx = self.conn.transaction().map_err(insert_err(0))?;
        {
            let mut stmt = tx.prepare(&spec.insert_sql()).map_err(insert_err(0))?;
            for (i, row) in rows.iter().enumerate() {
                stmt.execute(row.sql_params().as_slice())
                    .map_err(insert_err(i))?;
            }
        }
        tx.commit().map_err(insert_err(rows.len()))?;

        info!(table = spec.name, rows = rows.len(), "Rows inserted");
        Ok(rows.len())
    }

    /// Number of rows currently stored in `table`, echoed after each load so
    /// repeated choices show the table growing.
    pub fn row_count(&self, table: &str) -> Result<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM [{table}]"), [], |r| r.get(0))
            .map_err(|source| EtlError::Connection {
                target: self.target.clone(),
                source,
            })
    }

    /// Closes the connection, reporting any error from the driver.
    pub fn close(self) -> Result<()> {
        let target = self.target;
        self.conn.close().map_err(|(_, source)| {
            warn!(target = %target, "Database close failed");
            EtlError::Connection { target, source }
        })
    }
}
