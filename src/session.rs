//! Interactive menu loop that owns the currently loaded table.
//!
//! Each choice runs to completion, including its own database
//! connect/create/insert/close cycle, before the next prompt.

use std::io::{self, BufRead, Write};

use tracing::{error, info, warn};

use crate::config::{DbConfig, Settings};
use crate::error::EtlError;
use crate::fetch::{self, HttpClient};
use crate::loader;
use crate::output;
use crate::record::RecordTable;
use crate::sink::schema::{AGE_GROUP, AGGREGATED, NO_NULLS, WITHOUT_OUTLIERS, YEAR_2020};
use crate::sink::{Sink, SqlRow, TableSpec};
use crate::transform;

pub const NOT_LOADED: &str = "Data not loaded. Please fetch the data first.";
pub const INVALID_CHOICE: &str = "Invalid choice. Please try again.";

const MENU: &str = "
Select a task to perform:
1. Fetch and Load Data
2. Data Cleaning
3. Filter Data for 2020
4. Standardize Age Group Names
5. Remove Outliers
6. Aggregate Deaths by Country Name
7. Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    FetchAndLoad,
    Clean,
    FilterYear,
    NormalizeAgeGroup,
    RemoveOutliers,
    Aggregate,
    Exit,
}

impl MenuChoice {
    /// Parses one line of operator input (`"1"` to `"7"`, surrounding
    /// whitespace ignored).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::FetchAndLoad),
            "2" => Some(Self::Clean),
            "3" => Some(Self::FilterYear),
            "4" => Some(Self::NormalizeAgeGroup),
            "5" => Some(Self::RemoveOutliers),
            "6" => Some(Self::Aggregate),
            "7" => Some(Self::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    NoDataLoaded,
    DataLoaded(RecordTable),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Session<C, W> {
    settings: Settings,
    client: C,
    state: SessionState,
    out: W,
}

impl<C: HttpClient, W: Write> Session<C, W> {
    pub fn new(settings: Settings, client: C, out: W) -> Self {
        Self {
            settings,
            client,
            state: SessionState::NoDataLoaded,
            out,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Prompts and dispatches until the exit choice or end of input.
    pub async fn run<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        let mut line = String::new();
        loop {
            writeln!(self.out, "{MENU}")?;
            write!(self.out, "Enter your choice: ")?;
            self.out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                info!("Input closed, leaving menu");
                break;
            }

            let flow = match MenuChoice::parse(&line) {
                Some(choice) => self.handle(choice).await?,
                None => {
                    warn!(input = line.trim(), "Invalid menu choice");
                    writeln!(self.out, "{INVALID_CHOICE}")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Runs a single menu choice.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&mut self, choice: MenuChoice) -> io::Result<Flow> {
        match choice {
            MenuChoice::FetchAndLoad => self.fetch_and_load().await?,
            MenuChoice::Clean => self.clean()?,
            MenuChoice::FilterYear => self.filter_year()?,
            MenuChoice::NormalizeAgeGroup => self.normalize_age_group()?,
            MenuChoice::RemoveOutliers => self.remove_outliers()?,
            MenuChoice::Aggregate => self.aggregate()?,
            MenuChoice::Exit => {
                writeln!(self.out, "Exiting the program.")?;
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    async fn fetch_and_load(&mut self) -> io::Result<()> {
        let payload = match fetch::fetch_bytes(&self.client, &self.settings.data_url).await {
            Ok(bytes) => bytes,
            Err(e) => return report(&mut self.out, "fetching data from URL", &e),
        };
        writeln!(self.out, "Data fetched successfully from URL.")?;

        let path = match fetch::persist(&payload, &self.settings.csv_path) {
            Ok(path) => path,
            Err(e) => return report(&mut self.out, "saving data to CSV file", &e),
        };
        writeln!(self.out, "Data saved to CSV file successfully.")?;

        let rows = match loader::load(&path) {
            Ok(rows) => rows,
            Err(e) => return report(&mut self.out, "loading data into table", &e),
        };
        if rows.is_empty() {
            warn!(path = %path.display(), "Downloaded file has no rows");
            writeln!(self.out, "Downloaded file contains no rows; nothing loaded.")?;
            return Ok(());
        }

        writeln!(self.out, "Data loaded successfully into table.")?;
        output::write_preview(&mut self.out, &rows, output::PREVIEW_ROWS)?;
        writeln!(self.out, "\nData Types and Summary Information:")?;
        let summary = loader::summarize(&rows);
        output::write_summary(&mut self.out, &summary)?;
        output::log_summary_json(&summary);

        info!(rows = rows.len(), "Session table replaced");
        self.state = SessionState::DataLoaded(rows);
        writeln!(self.out, "Data loaded and ready for further processing.")
    }

    fn clean(&mut self) -> io::Result<()> {
        let SessionState::DataLoaded(table) = &self.state else {
            return self.not_loaded();
        };
        let cleaned = transform::drop_nulls(table);
        info!(before = table.len(), after = cleaned.len(), "Null rows dropped");
        writeln!(self.out, "Data cleaned by removing rows with null values.")?;

        load_into(&self.settings.db, &mut self.out, &NO_NULLS, &cleaned)?;
        self.state = SessionState::DataLoaded(cleaned);
        Ok(())
    }

    fn filter_year(&mut self) -> io::Result<()> {
        let SessionState::DataLoaded(table) = &self.state else {
            return self.not_loaded();
        };
        let filtered = transform::filter_year(table, transform::TARGET_YEAR);
        info!(year = transform::TARGET_YEAR, rows = filtered.len(), "Year filter applied");

        load_into(&self.settings.db, &mut self.out, &YEAR_2020, &filtered)?;
        Ok(())
    }

    fn normalize_age_group(&mut self) -> io::Result<()> {
        let SessionState::DataLoaded(table) = &self.state else {
            return self.not_loaded();
        };
        let normalized = transform::normalize_age_group(table);
        writeln!(self.out, "Age group names standardized.")?;

        load_into(&self.settings.db, &mut self.out, &AGE_GROUP, &normalized)?;
        self.state = SessionState::DataLoaded(normalized);
        Ok(())
    }

    fn remove_outliers(&mut self) -> io::Result<()> {
        let SessionState::DataLoaded(table) = &self.state else {
            return self.not_loaded();
        };
        let kept = match transform::remove_outliers(table) {
            Ok(kept) => kept,
            Err(e) => return report(&mut self.out, "removing outliers", &e),
        };
        info!(dropped = table.len() - kept.len(), "Outliers removed");
        writeln!(self.out, "Outliers removed...")?;

        load_into(&self.settings.db, &mut self.out, &WITHOUT_OUTLIERS, &kept)?;
        Ok(())
    }

    fn aggregate(&mut self) -> io::Result<()> {
        let SessionState::DataLoaded(table) = &self.state else {
            return self.not_loaded();
        };
        let totals = match transform::aggregate_by_country(table) {
            Ok(totals) => totals,
            Err(e) => return report(&mut self.out, "aggregating deaths by country", &e),
        };
        output::write_totals(&mut self.out, &totals)?;

        match load_into(&self.settings.db, &mut self.out, &AGGREGATED, &totals)? {
            LoadOutcome::NotConnected => writeln!(self.out, "Database connection failed."),
            LoadOutcome::Inserted(rows) => {
                info!(rows, countries = totals.len(), "Aggregated totals loaded");
                writeln!(
                    self.out,
                    "Aggregated data loaded into '{}' table successfully.",
                    AGGREGATED.name
                )
            }
            LoadOutcome::InsertFailed => Ok(()),
        }
    }

    fn not_loaded(&mut self) -> io::Result<()> {
        warn!("Choice requires loaded data");
        writeln!(self.out, "{NOT_LOADED}")
    }
}

/// Prints and logs a failed step; the session carries on afterwards.
fn report<W: Write>(out: &mut W, operation: &str, err: &EtlError) -> io::Result<()> {
    error!(operation, kind = err.kind(), error = %err, "Step failed");
    writeln!(out, "Error {operation}: {err}")
}

/// How far [`load_into`] got with a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadOutcome {
    NotConnected,
    Inserted(usize),
    InsertFailed,
}

/// Connects, attempts table creation, inserts, and closes.
///
/// A failed creation is reported and the insert still goes ahead, landing
/// in whatever table of that name already exists. After a successful insert
/// the table's total row count is echoed, which shows repeated runs
/// appending.
fn load_into<R: SqlRow, W: Write>(
    db: &DbConfig,
    out: &mut W,
    spec: &TableSpec,
    rows: &[R],
) -> io::Result<LoadOutcome> {
    let mut sink = match Sink::connect(db) {
        Ok(sink) => sink,
        Err(e) => {
            report(out, "connecting to database", &e)?;
            return Ok(LoadOutcome::NotConnected);
        }
    };
    writeln!(out, "Database connection established.")?;

    match sink.create_table(spec) {
        Ok(()) => writeln!(out, "Table '{}' created successfully.", spec.name)?,
        Err(e) => report(out, &format!("creating table '{}'", spec.name), &e)?,
    }

    let outcome = match sink.insert_rows(spec, rows) {
        Ok(n) => {
            writeln!(out, "Data inserted into '{}' successfully ({n} rows).", spec.name)?;
            match sink.row_count(spec.name) {
                Ok(total) => writeln!(out, "Table '{}' now holds {total} rows.", spec.name)?,
                Err(e) => report(out, &format!("counting rows in '{}'", spec.name), &e)?,
            }
            LoadOutcome::Inserted(n)
        }
        Err(e) => {
            report(out, &format!("inserting data into '{}'", spec.name), &e)?;
            LoadOutcome::InsertFailed
        }
    };

    if let Err(e) = sink.close() {
        report(out, "closing database connection", &e)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use crate::fetch::test_server::serve_once;
    use crate::record::Record;
    use crate::record::fixtures::record;

    const CSV: &str = "\
Region_Code,Region_Name,Country_Code,Country_Name,Year,Sex,Age_Group_Code,Age_Group,Number,Percentage_of_deaths,Age_standardized_rate,Death_rate
EU,Europe,FRA,France,2020,All,Age_all, Adult ,10,0.1,1.0,2.0
EU,Europe,FRA,France,2019,All,Age_all,CHILD,5,0.1,1.0,2.5
EU,Europe,ESP,Spain,2020,All,Age_all,adult,,0.1,1.0,3.0
";

    fn session(dir: &tempfile::TempDir) -> Session<BasicClient, Vec<u8>> {
        let settings = Settings {
            data_url: "http://127.0.0.1:9/unused.csv".into(),
            csv_path: dir.path().join("population_data.csv"),
            db: DbConfig::new(dir.path().join("etl.db")),
        };
        Session::new(settings, BasicClient::new(), Vec::new())
    }

    fn loaded(dir: &tempfile::TempDir, rows: Vec<Record>) -> Session<BasicClient, Vec<u8>> {
        let mut s = session(dir);
        s.state = SessionState::DataLoaded(rows);
        s
    }

    fn text(s: Session<BasicClient, Vec<u8>>) -> String {
        String::from_utf8(s.into_output()).unwrap()
    }

    fn count(dir: &tempfile::TempDir, table: &str) -> i64 {
        Sink::connect(&DbConfig::new(dir.path().join("etl.db")))
            .unwrap()
            .row_count(table)
            .unwrap()
    }

    #[test]
    fn test_parse_menu_choice() {
        assert_eq!(MenuChoice::parse(" 1\n"), Some(MenuChoice::FetchAndLoad));
        assert_eq!(MenuChoice::parse("7"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("8"), None);
        assert_eq!(MenuChoice::parse("two"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[tokio::test]
    async fn test_transforms_before_load_report_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);

        for choice in [
            MenuChoice::Clean,
            MenuChoice::FilterYear,
            MenuChoice::NormalizeAgeGroup,
            MenuChoice::RemoveOutliers,
            MenuChoice::Aggregate,
        ] {
            assert_eq!(s.handle(choice).await.unwrap(), Flow::Continue);
            assert_eq!(s.state(), &SessionState::NoDataLoaded);
        }

        let out = text(s);
        assert_eq!(out.matches(NOT_LOADED).count(), 5);
        assert!(!dir.path().join("etl.db").exists());
    }

    #[tokio::test]
    async fn test_fetch_and_load_populates_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        s.settings.data_url = serve_once("HTTP/1.1 200 OK", CSV);

        s.handle(MenuChoice::FetchAndLoad).await.unwrap();

        let SessionState::DataLoaded(rows) = s.state() else {
            panic!("expected data to be loaded");
        };
        assert_eq!(rows.len(), 3);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("population_data.csv")).unwrap(),
            CSV
        );
        let out = text(s);
        assert!(out.contains("Data saved to CSV file successfully."));
        assert!(out.contains("Data loaded and ready for further processing."));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![record("A", 2020, 1, 1.0)];
        let mut s = loaded(&dir, rows.clone());
        s.settings.data_url = serve_once("HTTP/1.1 500 Internal Server Error", "boom");

        s.handle(MenuChoice::FetchAndLoad).await.unwrap();

        assert_eq!(s.state(), &SessionState::DataLoaded(rows));
        assert!(text(s).contains("Error fetching data from URL"));
    }

    #[tokio::test]
    async fn test_malformed_download_keeps_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        s.settings.data_url = serve_once("HTTP/1.1 200 OK", "Country_Name,Number\nFrance,lots\n");

        s.handle(MenuChoice::FetchAndLoad).await.unwrap();

        assert_eq!(s.state(), &SessionState::NoDataLoaded);
        let out = text(s);
        assert!(out.contains("Data saved to CSV file successfully."));
        assert!(out.contains("Error loading data into table"));
        assert!(!out.contains("Data loaded and ready for further processing."));
    }

    #[tokio::test]
    async fn test_clean_replaces_table_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let mut incomplete = record("B", 2020, 1, 1.0);
        incomplete.number = None;
        let mut s = loaded(&dir, vec![record("A", 2020, 1, 1.0), incomplete]);

        s.handle(MenuChoice::Clean).await.unwrap();

        let SessionState::DataLoaded(rows) = s.state() else {
            panic!("table dropped");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(count(&dir, "CleanedData_NoNulls"), 1);
        let out = text(s);
        assert!(out.contains("Table 'CleanedData_NoNulls' created successfully."));
        assert!(out.contains("Data inserted into 'CleanedData_NoNulls' successfully"));
    }

    #[tokio::test]
    async fn test_filter_year_does_not_touch_state() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<Record> = [2019, 2020, 2020, 2021]
            .into_iter()
            .map(|y| record("A", y, 1, 1.0))
            .collect();
        let mut s = loaded(&dir, rows.clone());

        s.handle(MenuChoice::FilterYear).await.unwrap();

        assert_eq!(s.state(), &SessionState::DataLoaded(rows));
        assert_eq!(count(&dir, "CleanedData_2020"), 2);
    }

    #[tokio::test]
    async fn test_normalize_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = record("A", 2020, 1, 1.0);
        r.age_group = Some(" Adult ".into());
        let mut s = loaded(&dir, vec![r]);

        s.handle(MenuChoice::NormalizeAgeGroup).await.unwrap();

        let SessionState::DataLoaded(rows) = s.state() else {
            panic!("table dropped");
        };
        assert_eq!(rows[0].age_group.as_deref(), Some("adult"));
        assert_eq!(count(&dir, "CleanedData_AgeGroup"), 1);
    }

    #[tokio::test]
    async fn test_repeated_choice_reports_schema_error_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = loaded(&dir, vec![record("A", 2020, 10, 1.0), record("B", 2020, 5, 1.0)]);

        s.handle(MenuChoice::Aggregate).await.unwrap();
        s.handle(MenuChoice::Aggregate).await.unwrap();

        assert_eq!(count(&dir, "CleanedData_Aggregated"), 4);
        let out = text(s);
        assert_eq!(out.matches("Table 'CleanedData_Aggregated' created successfully.").count(), 1);
        assert!(out.contains("Error creating table 'CleanedData_Aggregated'"));
        assert!(out.contains("Table 'CleanedData_Aggregated' now holds 2 rows."));
        assert!(out.contains("Table 'CleanedData_Aggregated' now holds 4 rows."));
        assert_eq!(
            out.matches("Aggregated data loaded into 'CleanedData_Aggregated' table successfully.")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_aggregate_without_database_reports_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = loaded(&dir, vec![record("A", 2020, 10, 1.0)]);
        s.settings.db = DbConfig::new(dir.path().join("missing/etl.db"));

        s.handle(MenuChoice::Aggregate).await.unwrap();

        let out = text(s);
        assert!(out.contains("Error connecting to database"));
        assert!(out.ends_with("Database connection failed.\n"));
        assert!(!out.contains("Aggregated data loaded"));
    }

    #[tokio::test]
    async fn test_aggregate_overflow_is_reported_without_loading() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = loaded(&dir, vec![record("A", 2020, i64::MAX, 1.0), record("A", 2020, 1, 1.0)]);

        s.handle(MenuChoice::Aggregate).await.unwrap();

        assert!(text(s).contains("Error aggregating deaths by country"));
        assert!(!dir.path().join("etl.db").exists());
    }

    #[tokio::test]
    async fn test_outlier_statistics_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = record("A", 2020, 1, 1.0);
        r.death_rate = None;
        let mut s = loaded(&dir, vec![r]);

        s.handle(MenuChoice::RemoveOutliers).await.unwrap();

        assert!(matches!(s.state(), SessionState::DataLoaded(rows) if rows.len() == 1));
        assert!(text(s).contains("Error removing outliers"));
        assert!(!dir.path().join("etl.db").exists());
    }

    #[tokio::test]
    async fn test_unreachable_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = loaded(&dir, vec![record("A", 2020, 1, 1.0)]);
        s.settings.db = DbConfig::new(dir.path().join("missing/etl.db"));

        s.handle(MenuChoice::FilterYear).await.unwrap();

        assert!(text(s).contains("Error connecting to database"));
    }

    #[tokio::test]
    async fn test_run_handles_invalid_input_and_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);

        s.run("9\n2\n7\n3\n".as_bytes()).await.unwrap();

        let out = text(s);
        assert_eq!(out.matches(INVALID_CHOICE).count(), 1);
        assert_eq!(out.matches(NOT_LOADED).count(), 1);
        assert!(out.ends_with("Exiting the program.\n"));
    }

    #[tokio::test]
    async fn test_run_stops_at_end_of_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(&dir);
        s.run("".as_bytes()).await.unwrap();
        assert!(text(s).contains("Enter your choice: "));
    }
}
