//! CLI entry point for the mortality ETL tool.
//!
//! Resolves settings from flags, environment and `.env`, sets up logging,
//! then hands stdin/stdout to the interactive session.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use mortality_etl::config::{
    DEFAULT_CSV_PATH, DEFAULT_DATA_URL, DEFAULT_DATABASE_PATH, DbConfig, Settings,
};
use mortality_etl::fetch::BasicClient;
use mortality_etl::session::Session;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mortality_etl")]
#[command(about = "Fetch, clean and load mortality statistics interactively", long_about = None)]
struct Cli {
    /// URL of the CSV dataset
    #[arg(long, env = "ETL_DATA_URL", default_value = DEFAULT_DATA_URL)]
    url: String,

    /// Local file the download is written to
    #[arg(long, env = "ETL_CSV_PATH", default_value = DEFAULT_CSV_PATH)]
    csv_path: PathBuf,

    /// SQLite database file receiving the cleaned tables
    #[arg(long, env = "ETL_DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    database: PathBuf,

    /// Database user
    #[arg(long, env = "ETL_DB_USER")]
    db_user: Option<String>,

    /// Database password
    #[arg(long, env = "ETL_DB_PASSWORD", hide_env_values = true)]
    db_password: Option<String>,
}

impl Cli {
    fn into_settings(self) -> Settings {
        Settings {
            data_url: self.url,
            csv_path: self.csv_path,
            db: DbConfig::new(self.database).with_credentials(self.db_user, self.db_password),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/mortality_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("mortality_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let settings = Cli::parse().into_settings();
    info!(
        url = %settings.data_url,
        csv_path = %settings.csv_path.display(),
        db = ?settings.db,
        "Starting session"
    );

    let stdin = std::io::stdin();
    let mut session = Session::new(settings, BasicClient::new(), std::io::stdout());
    session
        .run(stdin.lock())
        .await
        .context("console i/o failed")?;

    info!("Session ended");
    Ok(())
}
