//! Runtime settings, resolved by the CLI from flags, environment and `.env`.

use std::fmt;
use std::path::PathBuf;

/// Published location of the mortality dataset.
pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/easyAppx/Lab6_ETL_Project/refs/heads/main/Lab6ETL.csv";
pub const DEFAULT_CSV_PATH: &str = "population_data.csv";
pub const DEFAULT_DATABASE_PATH: &str = "lab6etl.db";

/// Where the session downloads from and writes to.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_url: String,
    pub csv_path: PathBuf,
    pub db: DbConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            db: DbConfig::new(DEFAULT_DATABASE_PATH),
        }
    }
}

/// Database target. Credentials are only ever supplied from outside the
/// binary and never printed.
#[derive(Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            user: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("path", &self.path)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
