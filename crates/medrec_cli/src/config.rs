//! Command-line configuration.
//!
//! # Responsibility
//! - Parse process arguments with `clap`.
//! - Resolve defaults into a plain `AppConfig` the rest of the binary uses.

use clap::Parser;
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "healthcare_db.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Parser)]
#[command(
    name = "medrec",
    version,
    about = "Interactive patient records manager"
)]
pub struct Cli {
    /// SQLite database file holding the patients collection.
    #[arg(long = "db", value_name = "PATH", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Absolute directory for rolling log files (default: `<cwd>/logs`).
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (default: debug for debug builds, info otherwise).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Cli {
    /// Fills unset options from the working directory and build profile.
    pub fn resolve(self, cwd: PathBuf) -> AppConfig {
        let log_dir = match self.log_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => cwd.join(dir),
            None => cwd.join(DEFAULT_LOG_DIR_NAME),
        };
        AppConfig {
            db_path: self.db,
            log_dir,
            log_level: self
                .log_level
                .unwrap_or_else(|| medrec_core::default_log_level().to_string()),
        }
    }
}
