//! Patient records manager entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the store.
//! - Hand stdin/stdout to the prompt loop.

mod config;
mod session;

use clap::Parser;
use config::{AppConfig, Cli};
use log::{error, info};
use medrec_core::db::open_db;
use medrec_core::{init_logging, PatientService, PatientStore, SqlitePatientStore};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cwd = std::env::current_dir().unwrap_or_default();
    let config = Cli::parse().resolve(cwd);

    if let Err(err) = init_logging(&config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("warning: file logging disabled: {err}");
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig) -> Result<(), String> {
    let conn = open_db(&config.db_path).map_err(|err| {
        error!("event=startup module=cli status=error error_code=db_open_failed");
        format!("failed to open `{}`: {err}", config.db_path.display())
    })?;

    let store = SqlitePatientStore::new(&conn);
    store.create_indexes().map_err(|err| {
        error!("event=startup module=cli status=error error_code=index_create_failed");
        format!("failed to create indexes: {err}")
    })?;
    info!("event=startup module=cli status=ok");

    let service = PatientService::new(store);
    let stdin = io::stdin();
    session::run_session(&service, stdin.lock(), io::stdout().lock())
        .map_err(|err| format!("terminal i/o failed: {err}"))?;

    info!("event=session_end module=cli status=ok");
    Ok(())
}
