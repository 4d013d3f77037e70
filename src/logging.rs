//! Tracing setup for the server and the command-line tool.
//!
//! The server writes compact events to stdout and mirrors them, without ANSI colors, into a
//! log file: `SIMPLIMEDI_LOG_FILE` when set, `logs/simplimedi.log` otherwise. The CLI logs to
//! stderr only so stdout stays clean for tokens, summaries, and JSON.
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "SIMPLIMEDI_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_NAME: &str = "simplimedi.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where file logs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogDestination {
    /// Append to an explicit path.
    Explicit(PathBuf),
    /// Default file under the working directory.
    Default,
}

impl LogDestination {
    fn from_env() -> Self {
        match std::env::var(LOG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::Explicit(PathBuf::from(path.trim())),
            _ => Self::Default,
        }
    }

    fn open(&self) -> std::io::Result<NonBlocking> {
        let (writer, guard) = match self {
            Self::Explicit(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                tracing_appender::non_blocking(file)
            }
            Self::Default => {
                std::fs::create_dir_all(DEFAULT_LOG_DIR)?;
                let appender =
                    tracing_appender::rolling::never(Path::new(DEFAULT_LOG_DIR), DEFAULT_LOG_NAME);
                tracing_appender::non_blocking(appender)
            }
        };
        let _ = FILE_GUARD.set(guard);
        Ok(writer)
    }
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the server subscriber: `RUST_LOG` filtering (default `info`), stdout, and a file.
///
/// A file that cannot be opened is reported on stderr and the server continues with stdout
/// logging alone.
pub fn init_tracing() {
    let destination = LogDestination::from_env();
    let file_layer = match destination.open() {
        Ok(writer) => Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .compact(),
        ),
        Err(err) => {
            eprintln!("File logging disabled ({destination:?}): {err}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter_or("info"))
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();
}

/// Install the CLI subscriber: stderr only, default level `warn`.
pub fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(filter_or("warn"))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
