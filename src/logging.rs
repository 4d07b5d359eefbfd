//! Tracing setup for the server.
//!
//! Log lines go to stdout in compact form and, when a log file can be opened, to that file
//! as well. `KBSEARCH_LOG_FILE` selects the file; without it, `logs/kbsearch.log` is used.
//! File writes go through a non-blocking writer so request handlers never wait on disk.

use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// Dropping the guard would silently stop file logging, so it lives for the whole process.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global tracing subscriber.
///
/// `RUST_LOG` controls filtering; the default level is `info`. Failure to set up the file
/// sink is reported on stderr and logging continues on stdout only.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact());

    match file_writer() {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

fn file_writer() -> Option<NonBlocking> {
    let file = match std::env::var("KBSEARCH_LOG_FILE") {
        Ok(path) => std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .inspect_err(|err| eprintln!("Failed to open log file {path}: {err}"))
            .ok()?,
        Err(_) => {
            if let Err(err) = std::fs::create_dir_all("logs") {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open("logs/kbsearch.log")
                .inspect_err(|err| eprintln!("Failed to open logs/kbsearch.log: {err}"))
                .ok()?
        }
    };

    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    Some(writer)
}
