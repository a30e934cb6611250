//! Diagnostic logging setup.
//!
//! Level control comes from `RUST_LOG`; without it only warnings and errors
//! are emitted. Output goes to stderr unless a log file is given, so that
//! diagnostics never interleave with chat output on stdout.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Calling this more than once is harmless;
/// later calls leave the first subscriber in place.
pub fn init_tracing(log_file: Option<&Path>) -> Result<(), std::io::Error> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let file_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false);
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(file_layer)
                .try_init();
        }
        None => {
            let console_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(console_layer)
                .try_init();
        }
    }
    Ok(())
}
