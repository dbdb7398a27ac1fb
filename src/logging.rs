//! Logging and tracing setup.
//!
//! All logs are written to **stderr**; stdout belongs to the host's plugin
//! handshake.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: full `EnvFilter` directives (e.g. `circleci_provider=debug`)
//! - `TF_LOG_PROVIDER`, then `TF_LOG`: the host's log level
//!   (`TRACE`, `DEBUG`, `INFO`, `WARN`, `ERROR`; `JSON` means trace)
//!
//! When none is set the level is `info`.
//!
//! ```bash
//! # Debug logs for the provider only
//! RUST_LOG=circleci_provider=debug terraform apply
//!
//! # Follow the host's level
//! TF_LOG=DEBUG terraform apply
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LEVEL: &str = "info";

/// Map a host log level (`TF_LOG` style) to a tracing level directive.
///
/// Returns `None` for empty or unrecognized values.
pub fn host_log_level(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "JSON" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARN" => Some("warn"),
        "ERROR" => Some("error"),
        _ => None,
    }
}

/// Build the filter from `RUST_LOG`, then the host level, then `info`.
pub fn env_filter() -> EnvFilter {
    filter_from(|key| std::env::var(key).ok())
}

fn filter_from<F>(lookup: F) -> EnvFilter
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(directives) = lookup(EnvFilter::DEFAULT_ENV).filter(|v| !v.is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }

    let level = ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .filter_map(|key| lookup(key))
        .find_map(|value| host_log_level(&value))
        .unwrap_or(DEFAULT_LEVEL);

    EnvFilter::new(level)
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Initialize the global logging subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer())
        .init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Unlike [`init_logging`], this does not panic when a subscriber is
/// already set, which makes it safe to call from tests.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer())
        .try_init()
        .is_ok()
}
