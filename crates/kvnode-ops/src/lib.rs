//! Structured logging installation for `kvnode-server`.
//!
//! Grounded on `dekaf::logging::install` and `ops::tracing::Layer`: a
//! `tracing_subscriber::registry()` with an `EnvFilter` driven `fmt`
//! layer for stderr, plus a [`tracing::Layer`] implementation that turns
//! spans and events into a [`LogEvent`] so tests can assert on emitted
//! log content without scraping stderr. There is no per-connection
//! log-forwarding-into-storage feature here (the teacher forwards logs
//! into a Gazette journal per session; this layer has no equivalent
//! destination, see DESIGN.md) so this crate is a single flat
//! `tracing_subscriber::Layer`, not the teacher's task-local forwarder.

pub mod tracing_layer;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_layer::{Layer, LogEvent, LogLevel};

/// Installs the process-wide subscriber: stderr `fmt` output filtered by
/// `RUST_LOG` (default `info`), following `dekaf::logging::install`.
pub fn install() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    tracing_subscriber::registry().with(fmt_layer).init();
}

/// A handler that writes each [`LogEvent`] as one line of canonical JSON
/// to stderr, following `ops::stderr_log_handler`. Useful when a
/// structured sink is wanted instead of (or alongside) human-readable
/// `fmt` output.
pub fn stderr_json_handler(event: LogEvent) {
    if let Ok(mut line) = serde_json::to_vec(&event) {
        line.push(b'\n');
        use std::io::Write;
        let _ = std::io::stderr().write_all(&line);
    }
}
