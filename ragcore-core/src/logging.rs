//! ABOUTME: Structured logging initialization shared by every binary
//! ABOUTME: Tracing is always present; verbosity is controlled via RUST_LOG

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber. Call once at process start.
///
/// `json` selects newline-delimited JSON output (for log aggregators) over
/// the human-readable default. Falls back to `info` when `RUST_LOG` is unset.
/// Always writes to stderr, so a CLI's stdout stays free for command output.
pub fn init_logging(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}
