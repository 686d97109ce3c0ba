//! Console logging for the CLI.
//!
//! Level comes from `COMPDOC_LOG` when set, otherwise from the number of
//! `-v` flags. Output goes to stderr so compiled documents on stdout stay clean.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "COMPDOC_LOG";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Default filter directive for a verbosity count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber once. Later calls are no-ops.
pub fn init(verbosity: u8) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .with_filter(filter),
        );

        // Another subscriber may already be installed (tests, embedding).
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}
