//! Logging initialization.
//!
//! `FBC_LOG` takes an `EnvFilter` directive and overrides the configured
//! level. Output goes to stderr, as text or as JSON events.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::driver::config::{LogFormat, LogSection};

pub const LOG_ENV: &str = "FBC_LOG";

fn filter(log: &LogSection) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&log.level))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(log: &LogSection) {
    let registry = tracing_subscriber::registry().with(filter(log));
    let result = match log.format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if let Err(e) = result {
        tracing::debug!("subscriber already installed: {e}");
    }
}
