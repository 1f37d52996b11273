//! Diagnostics go to stderr through `tracing`; stdout is kept for results.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const DEFAULT_LEVEL: &str = "info";

/// Filter directive to use: `RUST_LOG` wins, then the configured level,
/// then [`DEFAULT_LEVEL`].
pub fn filter_directive(env_value: Option<&str>, configured: Option<&str>) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or(configured.filter(|v| !v.trim().is_empty()))
        .unwrap_or(DEFAULT_LEVEL)
        .trim()
        .to_string()
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(configured: Option<&str>) {
    let env_value = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(env_value.as_deref(), configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .ok();
}
