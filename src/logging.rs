//! Logging setup
//!
//! Structured logging via the `tracing` crate. The library itself only emits
//! events; embedding processes call [`init`] (or install their own
//! subscriber) to route them.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding filter directives, e.g. `imprint=debug`.
pub const LOG_ENV: &str = "IMPRINT_LOG";

/// Install a compact stderr subscriber filtered by `IMPRINT_LOG` (falling
/// back to `RUST_LOG`, then `info`). Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = Registry::default()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}
