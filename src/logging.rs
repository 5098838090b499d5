//! Structured logging setup.
//!
//! Log lines carry algorithm names, operation kinds, sizes and timings.
//! Key bytes and payloads are never logged.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a global `tracing` subscriber writing compact lines to stderr.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `default_filter`
/// (e.g. `"pqlab=info"`). Returns `false` if a subscriber was already
/// installed, which makes repeated calls harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("pqlab=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .is_ok()
}
