//! Logging helpers.
//!
//! The library never installs a subscriber. Components receive a
//! `tracing::Span` at construction and emit under it; binaries call
//! [`init_tracing`] once at startup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "trend_intel=info,warn";

/// Install a compact fmt subscriber filtered by `RUST_LOG`
/// (falls back to [`DEFAULT_FILTER`]). `INTEL_LOG_JSON=1` switches to JSON lines.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("INTEL_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Short, stable fingerprint for user-supplied text (locations). Raw request
/// text is never logged.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
