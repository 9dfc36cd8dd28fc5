//! Trend Intelligence Service: binary entrypoint
//! Loads the source configuration, builds the engine and serves the Axum router.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use trend_intel::api::{self, AppState};
use trend_intel::config::IntelligenceConfig;
use trend_intel::logging;

/// Enable local tracing output in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - INTEL_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("INTEL_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if dev_flag && is_dev_env {
        logging::init_tracing();
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    let cfg = IntelligenceConfig::load_default().context("loading intelligence config")?;
    let state = AppState::from_config(&cfg).context("building intelligence engine")?;
    tracing::info!(
        sources = cfg.sources.len(),
        timeout_ms = cfg.engine.adapter_timeout_ms,
        "intelligence engine ready"
    );

    let router = api::app(state)?;
    Ok(router.into())
}
