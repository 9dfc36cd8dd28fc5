//! Runs one aggregation against the configured sources (fixtures by default)
//! and prints the result as pretty JSON.
//!
//! Usage: `intel_demo [LOCATION] [CATEGORY...]`

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info_span;

use trend_intel::config::IntelligenceConfig;
use trend_intel::logging;
use trend_intel::request::AggregationRequest;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let mut args = std::env::args().skip(1);
    let location = args.next().unwrap_or_else(|| "Austin, TX".to_string());
    let categories: Vec<String> = args.collect();

    let cfg = IntelligenceConfig::load_default().context("loading intelligence config")?;
    let engine = cfg.build_engine(info_span!("intel_demo"))?;

    // Ctrl-C abandons the request; in-flight adapters are cancelled.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let request = AggregationRequest::new(location).with_categories(categories);
    let intel = engine.aggregate(request, &cancel).await?;

    println!("{}", serde_json::to_string_pretty(&intel)?);
    Ok(())
}
