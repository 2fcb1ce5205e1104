use std::sync::Arc;

use anyhow::{Context, Result};

use fund_attribution_core::models::settings::Settings;
use fund_attribution_core::FundAttribution;
use fund_attribution_dashboard::config::DashboardConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // 2. Configuration
    let settings = Settings::from_env().context("invalid attribution settings")?;
    let config = DashboardConfig::from_env()?;
    tracing::info!("Fund {} in {}", settings.fund_id, settings.market_timezone);
    tracing::info!("  Report TTL: {}s", config.report_ttl_seconds);
    tracing::info!("  Assets: {}", config.assets_dir.display());

    // 3. Providers
    let engine = FundAttribution::new(settings).context("failed to initialise providers")?;
    for (concern, provider) in engine.providers().describe() {
        tracing::info!("  {concern}: {provider}");
    }

    // 4. Serve
    fund_attribution_dashboard::serve(config, Arc::new(engine)).await
}
