pub mod config;
pub mod error;
pub mod render;
pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use config::DashboardConfig;
use state::{AppState, ReportSource};

/// Bind and serve the dashboard until the process is stopped.
pub async fn serve(config: DashboardConfig, source: Arc<dyn ReportSource>) -> Result<()> {
    let addr = config.bind_addr();
    let state = AppState::new(source, config);
    let app = routes::router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Dashboard listening on http://{addr}");
    info!("  - Page: http://{addr}/");
    info!("  - API: http://{addr}/api/attribution");
    info!("  - Health: http://{addr}/health");

    axum::serve(listener, app).await?;
    Ok(())
}
