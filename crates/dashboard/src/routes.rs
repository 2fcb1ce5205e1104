use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{services::ServeDir, trace::TraceLayer};

use fund_attribution_core::models::attribution::AttributionReport;

use crate::error::AppError;
use crate::render::{self, PageContext, LEFT_LOGO, RIGHT_LOGO};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.assets_dir);
    Router::new()
        .route("/", get(index))
        .route("/api/attribution", get(get_attribution))
        .route("/health", get(health))
        .nest_service("/assets", assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn page_context(state: &AppState) -> PageContext<'_> {
    let dir = &state.config.assets_dir;
    PageContext {
        fund_name: &state.config.fund_display_name,
        left_logo: dir.join(LEFT_LOGO).is_file(),
        right_logo: dir.join(RIGHT_LOGO).is_file(),
    }
}

async fn index(State(state): State<AppState>) -> Response {
    match state.report().await {
        Ok(report) => Html(render::render_page(&report, &page_context(&state))).into_response(),
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!(error = %err.0, "dashboard render failed");
            let page = render::render_error_page(&err.0.to_string(), &page_context(&state));
            (err.status(), Html(page)).into_response()
        }
    }
}

async fn get_attribution(State(state): State<AppState>) -> Result<Json<AttributionReport>, AppError> {
    let report = state.report().await?;
    Ok(Json(report.as_ref().clone()))
}

async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
