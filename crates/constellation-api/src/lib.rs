pub mod client_ip;
pub mod clock;
pub mod error;
pub mod rate_limit;
pub mod reactions;
pub mod service;
pub mod stars;
pub mod twin;

use std::sync::Arc;

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use constellation_types::api::ThemeInfo;
use constellation_types::models::Theme;

use crate::error::StarError;
use crate::service::StarService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: StarService,
    /// Honor `X-Forwarded-For` / `X-Real-IP` when attributing requests.
    pub trust_proxy: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/stars", get(stars::list_stars).post(stars::create_star))
        .route("/api/stars/{id}", get(stars::get_star))
        .route("/api/stars/{id}/react", post(reactions::react_to_star))
        .route("/api/themes", get(themes))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn themes() -> impl IntoResponse {
    let themes: Vec<ThemeInfo> = Theme::ALL.into_iter().map(ThemeInfo::from).collect();
    Json(serde_json::json!({ "themes": themes }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run blocking store work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, StarError>
where
    F: FnOnce() -> Result<T, StarError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StarError::Storage(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}
