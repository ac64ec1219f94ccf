use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Router};
use tokio::task;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use watershed_core::DataServiceTrait;

use crate::{config::Config, error::ApiResult, main_lib::AppState};

mod data;
mod discovery;

/// Runs a synchronous engine call on the blocking pool.
pub(crate) async fn run_blocking<T, F>(state: &Arc<AppState>, f: F) -> ApiResult<T>
where
    F: FnOnce(&dyn DataServiceTrait) -> watershed_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.data_service.clone();
    let value = task::spawn_blocking(move || f(service.as_ref()))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute engine task: {}", e))??;
    Ok(value)
}

pub async fn health() -> &'static str {
    "Server is running..."
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .merge(discovery::router())
        .merge(data::router());

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .route("/clear_cache", get(data::clear_cache))
        .with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
