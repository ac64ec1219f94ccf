use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use watershed_core::DataResponse;

use super::run_blocking;
use crate::{
    error::ApiResult,
    main_lib::AppState,
    validation::{get_data_args, Params},
};

async fn get_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> ApiResult<Json<DataResponse>> {
    let request = get_data_args(&params)?;
    let response = run_blocking(&state, move |service| service.fetch_data(&request)).await?;
    Ok(Json(response))
}

/// Drops cached schema entries and aliases; both are rebuilt on demand.
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    run_blocking(&state, |service| service.clear_caches()).await?;
    Ok("Cache cleared.")
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/get_data", get(get_data))
}
