use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use watershed_core::source::FolderEntry;

use super::run_blocking;
use crate::{
    error::ApiResult,
    main_lib::AppState,
    validation::{
        get_table_details_args, get_tables_args, list_files_args, DetailsArgs, Params,
    },
};

async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<FolderEntry>>> {
    let folder = list_files_args(&params)?.unwrap_or_else(|| state.default_folder.clone());
    let listing = run_blocking(&state, move |service| service.list_files(&folder)).await?;
    Ok(Json(listing.entries))
}

async fn get_tables(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> ApiResult<Json<Vec<String>>> {
    let db_path = get_tables_args(&params)?;
    let tables = run_blocking(&state, move |service| service.list_tables(&db_path)).await?;
    Ok(Json(tables))
}

async fn get_table_details(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let response = match get_table_details_args(&params)? {
        DetailsArgs::Single(source) => {
            let details =
                run_blocking(&state, move |service| service.get_table_details(&source)).await?;
            Json(details).into_response()
        }
        DetailsArgs::Multi(sources) => {
            let details =
                run_blocking(&state, move |service| service.get_multi_table_details(&sources))
                    .await?;
            Json(details).into_response()
        }
    };
    Ok(response)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list_files", get(list_files))
        .route("/get_tables", get(get_tables))
        .route("/get_table_details", get(get_table_details))
}
