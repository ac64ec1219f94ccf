use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use watershed_core::{DataService, DataServiceTrait};
use watershed_storage_sqlite::SqliteSourceStore;

use crate::config::Config;

pub struct AppState {
    pub data_service: Arc<dyn DataServiceTrait>,
    pub default_folder: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("WS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    if !Path::new(&config.data_root).is_dir() {
        bail!("Data root {} is not a directory", config.data_root);
    }
    tracing::info!("Data root in use: {}", config.data_root);

    let store = Arc::new(SqliteSourceStore::new(
        &config.data_root,
        config.lookup_marker.as_str(),
    ));
    let data_service: Arc<dyn DataServiceTrait> = Arc::new(DataService::new(store));

    Ok(Arc::new(AppState {
        data_service,
        default_folder: config.default_folder.clone(),
    }))
}
