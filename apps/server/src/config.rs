use std::{net::SocketAddr, time::Duration};

pub struct Config {
    pub listen_addr: SocketAddr,
    /// Directory relative database and folder paths are resolved against.
    pub data_root: String,
    /// Folder scanned by `list_files` when the request names none.
    pub default_folder: String,
    pub lookup_marker: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("WS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
            .parse()
            .expect("Invalid WS_LISTEN_ADDR");
        let data_root = std::env::var("WS_DATA_ROOT").unwrap_or_else(|_| ".".into());
        let default_folder = std::env::var("WS_DEFAULT_FOLDER")
            .unwrap_or_else(|_| "Jenette_Creek_Watershed".into());
        let lookup_marker = std::env::var("WS_LOOKUP_MARKER").unwrap_or_else(|_| "lookup".into());
        let cors_allow = std::env::var("WS_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("WS_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        Self {
            listen_addr,
            data_root,
            default_folder,
            lookup_marker,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
        }
    }
}
