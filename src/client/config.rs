use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::info;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base, e.g. `http://127.0.0.1:8080/api`.
    pub api_base_url: String,
    /// Host serving `/ws/chat/{chatId}`; derived from `api_base_url` when unset.
    pub ws_base_url: Option<String>,
    pub request_timeout: Duration,
    pub session_file: PathBuf,
    pub toast_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api".to_string(),
            ws_base_url: None,
            request_timeout: Duration::from_secs(10),
            session_file: PathBuf::from("data").join("session.json"),
            toast_capacity: 20,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        let config = Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            ws_base_url: env::var("WS_BASE_URL").ok().filter(|v| !v.trim().is_empty()),
            request_timeout: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            session_file: env::var("SESSION_FILE").map(PathBuf::from).unwrap_or(defaults.session_file),
            toast_capacity: env::var("TOAST_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.toast_capacity),
        };
        info!("[CONFIG] API base: {}", config.api_base_url);
        info!("[CONFIG] Realtime base: {}", config.ws_base_url.as_deref().unwrap_or("(derived)"));
        config
    }

    /// Config pointing at a given API base, other fields defaulted.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}
