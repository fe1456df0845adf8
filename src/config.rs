use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tracing::debug;

pub const DEFAULT_ENV_FILE: &str = "frontend/.env";
pub const DEFAULT_ENV_KEY: &str = "REACT_APP_BACKEND_URL";
/// Used whenever the env file or its key is unavailable.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";
pub const API_PREFIX: &str = "/api";

/// The backend under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub origin: String,
    pub api_base: String,
}

impl Target {
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        let origin = origin.trim_end_matches('/').to_string();
        let api_base = format!("{origin}{API_PREFIX}");
        Target { origin, api_base }
    }

    /// Full URL of an API path, e.g. `"/status"`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub env_file: PathBuf,
    pub env_key: String,
    /// Takes precedence over the env file when set.
    pub base_url: Option<String>,
    pub request_timeout: Duration,
    pub discovery_timeout: Duration,
    pub concurrent: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            env_file: DEFAULT_ENV_FILE.into(),
            env_key: DEFAULT_ENV_KEY.to_string(),
            base_url: None,
            request_timeout: Duration::from_secs(10),
            discovery_timeout: Duration::from_secs(5),
            concurrent: false,
        }
    }
}

impl RunConfig {
    pub async fn target(&self) -> Target {
        match &self.base_url {
            Some(url) => Target::new(url.as_str()),
            None => Target::new(resolve_backend_url(&self.env_file, &self.env_key).await),
        }
    }
}

/// Finds the first `key=value` line and returns the trimmed value.
pub fn backend_url_from_env_contents(contents: &str, key: &str) -> Option<String> {
    let prefix = format!("{key}=");
    contents
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|value| value.trim().to_string())
}

pub async fn resolve_backend_url(path: &Path, key: &str) -> String {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            debug!("Cannot read {}: {e}, using {DEFAULT_BACKEND_URL}", path.display());
            return DEFAULT_BACKEND_URL.to_string();
        }
    };
    match backend_url_from_env_contents(&contents, key) {
        Some(url) => url,
        None => {
            debug!("{key} not set in {}, using {DEFAULT_BACKEND_URL}", path.display());
            DEFAULT_BACKEND_URL.to_string()
        }
    }
}
