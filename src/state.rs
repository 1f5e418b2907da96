use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::data_api::DataApiClient;
use crate::partners::PartnerClient;
use crate::types::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Invalid URL for {key}: {message}")]
    InvalidUrl { key: &'static str, message: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Collaborator clients for one process. Holds no data: every page call
/// fetches a fresh snapshot.
pub struct AppState {
    pub config: Config,
    pub data: DataApiClient,
    pub partners: PartnerClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let data_url = parse_service_url("dataServiceUrl", &config.data_service_url)?;
        let formations_url =
            parse_service_url("formationsServiceUrl", &config.formations_service_url)?;
        let drone_url = parse_service_url("droneServiceUrl", &config.drone_service_url)?;

        let http_error = |e: reqwest::Error| ConfigError::HttpClient(e.to_string());
        Ok(Self {
            data: DataApiClient::new(data_url).map_err(http_error)?,
            partners: PartnerClient::new(
                formations_url,
                drone_url,
                Duration::from_secs(config.formations_timeout_secs),
            )
            .map_err(http_error)?,
            config,
        })
    }
}

/// Default location: ~/.sitepulse/config.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sitepulse").join("config.json"))
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file is not an error: the built-in defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => {
            log::info!("No home directory found, using default service endpoints");
            return Ok(Config::default());
        }
    };

    if !config_path.exists() {
        log::info!(
            "Config file not found at {}, using default service endpoints",
            config_path.display()
        );
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
        path: config_path.clone(),
        message: e.to_string(),
    })?;

    let config: Config = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: config_path.clone(),
        message: e.to_string(),
    })?;

    // Fail at startup rather than on the first page.
    parse_service_url("dataServiceUrl", &config.data_service_url)?;
    parse_service_url("formationsServiceUrl", &config.formations_service_url)?;
    parse_service_url("droneServiceUrl", &config.drone_service_url)?;

    Ok(config)
}

fn parse_service_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        key,
        message: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            key,
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(Some(&dir.path().join("absent.json"))).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.formations_timeout_secs, 5);
        assert_eq!(config.data_service_url, "http://localhost:5001");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"dataServiceUrl": "http://10.0.0.4:5001", "formationsTimeoutSecs": 2}}"#)
            .expect("write");
        let config = load_config(Some(file.path())).expect("config");
        assert_eq!(config.data_service_url, "http://10.0.0.4:5001");
        assert_eq!(config.formations_timeout_secs, 2);
        assert_eq!(config.drone_service_url, Config::default().drone_service_url);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{{ not json").expect("write");
        let err = load_config(Some(file.path())).expect_err("parse error");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{"droneServiceUrl": "ftp://drones.local"}}"#).expect("write");
        let err = load_config(Some(file.path())).expect_err("invalid url");
        assert!(matches!(err, ConfigError::InvalidUrl { key: "droneServiceUrl", .. }));
    }

    #[test]
    fn test_app_state_builds_from_defaults() {
        let state = AppState::new(Config::default()).expect("state");
        assert_eq!(state.config.formations_timeout_secs, 5);
    }
}
