use serde::{Deserialize, Serialize};

/// Service endpoints, read from ~/.sitepulse/config.json.
///
/// Every key is optional; a missing file or key falls back to the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_data_service_url")]
    pub data_service_url: String,
    #[serde(default = "default_partner_service_url")]
    pub formations_service_url: String,
    #[serde(default = "default_partner_service_url")]
    pub drone_service_url: String,
    /// Only the formations lookup is bounded; every other call waits.
    #[serde(default = "default_formations_timeout_secs")]
    pub formations_timeout_secs: u64,
}

fn default_data_service_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_partner_service_url() -> String {
    "https://projet-app-rep.onrender.com".to_string()
}

fn default_formations_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_service_url: default_data_service_url(),
            formations_service_url: default_partner_service_url(),
            drone_service_url: default_partner_service_url(),
            formations_timeout_secs: default_formations_timeout_secs(),
        }
    }
}
