//! API endpoint configuration.

use serde::{Deserialize, Serialize};

/// Where and as whom to reach the EMSODEV DMP API.
///
/// The password is never part of the configuration; it is prompted for
/// and kept in memory for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub login: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.emsodev.eu".to_string(),
            login: "emsodev".to_string(),
        }
    }
}
