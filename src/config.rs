// ============================================================================
// File: src/config.rs
// Configuration structures and validation
// ============================================================================

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

/// Main configuration structure loaded from config.json
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Root URL of the proxy functions (e.g., "https://abc.supabase.co/functions/v1")
    #[serde(default)]
    pub base_url: String,

    /// Optional key sent as bearer token and `apikey` header
    #[serde(default)]
    pub api_key: Option<String>,

    /// Function names appended to `base_url`
    #[serde(default)]
    pub endpoints: Endpoints,

    /// How many sources to list under an answer
    #[serde(default = "default_max_sources_shown")]
    pub max_sources_shown: usize,
}

/// Proxy endpoint names for the three logical operations
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Endpoints {
    #[serde(default = "default_search_endpoint")]
    pub search: String,

    #[serde(default = "default_chat_endpoint")]
    pub chat: String,

    #[serde(default = "default_followup_endpoint")]
    pub followup: String,
}

fn default_max_sources_shown() -> usize {
    6
}

fn default_search_endpoint() -> String {
    "subfeed-search".to_string()
}

fn default_chat_endpoint() -> String {
    "subfeed-chat".to_string()
}

fn default_followup_endpoint() -> String {
    "subfeed-followup".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search: default_search_endpoint(),
            chat: default_chat_endpoint(),
            followup: default_followup_endpoint(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            endpoints: Endpoints::default(),
            max_sources_shown: default_max_sources_shown(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ClientError::Configuration(format!("failed to parse config: {}", e)))
    }

    /// Apply command-line or environment overrides on top of the file values
    pub fn with_overrides(mut self, base_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if api_key.is_some() {
            self.api_key = api_key;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Configuration("base_url is required".into()));
        }

        let parsed = Url::parse(&self.base_url).map_err(|e| {
            ClientError::Configuration(format!("base_url '{}' is not a valid URL: {}", self.base_url, e))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClientError::Configuration(format!(
                "base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        for (name, value) in [
            ("search", &self.endpoints.search),
            ("chat", &self.endpoints.chat),
            ("followup", &self.endpoints.followup),
        ] {
            if value.trim().is_empty() {
                return Err(ClientError::Configuration(format!(
                    "endpoint '{}' must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Full URL of a proxy function
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}
