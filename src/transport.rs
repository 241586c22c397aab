// ============================================================================
// File: src/transport.rs
// HTTP transport to the answer-service proxies
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{ClientError, Result};

/// Status and raw body of a proxy response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam between the client and the network: POST a JSON body to a named endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, endpoint: &str, body: Value) -> Result<TransportResponse>;
}

pub struct HttpTransport {
    client: Client,
    config: Config,
}

impl HttpTransport {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: Client::new(),
            config,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, endpoint: &str, body: Value) -> Result<TransportResponse> {
        let url = self.config.endpoint_url(endpoint);
        debug!(%url, "POST");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);

        // Supabase-style functions want the key twice
        if let Some(api_key) = &self.config.api_key {
            request = request
                .header("Authorization", format!("Bearer {}", api_key))
                .header("apikey", api_key);
        }

        let http_response = request.send().await.map_err(|e| {
            ClientError::Configuration(format!("failed to reach {}: {}", url, e))
        })?;

        let status = http_response.status().as_u16();
        let body = http_response.text().await.map_err(|e| {
            ClientError::Configuration(format!("failed to read response from {}: {}", url, e))
        })?;

        debug!(status, bytes = body.len(), "response received");
        Ok(TransportResponse { status, body })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_transport_requires_valid_config() {
        assert!(matches!(
            HttpTransport::new(Config::default()),
            Err(ClientError::Configuration(_))
        ));

        let config = Config::default().with_overrides(Some("https://example.com".into()), None);
        assert!(HttpTransport::new(config).is_ok());
    }

    #[test]
    fn success_range() {
        let ok = TransportResponse { status: 204, body: String::new() };
        let bad = TransportResponse { status: 404, body: String::new() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
