//! `Transport` trait and the HTTP implementation used in production.
//!
//! The coordinator speaks JSON values at this seam; typed encoding and
//! decoding happen one level up so test doubles only script JSON.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::Endpoint;
use crate::config::ApiConfig;

use super::error::NetworkError;

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Posts a JSON body to a named endpoint and returns the JSON reply.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn Transport>` by every in-flight request task.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: Endpoint, body: Value) -> Result<Value, NetworkError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// `POST`s to the kiosk backend with `reqwest`.
///
/// URLs come from [`ApiConfig`]; nothing is hardcoded.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpTransport {
    /// Build a transport from config.
    ///
    /// Without `timeout_secs` the client keeps reqwest's defaults.  A
    /// default client is used if the builder fails.
    pub fn from_config(config: &ApiConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: Endpoint, body: Value) -> Result<Value, NetworkError> {
        let url = self.config.url_for(endpoint);
        log::debug!("transport: POST {url}");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| NetworkError::MalformedResponse(e.to_string()))?;

        Ok(json)
    }
}
