// Webhook HTTP client.
//
// One JSON POST per URL with bounded connect and total timeouts. A non-2xx
// status is a failure; nothing is retried.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use super::traits::{redact_url, DeliveryChannel, TransportError};

pub const USER_AGENT: &str = concat!("rcfeed/", env!("CARGO_PKG_VERSION"), " (wiki change feed)");

/// Posts payloads over HTTP.
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    /// `timeout` bounds both connecting and the whole request.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DeliveryChannel for WebhookClient {
    async fn send(&self, url: &str, payload: &Value) -> Result<(), TransportError> {
        let body = serde_json::to_vec(payload)?;
        debug!(url = %redact_url(url), bytes = body.len(), "POST webhook");

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(())
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Logs payloads instead of sending them.
pub struct DryRunChannel;

#[async_trait]
impl DeliveryChannel for DryRunChannel {
    async fn send(&self, url: &str, payload: &Value) -> Result<(), TransportError> {
        let body = serde_json::to_string(payload)?;
        info!(url = %redact_url(url), payload = %body, "Dry run, not sending");
        Ok(())
    }
}
