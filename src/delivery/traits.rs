// Delivery channel trait — the seam between rendering and the network.
//
// The webhook client is the production implementation. Tests and the
// dry-run method plug in their own channels.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Why a single delivery attempt failed. Attempts are never retried.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Posts a JSON payload to one webhook URL.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, url: &str, payload: &Value) -> Result<(), TransportError>;
}

/// Shorten a webhook URL for logs: scheme, host and first path segment.
///
/// Chat webhook URLs carry their secret token in the path.
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let first = parsed
                .path_segments()
                .and_then(|mut segments| segments.next())
                .filter(|s| !s.is_empty());
            match (parsed.host_str(), first) {
                (Some(host), Some(first)) => format!("{}://{host}/{first}/…", parsed.scheme()),
                (Some(host), None) => format!("{}://{host}/", parsed.scheme()),
                _ => "<webhook>".to_string(),
            }
        }
        Err(_) => "<webhook>".to_string(),
    }
}
