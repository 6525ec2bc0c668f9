// Delivery: getting rendered payloads to the chat webhooks.

pub mod dispatch;
pub mod traits;
pub mod webhook;

pub use dispatch::{dispatch, DispatchReport};
pub use traits::{redact_url, DeliveryChannel, TransportError};
pub use webhook::{DryRunChannel, WebhookClient};
