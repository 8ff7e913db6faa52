// Webhook sink trait: the seam between formatting and delivery.
//
// The production implementation posts to a Discord webhook; tests record
// messages in memory instead.

use anyhow::Result;
use async_trait::async_trait;

use super::embed::WebhookMessage;

/// Destination for formatted notifications.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Deliver one message. Errors are reported, never retried here.
    async fn deliver(&self, message: &WebhookMessage) -> Result<()>;
}
