// Discord webhook client.
//
// Webhook docs: https://discord.com/developers/docs/resources/webhook#execute-webhook

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::embed::WebhookMessage;
use super::traits::WebhookSink;

/// Posts messages to a single Discord webhook URL.
pub struct DiscordWebhook {
    client: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent("xforward/0.1 (stream-to-discord)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl WebhookSink for DiscordWebhook {
    async fn deliver(&self, message: &WebhookMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .context("Failed to call Discord webhook")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Discord webhook returned {}: {}", status, body);
        }

        Ok(())
    }
}
