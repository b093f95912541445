use std::time::Duration;

use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::types::{Embed, WebhookParams};

const API_BASE: &str = "https://discord.com/api/v10";
const WEBHOOK_NAME: &str = "Crosstalk Relay";

/// Minimal Discord REST client: post plain messages and embeds to channels,
/// and impersonated posts through per-channel webhooks.
pub struct DiscordClient {
    http: reqwest::Client,
    token: String,
    /// channel id -> "webhook_id/webhook_token", filled lazily.
    webhooks: DashMap<String, String>,
}

#[derive(Deserialize)]
struct WebhookRecord {
    id: String,
    token: Option<String>,
    name: Option<String>,
}

impl DiscordClient {
    pub fn new(token: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        DiscordClient {
            http,
            token,
            webhooks: DashMap::new(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Post a plain text message to a channel.
    pub async fn send_plain(&self, channel_id: &str, content: &str) -> Result<(), reqwest::Error> {
        self.http
            .post(format!("{API_BASE}/channels/{channel_id}/messages"))
            .header("Authorization", self.auth_header())
            .json(&json!({ "content": content }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Post a single embed to a channel.
    pub async fn send_embed(&self, channel_id: &str, embed: &Embed) -> Result<(), reqwest::Error> {
        self.http
            .post(format!("{API_BASE}/channels/{channel_id}/messages"))
            .header("Authorization", self.auth_header())
            .json(&json!({ "embeds": [embed] }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Post through the channel's relay webhook, creating it on first use.
    pub async fn send_webhook(
        &self,
        channel_id: &str,
        params: &WebhookParams,
    ) -> Result<(), reqwest::Error> {
        let path = self.webhook_path(channel_id).await?;

        let result = self
            .http
            .post(format!("{API_BASE}/webhooks/{path}"))
            .json(params)
            .send()
            .await?
            .error_for_status();

        if result.is_err() {
            // The cached webhook may have been deleted out from under us;
            // forget it so the next attempt re-creates one.
            self.webhooks.remove(channel_id);
        }
        result?;
        Ok(())
    }

    /// Resolve (and cache) the execute path of the channel's relay webhook.
    async fn webhook_path(&self, channel_id: &str) -> Result<String, reqwest::Error> {
        if let Some(path) = self.webhooks.get(channel_id) {
            return Ok(path.clone());
        }

        // Reuse an existing relay webhook on the channel when there is one.
        let existing: Vec<WebhookRecord> = self
            .http
            .get(format!("{API_BASE}/channels/{channel_id}/webhooks"))
            .header("Authorization", self.auth_header())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        for hook in existing {
            if hook.name.as_deref() == Some(WEBHOOK_NAME)
                && let Some(token) = hook.token
            {
                let path = format!("{}/{}", hook.id, token);
                self.webhooks.insert(channel_id.to_string(), path.clone());
                return Ok(path);
            }
        }

        debug!("creating relay webhook for channel {channel_id}");
        let created: WebhookRecord = self
            .http
            .post(format!("{API_BASE}/channels/{channel_id}/webhooks"))
            .header("Authorization", self.auth_header())
            .json(&json!({ "name": WEBHOOK_NAME }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let path = format!("{}/{}", created.id, created.token.unwrap_or_default());
        self.webhooks.insert(channel_id.to_string(), path.clone());
        Ok(path)
    }
}
