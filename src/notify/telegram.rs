//! A client for sending notifications through the Telegram Bot API.

use crate::core::{ChatId, Notifier};
use crate::notify::NotifyError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Timeout for a single send request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body the Bot API returns alongside non-success statuses.
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    description: String,
}

/// Sends messages through the Bot API `sendMessage` method with Markdown
/// emphasis enabled.
pub struct TelegramNotifier {
    send_url: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Creates a notifier for the bot behind `bot_token`, talking to the
    /// API at `api_url`. The URL is configurable so tests can point it at
    /// a local mock server.
    pub fn new(api_url: &str, bot_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            send_url: format!(
                "{}/bot{}/sendMessage",
                api_url.trim_end_matches('/'),
                bot_token
            ),
            client,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(&self.send_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(chat_id, "Message accepted by the Bot API");
            return Ok(());
        }

        let description = match response.json::<ApiErrorBody>().await {
            Ok(body) if !body.description.is_empty() => body.description,
            _ => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(NotifyError::Api {
            status: status.as_u16(),
            description,
        })
    }
}
