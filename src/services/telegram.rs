use anyhow::Context;
use serde::Serialize;

use crate::config::TelegramSettings;
use crate::services::exchange::Notifier;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Posts alerts to a Telegram chat through the bot API
pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(settings: &TelegramSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build telegram http client")?;

        Ok(Self {
            client,
            url: send_message_url(&settings.base_url, &settings.bot_token),
            chat_id: settings.chat_id.clone(),
        })
    }
}

fn send_message_url(base_url: &str, bot_token: &str) -> String {
    format!("{}/bot{}/sendMessage", base_url.trim_end_matches('/'), bot_token)
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };

        match self.client.post(&self.url).json(&request).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Telegram message delivered ({} bytes)", text.len());
            }
            Ok(response) => {
                tracing::warn!("Telegram rejected message: HTTP {}", response.status());
            }
            Err(e) => {
                // the request url carries the bot token
                tracing::warn!("Telegram error: {}", e.without_url());
            }
        }
    }
}

/// Stand-in used when no Telegram credentials are configured
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        tracing::info!("ALERT\n{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_message_url_embeds_token() {
        assert_eq!(
            send_message_url("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn request_body_has_chat_id_and_text() {
        let body = serde_json::to_value(SendMessageRequest {
            chat_id: "42",
            text: "hello",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"chat_id": "42", "text": "hello"}));
    }
}
