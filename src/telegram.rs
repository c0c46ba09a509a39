//! Thin client for the Telegram Bot API.
//!
//! The API is treated as an opaque HTTP service: JSON in, JSON out, no
//! local state. Every call carries an explicit timeout so a slow upstream
//! bounds handler latency instead of hanging it.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::update::User;

const SEND_TIMEOUT: Duration = Duration::from_secs(15);
const ADMIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Payload for `sendMessage`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sending_without_reply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    pub disable_web_page_preview: bool,
}

impl OutgoingMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            disable_web_page_preview: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Single-button keyboard, the only shape this bot sends.
    pub fn single_url_button(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: text.into(),
                url: url.into(),
            }]],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    #[serde(default)]
    user: Option<User>,
}

/// The two calls the update handler makes. A trait seam so the handler can
/// be exercised against a recording fake.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_message(&self, msg: &OutgoingMessage) -> Result<()>;

    /// Current non-bot administrators of a chat.
    async fn get_chat_administrators(&self, chat_id: i64) -> Result<Vec<User>>;
}

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    /// GET a webhook-management method and relay the upstream JSON verbatim.
    async fn webhook_method(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/{method}", self.base_url))
            .query(params)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?;
        response
            .json()
            .await
            .with_context(|| format!("{method} returned non-JSON body"))
    }

    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<serde_json::Value> {
        self.webhook_method("setWebhook", &[("url", url), ("secret_token", secret_token)])
            .await
    }

    pub async fn delete_webhook(&self) -> Result<serde_json::Value> {
        self.webhook_method("deleteWebhook", &[]).await
    }

    pub async fn webhook_info(&self) -> Result<serde_json::Value> {
        self.webhook_method("getWebhookInfo", &[]).await
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn send_message(&self, msg: &OutgoingMessage) -> Result<()> {
        debug!(chat_id = msg.chat_id, "sendMessage");
        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(msg)
            .timeout(SEND_TIMEOUT)
            .send()
            .await
            .context("sendMessage request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("sendMessage failed ({status}): {body}");
        }
        Ok(())
    }

    async fn get_chat_administrators(&self, chat_id: i64) -> Result<Vec<User>> {
        debug!(chat_id, "getChatAdministrators");
        let response = self
            .client
            .get(format!("{}/getChatAdministrators", self.base_url))
            .query(&[("chat_id", chat_id.to_string())])
            .timeout(ADMIN_TIMEOUT)
            .send()
            .await
            .context("getChatAdministrators request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("getChatAdministrators failed ({status}): {body}");
        }

        let parsed: ApiResponse<Vec<ChatMember>> = response
            .json()
            .await
            .context("getChatAdministrators returned non-JSON body")?;

        let members = if parsed.ok {
            parsed.result.unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(members
            .into_iter()
            .filter_map(|m| m.user)
            .filter(|u| !u.is_bot)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_message_serializes_minimal() {
        let msg = OutgoingMessage::new(123, "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["chat_id"], 123);
        assert_eq!(json["text"], "hello");
        assert_eq!(json["disable_web_page_preview"], true);
        assert!(json.get("reply_to_message_id").is_none());
        assert!(json.get("parse_mode").is_none());
        assert!(json.get("reply_markup").is_none());
    }

    #[test]
    fn test_outgoing_message_serializes_reply_and_markup() {
        let msg = OutgoingMessage {
            reply_to_message_id: Some(7),
            allow_sending_without_reply: Some(true),
            reply_markup: Some(InlineKeyboardMarkup::single_url_button(
                "Claim",
                "https://t.me/SomeUser",
            )),
            parse_mode: Some("HTML".into()),
            ..OutgoingMessage::new(123, "you won")
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["reply_to_message_id"], 7);
        assert_eq!(json["allow_sending_without_reply"], true);
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(
            json["reply_markup"]["inline_keyboard"][0][0]["url"],
            "https://t.me/SomeUser"
        );
    }

    #[test]
    fn test_admin_response_parsing_filters_bots() {
        let body = serde_json::json!({
            "ok": true,
            "result": [
                {"user": {"id": 1, "is_bot": false, "first_name": "A"}},
                {"user": {"id": 2, "is_bot": true, "first_name": "B"}},
                {"status": "creator"}
            ]
        });
        let parsed: ApiResponse<Vec<ChatMember>> = serde_json::from_value(body).unwrap();
        let users: Vec<User> = parsed
            .result
            .unwrap()
            .into_iter()
            .filter_map(|m| m.user)
            .filter(|u| !u.is_bot)
            .collect();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, Some(1));
    }

    #[test]
    fn test_client_base_url_embeds_token() {
        let client = TelegramClient::new("12345:abc");
        assert_eq!(client.base_url, "https://api.telegram.org/bot12345:abc");
    }
}
