//! The update handler: one pass per inbound update, at most one branch taken.
//!
//! Nothing here returns an error to the webhook caller. Upstream API
//! failures are logged and swallowed, because Telegram re-delivers updates
//! whose webhook responded with a non-success status.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::links;
use crate::telegram::{BotApi, InlineKeyboardMarkup, OutgoingMessage};
use crate::update::{classify, Action, Message, Update, User};

const HELP_TEXT: &str = "🎰 Slot Winner Bot is ready.\n\
    I will notify winners and ping admins on jackpot (777).";

/// Outcome of one admin delivery attempt, kept per recipient so a failure
/// for one admin is observable without affecting the rest.
pub struct AdminDelivery {
    pub admin_id: i64,
    pub result: anyhow::Result<()>,
}

/// Handle one update end to end. Infallible by design: every failure path
/// degrades to "acknowledged, nothing more to do".
pub async fn handle_update(config: &Config, api: &dyn BotApi, update: &Update) {
    match classify(config, update) {
        Action::Ignore { reason } => debug!(reason, "update ignored"),
        Action::Help { chat_id } => {
            send_logged(api, OutgoingMessage::new(chat_id, HELP_TEXT)).await;
        }
        Action::WhoAmI { chat_id, sender } => {
            let text = whoami_text(config, chat_id, sender);
            send_logged(api, OutgoingMessage::new(chat_id, text)).await;
        }
        Action::Jackpot { msg, chat_id } => {
            info!(chat_id, message_id = msg.message_id, "jackpot detected");
            handle_jackpot(config, api, msg, chat_id).await;
        }
    }
}

async fn handle_jackpot(config: &Config, api: &dyn BotApi, msg: &Message, chat_id: i64) {
    let winner = msg.from.clone().unwrap_or_default();

    // (1) Reply to the winner in the originating chat. Attempted first and
    // unconditionally; admin notification must never preempt it.
    let mention = links::winner_mention(&winner);
    let reply = OutgoingMessage {
        reply_to_message_id: msg.message_id,
        allow_sending_without_reply: Some(true),
        reply_markup: Some(InlineKeyboardMarkup::single_url_button(
            config.prize_contact_label.as_str(),
            links::prize_contact_url(&config.prize_contact_id),
        )),
        parse_mode: mention.needs_html.then(|| "HTML".to_string()),
        ..OutgoingMessage::new(
            chat_id,
            format!(
                "🎉 {} hit 777 and won the jackpot!\n\
                 Tap the button below to contact the prize giver.",
                mention.text
            ),
        )
    };
    send_logged(api, reply).await;

    // (2) Private note to each admin, best-effort.
    notify_admins(api, msg, chat_id, &winner).await;
}

/// Fan the jackpot summary out to the chat's non-bot admins, excluding the
/// winner. Enumeration failure means an empty list; each send is isolated.
pub async fn notify_admins(
    api: &dyn BotApi,
    msg: &Message,
    chat_id: i64,
    winner: &User,
) -> Vec<AdminDelivery> {
    let admins = match api.get_chat_administrators(chat_id).await {
        Ok(admins) => admins,
        Err(err) => {
            warn!(chat_id, error = %err, "admin enumeration failed, skipping notification");
            Vec::new()
        }
    };
    if admins.is_empty() {
        return Vec::new();
    }

    let text = admin_summary(msg, chat_id, winner);
    let mut deliveries = Vec::new();
    for admin in admins {
        let Some(admin_id) = admin.id else { continue };
        if Some(admin_id) == winner.id {
            continue;
        }
        let result = api
            .send_message(&OutgoingMessage::new(admin_id, text.clone()))
            .await;
        if let Err(err) = &result {
            // Commonly the admin never opened a chat with the bot.
            warn!(admin_id, error = %err, "admin notification failed");
        }
        deliveries.push(AdminDelivery { admin_id, result });
    }
    deliveries
}

fn admin_summary(msg: &Message, chat_id: i64, winner: &User) -> String {
    let winner_id = winner
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".into());
    let location = match links::message_link(&msg.chat, msg.message_id) {
        Some(link) => format!("Message: {link}"),
        None => format!(
            "Chat: {}, msg_id: {}",
            msg.chat.title.clone().unwrap_or_else(|| chat_id.to_string()),
            msg.message_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "unknown".into()),
        ),
    };
    format!(
        "🎰 Jackpot detected (777)!\nWinner: {} (id {winner_id})\n{location}",
        winner.display_name()
    )
}

fn whoami_text(config: &Config, chat_id: i64, sender: Option<&User>) -> String {
    let sender_id = sender
        .and_then(|u| u.id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unknown".into());
    let mut allowed: Vec<i64> = config.allowed_chat_ids.iter().copied().collect();
    allowed.sort_unstable();
    format!("Your id: {sender_id}\nThis chat: {chat_id}\nAllowed chats: {allowed:?}")
}

async fn send_logged(api: &dyn BotApi, msg: OutgoingMessage) {
    if let Err(err) = api.send_message(&msg).await {
        warn!(chat_id = msg.chat_id, error = %err, "send failed");
    }
}
