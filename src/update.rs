//! Inbound update envelope and the pure classification step.
//!
//! Telegram delivers duck-typed JSON where almost every field can be absent.
//! Everything here is modeled as optional and defaulted, so a malformed or
//! partial payload degrades to "nothing to do" instead of a parse error.

use serde::Deserialize;

use crate::config::Config;

/// Slot-machine dice outcome that renders as 7-7-7 in the client.
pub const JACKPOT_VALUE: i64 = 64;
pub const SLOT_MACHINE_EMOJI: &str = "🎰";

/// One update envelope as delivered to the webhook. Exactly one of the
/// variants is populated; we take the first present one as "the message".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

impl Update {
    pub fn message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub dice: Option<Dice>,
}

impl Message {
    /// Message text trimmed of surrounding whitespace, empty if absent.
    pub fn text_trimmed(&self) -> &str {
        self.text.as_deref().unwrap_or("").trim()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind.as_deref() == Some("private")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
}

impl User {
    /// Display name for messages: first name, then handle, then a placeholder.
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("player")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dice {
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub value: i64,
}

/// What the handler should do with an update. Exactly one branch per update.
#[derive(Debug)]
pub enum Action<'a> {
    /// `/start` or `/help` in a private chat.
    Help { chat_id: i64 },
    /// `/id` in a private chat: echo ids back for operator debugging.
    WhoAmI { chat_id: i64, sender: Option<&'a User> },
    /// A qualifying 🎰 roll with value 64.
    Jackpot { msg: &'a Message, chat_id: i64 },
    /// Anything else: acknowledged upstream, no side effects.
    Ignore { reason: &'static str },
}

/// Classify one update against the configuration. Pure: no I/O, no clock.
pub fn classify<'a>(config: &Config, update: &'a Update) -> Action<'a> {
    let Some(msg) = update.message() else {
        return Action::Ignore {
            reason: "no message in update",
        };
    };
    let Some(chat_id) = msg.chat.id else {
        return Action::Ignore {
            reason: "message without chat id",
        };
    };

    if !allowed(config, msg, chat_id) {
        return Action::Ignore {
            reason: "chat or sender not in allow-set",
        };
    }

    if msg.chat.is_private() {
        let text = msg.text_trimmed();
        if text.starts_with("/start") || text.starts_with("/help") {
            return Action::Help { chat_id };
        }
        if text.starts_with("/id") {
            return Action::WhoAmI {
                chat_id,
                sender: msg.from.as_ref(),
            };
        }
    }

    match &msg.dice {
        Some(dice) if dice.emoji == SLOT_MACHINE_EMOJI => {
            // One upstream variant fired on value != 64; that inverts the
            // evident intent, so the equality check is authoritative here.
            if dice.value == JACKPOT_VALUE {
                Action::Jackpot { msg, chat_id }
            } else {
                Action::Ignore {
                    reason: "slot roll below jackpot",
                }
            }
        }
        Some(_) => Action::Ignore {
            reason: "dice is not a slot machine",
        },
        None => Action::Ignore {
            reason: "no dice in message",
        },
    }
}

/// Access filter. Only enforced when owner/allow-set configuration exists;
/// otherwise every chat passes. Rejection is silent per the webhook contract.
fn allowed(config: &Config, msg: &Message, chat_id: i64) -> bool {
    if msg.chat.is_private() {
        match config.owner_id {
            Some(owner) => msg.from.as_ref().and_then(|u| u.id) == Some(owner),
            None => true,
        }
    } else if config.allowed_chat_ids.is_empty() {
        true
    } else {
        config.allowed_chat_ids.contains(&chat_id)
    }
}
