use std::collections::HashSet;

use anyhow::{bail, Context, Result};

/// Immutable startup configuration.
///
/// Built once from the environment before the server starts and passed
/// explicitly into the handler, so nothing reads ambient state per request.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot API token, `<bot_id>:<auth>` as issued by BotFather.
    pub bot_token: String,
    /// Shared secret: doubles as the webhook path segment and the
    /// `X-Telegram-Bot-Api-Secret-Token` value.
    pub secret: String,
    /// Owner user id; when set, private chats only answer this user.
    pub owner_id: Option<i64>,
    /// Group/supergroup/channel ids allowed to trigger the bot.
    /// Empty means no group filtering.
    pub allowed_chat_ids: HashSet<i64>,
    /// Who the jackpot button points at: a @handle or a numeric user id.
    pub prize_contact_id: String,
    /// Button label on the winner reply.
    pub prize_contact_label: String,
    /// Externally visible base URL, used by the webhook registration routes.
    pub public_url: Option<String>,
    pub port: u16,
}

const DEFAULT_PRIZE_CONTACT_ID: &str = "8451137138";
const DEFAULT_PRIZE_CONTACT_LABEL: &str = "Contact the prize giver";

impl Config {
    pub fn from_env() -> Result<Self> {
        let vars: Vec<(String, String)> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Parse and validate from a list of (key, value) pairs.
    /// Split out from `from_env` so tests never mutate the process environment.
    pub fn from_vars(vars: &[(String, String)]) -> Result<Self> {
        let get = |key: &str| -> Option<&str> {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .filter(|v| !v.is_empty())
        };

        let bot_token = get("BOT_TOKEN")
            .context("BOT_TOKEN is not set")?
            .to_string();
        if !bot_token.contains(':') {
            bail!("BOT_TOKEN is malformed (expected <bot_id>:<auth>)");
        }

        let secret = get("SECRET").context("SECRET is not set")?.to_string();
        if secret.len() < 8 {
            bail!("SECRET is too short (minimum 8 characters)");
        }

        let owner_id = get("OWNER_ID")
            .map(|v| v.trim().parse::<i64>())
            .transpose()
            .context("OWNER_ID is not a valid integer")?;

        let allowed_chat_ids = parse_id_list(get("ALLOWED_CHAT_IDS").unwrap_or(""))
            .context("ALLOWED_CHAT_IDS is not a comma-separated list of integers")?;

        let port = get("PORT")
            .map(|v| v.trim().parse::<u16>())
            .transpose()
            .context("PORT is not a valid port number")?
            .unwrap_or(8000);

        Ok(Self {
            bot_token,
            secret,
            owner_id,
            allowed_chat_ids,
            prize_contact_id: get("PRIZE_CONTACT_ID")
                .unwrap_or(DEFAULT_PRIZE_CONTACT_ID)
                .to_string(),
            prize_contact_label: get("PRIZE_CONTACT_LABEL")
                .unwrap_or(DEFAULT_PRIZE_CONTACT_LABEL)
                .to_string(),
            public_url: get("PUBLIC_URL").map(|v| v.trim_end_matches('/').to_string()),
            port,
        })
    }

    /// Whether the access filter is active at all.
    pub fn is_hardened(&self) -> bool {
        self.owner_id.is_some() || !self.allowed_chat_ids.is_empty()
    }
}

fn parse_id_list(raw: &str) -> Result<HashSet<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("invalid chat id: {s:?}"))
        })
        .collect()
}
