//! Pure string builders for Telegram deep links and mentions.
//!
//! The handle-vs-numeric heuristics are string-shape guesses, kept here so
//! they can be tested and revisited without touching the notification flow.

use crate::update::{Chat, User};

/// Public link to a message, if one can be formed.
///
/// Chats with a public handle get `https://t.me/<handle>/<id>`. Private
/// supergroups/channels carry the internal `-100` prefix in their id; strip
/// it for the `/c/` form. Anything else has no linkable address.
pub fn message_link(chat: &Chat, message_id: Option<i64>) -> Option<String> {
    let mid = message_id?;
    if let Some(handle) = chat.username.as_deref() {
        return Some(format!("https://t.me/{handle}/{mid}"));
    }
    let cid = chat.id?.to_string();
    cid.strip_prefix("-100")
        .map(|stripped| format!("https://t.me/c/{stripped}/{mid}"))
}

/// URL for the prize-contact button, derived from the configured identifier.
///
/// An alphanumeric non-digit value is treated as a handle (leading `@`
/// tolerated); an all-digit value as a user id reachable only through the
/// `tg://` scheme; anything else falls back to the handle form.
pub fn prize_contact_url(contact_id: &str) -> String {
    let handle = contact_id.trim_start_matches('@');
    let digits = !handle.is_empty() && handle.chars().all(|c| c.is_ascii_digit());
    if digits {
        format!("tg://user?id={handle}")
    } else {
        format!("https://t.me/{handle}")
    }
}

/// How to refer to the winner inside the reply text.
#[derive(Debug, PartialEq, Eq)]
pub struct Mention {
    pub text: String,
    /// True when the text carries an inline link and the message must be
    /// sent with HTML parse mode.
    pub needs_html: bool,
}

pub fn winner_mention(user: &User) -> Mention {
    if let Some(handle) = user.username.as_deref() {
        return Mention {
            text: format!("@{handle}"),
            needs_html: false,
        };
    }
    match user.id {
        Some(id) => Mention {
            text: format!(
                r#"<a href="tg://user?id={id}">{}</a>"#,
                escape_html(user.display_name())
            ),
            needs_html: true,
        },
        None => Mention {
            text: user.display_name().to_string(),
            needs_html: false,
        },
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: Option<i64>, username: Option<&str>) -> Chat {
        Chat {
            id,
            username: username.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_link_via_public_handle() {
        let link = message_link(&chat(Some(-100555), Some("abc")), Some(42));
        assert_eq!(link.as_deref(), Some("https://t.me/abc/42"));
    }

    #[test]
    fn test_link_via_internal_id() {
        let link = message_link(&chat(Some(-1001234567890), None), Some(7));
        assert_eq!(link.as_deref(), Some("https://t.me/c/1234567890/7"));
    }

    #[test]
    fn test_no_link_without_message_id() {
        assert_eq!(message_link(&chat(Some(-1001234567890), None), None), None);
    }

    #[test]
    fn test_no_link_for_plain_group() {
        assert_eq!(message_link(&chat(Some(-4321), None), Some(7)), None);
    }

    #[test]
    fn test_contact_url_numeric_id() {
        assert_eq!(prize_contact_url("8451137138"), "tg://user?id=8451137138");
    }

    #[test]
    fn test_contact_url_handle() {
        assert_eq!(prize_contact_url("SomeUser"), "https://t.me/SomeUser");
        assert_eq!(prize_contact_url("@SomeUser"), "https://t.me/SomeUser");
    }

    #[test]
    fn test_contact_url_odd_value_falls_back_to_handle() {
        assert_eq!(prize_contact_url("some-user"), "https://t.me/some-user");
    }

    #[test]
    fn test_mention_prefers_handle() {
        let user = User {
            id: Some(5),
            username: Some("winner".into()),
            first_name: Some("Win".into()),
            is_bot: false,
        };
        let m = winner_mention(&user);
        assert_eq!(m.text, "@winner");
        assert!(!m.needs_html);
    }

    #[test]
    fn test_mention_falls_back_to_deep_link() {
        let user = User {
            id: Some(5),
            username: None,
            first_name: Some("A <b> B".into()),
            is_bot: false,
        };
        let m = winner_mention(&user);
        assert_eq!(m.text, r#"<a href="tg://user?id=5">A &lt;b&gt; B</a>"#);
        assert!(m.needs_html);
    }

    #[test]
    fn test_mention_without_id_is_plain_name() {
        let m = winner_mention(&User::default());
        assert_eq!(m.text, "player");
        assert!(!m.needs_html);
    }
}
