use anyhow::Result;
use std::borrow::Cow;

use crate::constants::settings::{BAN_REASON_PLACEHOLDER, BAN_SCREEN_KEY, DEFAULT_BAN_SCREEN};
use crate::db::{Store, now_timestamp};

const NO_REASON: &str = "No reason given";

/// Substitutes the escaped ban reason into the notice template.
#[must_use]
pub fn render_ban_screen(template: &str, reason: Option<&str>) -> String {
    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(NO_REASON);
    let escaped: Cow<'_, str> = html_escape::encode_text(reason);
    template.replace(BAN_REASON_PLACEHOLDER, &escaped)
}

pub async fn ban_screen_template(store: &Store) -> Result<String> {
    Ok(store
        .settings()
        .get(BAN_SCREEN_KEY)
        .await?
        .unwrap_or_else(|| DEFAULT_BAN_SCREEN.to_string()))
}

pub async fn set_ban_screen_template(store: &Store, template: &str) -> Result<()> {
    store
        .settings()
        .set(BAN_SCREEN_KEY, template, &now_timestamp())
        .await
}

/// The notice shown to a banned user. Falls back to the built-in template
/// when the stored one cannot be read.
pub async fn ban_notice(store: &Store, reason: Option<&str>) -> String {
    let template = match ban_screen_template(store).await {
        Ok(template) => template,
        Err(e) => {
            tracing::warn!("Failed to load ban screen template: {e}");
            DEFAULT_BAN_SCREEN.to_string()
        }
    };
    render_ban_screen(&template, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_is_escaped() {
        let html = render_ban_screen("<p>{reason}</p>", Some("<script>alert(1)</script>"));
        assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
    }

    #[test]
    fn test_missing_reason_uses_placeholder_text() {
        assert_eq!(render_ban_screen("{reason}", None), NO_REASON);
        assert_eq!(render_ban_screen("{reason}", Some("   ")), NO_REASON);
    }

    #[test]
    fn test_template_without_placeholder_is_unchanged() {
        assert_eq!(render_ban_screen(DEFAULT_BAN_SCREEN, Some("spam")), DEFAULT_BAN_SCREEN);
    }

    #[tokio::test]
    async fn test_stored_template_round_trip() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        assert_eq!(ban_screen_template(&store).await.unwrap(), DEFAULT_BAN_SCREEN);

        set_ban_screen_template(&store, "<b>{reason}</b>").await.unwrap();
        assert_eq!(ban_notice(&store, Some("spam & scams")).await, "<b>spam &amp; scams</b>");
    }
}
