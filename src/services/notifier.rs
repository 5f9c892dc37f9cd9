use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::constants::notification_kind;
use crate::db::{NotificationTarget, Store, now_timestamp};

/// `@name` handles in order of first appearance, without duplicates.
#[must_use]
pub fn extract_mentions(content: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"@(\w+)").expect("Invalid regex"));

    let mut names: Vec<String> = Vec::new();
    for caps in re.captures_iter(content) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Writes notifications. Failures are logged and never fail the caller.
#[derive(Clone)]
pub struct Notifier {
    store: Store,
}

impl Notifier {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// No notification is produced for acting on your own content.
    pub async fn notify(
        &self,
        recipient_id: i32,
        sender_id: i32,
        kind: &str,
        target: NotificationTarget,
    ) {
        if recipient_id == sender_id {
            return;
        }

        if let Err(e) = self
            .store
            .notifications()
            .create(recipient_id, Some(sender_id), kind, target, &now_timestamp())
            .await
        {
            warn!(recipient_id, kind, "Failed to create notification: {e}");
        }
    }

    /// Notifies users mentioned in a comment. The author and the post author
    /// are skipped; the latter already gets a comment notification.
    pub async fn notify_mentions(
        &self,
        content: &str,
        sender_id: i32,
        post_author_id: i32,
        target: NotificationTarget,
    ) {
        let names = extract_mentions(content);
        if names.is_empty() {
            return;
        }

        let users = match self.store.users().find_by_display_names(&names).await {
            Ok(users) => users,
            Err(e) => {
                warn!("Failed to resolve mentions: {e}");
                return;
            }
        };

        for user in users {
            if user.id == post_author_id {
                continue;
            }
            self.notify(user.id, sender_id, notification_kind::MENTION, target)
                .await;
        }
    }
}
