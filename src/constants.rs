/// Local id of the site owner. Promoted to admin at startup.
pub const SITE_OWNER_ID: i32 = 1;

pub mod settings {
    pub const BAN_SCREEN_KEY: &str = "ban_screen_html";

    pub const DEFAULT_BAN_SCREEN: &str = "<h1>Account Suspended</h1><p>Your account has been banned for violating community rules.</p>";

    /// Replaced with the HTML-escaped ban reason when the notice is rendered.
    pub const BAN_REASON_PLACEHOLDER: &str = "{reason}";
}

pub mod notification_kind {
    pub const LIKE: &str = "like";

    pub const COMMENT: &str = "comment";

    pub const REPLY: &str = "reply";

    pub const MENTION: &str = "mention";

    pub const FOLLOW: &str = "follow";

    pub const WORK_LIKE: &str = "work_like";

    pub const WORK_COMMENT: &str = "work_comment";

    pub const WORK_REPLY: &str = "work_reply";
}

pub mod report {
    pub const TARGET_TYPES: &[&str] = &["post", "comment", "work", "work_comment", "user"];

    pub const PENDING: &str = "pending";

    pub const RESOLVED: &str = "resolved";

    pub const REJECTED: &str = "rejected";
}

pub mod limits {
    pub const COMMENT_TOMBSTONE: &str = "[This comment has been deleted]";

    pub const MAX_COMMENT_LEN: usize = 1000;

    pub const MAX_POST_TITLE_LEN: usize = 200;

    pub const MAX_POST_CONTENT_LEN: usize = 20_000;

    pub const MIN_REPORT_REASON_LEN: usize = 5;

    pub const MAX_REPORT_REASON_LEN: usize = 500;

    pub const NOTIFICATION_PAGE: u64 = 50;

    pub const DEFAULT_PAGE_SIZE: u64 = 20;

    pub const MAX_PAGE_SIZE: u64 = 100;

    /// Upper bound on rows pulled into the trending fallback pool.
    pub const FALLBACK_POOL_SIZE: u64 = 50;
}

pub mod defaults {
    pub const AVATAR_URL: &str = "https://static.codemao.cn/codemao-logo.png";

    pub const BIO: &str = "Programming Cat User";
}
