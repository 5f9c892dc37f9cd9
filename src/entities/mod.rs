pub mod prelude;

pub mod categories;
pub mod comment_likes;
pub mod comments;
pub mod follows;
pub mod notifications;
pub mod post_likes;
pub mod posts;
pub mod reports;
pub mod system_settings;
pub mod users;
pub mod work_comment_likes;
pub mod work_comments;
pub mod work_likes;
pub mod works;
