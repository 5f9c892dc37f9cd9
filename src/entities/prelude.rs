pub use super::categories::Entity as Categories;
pub use super::comment_likes::Entity as CommentLikes;
pub use super::comments::Entity as Comments;
pub use super::follows::Entity as Follows;
pub use super::notifications::Entity as Notifications;
pub use super::post_likes::Entity as PostLikes;
pub use super::posts::Entity as Posts;
pub use super::reports::Entity as Reports;
pub use super::system_settings::Entity as SystemSettings;
pub use super::users::Entity as Users;
pub use super::work_comment_likes::Entity as WorkCommentLikes;
pub use super::work_comments::Entity as WorkComments;
pub use super::work_likes::Entity as WorkLikes;
pub use super::works::Entity as Works;
