pub mod category;
pub mod comment;
pub mod follow;
pub mod notification;
pub mod post;
pub mod report;
pub mod settings;
pub mod user;
pub mod work;
pub mod work_comment;
