use serde::{Deserialize, Serialize};

use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::db::User;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable reason for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code),
        }
    }

    /// A failure that still carries a payload.
    pub fn error_with(code: &'static str, message: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
            code: Some(code),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub const fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PageQuery {
    #[must_use]
    pub fn clamped_limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDetailDto {
    pub id: i32,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub is_following: bool,
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author: Option<UserSummary>,
    pub category_id: Option<i32>,
    pub likes: i64,
    pub views: i64,
    pub is_pinned: bool,
    pub is_liked: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: i32,
    pub post_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub author: Option<UserSummary>,
    pub likes: i64,
    pub is_liked: bool,
    pub created_at: String,
}

/// `work_id` is the provider's work id, matching the work routes.
#[derive(Debug, Serialize)]
pub struct WorkCommentDto {
    pub id: i32,
    pub work_id: i64,
    pub parent_id: Option<i32>,
    pub content: String,
    pub author: Option<UserSummary>,
    pub likes: i64,
    pub is_liked: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct WorkDto {
    pub id: i32,
    pub work_id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub bcm_url: Option<String>,
    pub owner: Option<UserSummary>,
    pub likes: i64,
    pub views: i64,
    pub is_liked: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: i32,
    pub kind: String,
    pub sender: Option<UserSummary>,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub work_id: Option<i32>,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes: i64,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
}

#[derive(Debug, Serialize)]
pub struct BanDetails {
    pub ban_reason: Option<String>,
    pub ban_screen: String,
}
