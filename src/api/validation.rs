use super::ApiError;
use crate::constants::limits::{
    MAX_COMMENT_LEN, MAX_POST_CONTENT_LEN, MAX_POST_TITLE_LEN, MAX_REPORT_REASON_LEN,
    MIN_REPORT_REASON_LEN,
};
use crate::constants::report::TARGET_TYPES;

pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, id
        )));
    }
    Ok(id)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn validate_post_title(title: &str) -> Result<&str, ApiError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Title cannot be empty"));
    }
    if char_len(trimmed) > MAX_POST_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "Title must be {} characters or less",
            MAX_POST_TITLE_LEN
        )));
    }
    Ok(trimmed)
}

pub fn validate_post_content(content: &str) -> Result<&str, ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::validation("Content cannot be empty"));
    }
    if char_len(content) > MAX_POST_CONTENT_LEN {
        return Err(ApiError::validation(format!(
            "Content must be {} characters or less",
            MAX_POST_CONTENT_LEN
        )));
    }
    Ok(content)
}

pub fn validate_comment(content: &str) -> Result<&str, ApiError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Comment cannot be empty"));
    }
    if char_len(trimmed) > MAX_COMMENT_LEN {
        return Err(ApiError::validation(format!(
            "Comment must be {} characters or less",
            MAX_COMMENT_LEN
        )));
    }
    Ok(trimmed)
}

pub fn validate_report_reason(reason: &str) -> Result<&str, ApiError> {
    let trimmed = reason.trim();
    let len = char_len(trimmed);
    if !(MIN_REPORT_REASON_LEN..=MAX_REPORT_REASON_LEN).contains(&len) {
        return Err(ApiError::validation(format!(
            "Reason must be between {} and {} characters",
            MIN_REPORT_REASON_LEN, MAX_REPORT_REASON_LEN
        )));
    }
    Ok(trimmed)
}

pub fn validate_report_target(target_type: &str) -> Result<&str, ApiError> {
    if !TARGET_TYPES.contains(&target_type) {
        return Err(ApiError::validation(format!(
            "Invalid target type '{}'. Expected one of: {}",
            target_type,
            TARGET_TYPES.join(", ")
        )));
    }
    Ok(target_type)
}
