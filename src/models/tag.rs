//! Topic tags and the validation applied before any tag reaches the store.

use serde::{Deserialize, Serialize};

use super::TopicId;
use crate::errors::AppError;

/// Minimum number of characters in a tag.
pub const TAG_MIN_CHARS: usize = 2;

/// Request body for adding a tag to a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTagRequest {
    pub tag: String,
}

/// Check a proposed tag against the topic's current tag set.
///
/// Returns the trimmed tag on success. Every failure is a
/// [`AppError::Validation`] so that callers can surface it as a blocking notice
/// without contacting the store.
pub fn validate_new_tag(
    topic_id: &TopicId,
    candidate: &str,
    existing: &[String],
) -> Result<String, AppError> {
    let tag = candidate.trim();

    if topic_id.is_empty() {
        return Err(AppError::Validation(format!(
            "Save memo before adding tag. '{}'",
            tag
        )));
    }
    if tag.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "Do not contains white space. '{}'",
            tag
        )));
    }
    if tag.chars().count() < TAG_MIN_CHARS {
        return Err(AppError::Validation(format!(
            "Need two or more characters. '{}'",
            tag
        )));
    }
    if existing.iter().any(|t| t == tag) {
        return Err(AppError::Validation(format!(
            "Already exists tag. '{}'",
            tag
        )));
    }

    Ok(tag.to_string())
}
