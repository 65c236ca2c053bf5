use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// A post as read back from storage, joined with its author's username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Submitted post form, shared by create and edit.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Replacement values for an edit. `image: None` keeps the current attachment.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Shared by post and comment submissions: blank text is rejected.
pub fn validate_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::validation("text", "must not be empty"));
    }
    Ok(())
}
