//! Comment model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Comment status; deletion is a soft status flip, never physical removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "comment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Active,
    Deleted,
}

/// Comment entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub project_id: Uuid,
    pub content: String,
}

/// Admin comment-update payload; overwrites without ownership checks
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateComment {
    pub content: Option<String>,
    pub status: Option<CommentStatus>,
}
