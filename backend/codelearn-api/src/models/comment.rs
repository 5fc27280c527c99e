use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;
use super::user::UserSummary;

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub post_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostSummary>,
}

impl CommentRow {
    pub fn into_comment(self, with_info: bool) -> Comment {
        let (user, post) = if with_info {
            let user = match (self.author_name, self.author_email) {
                (Some(name), Some(email)) => Some(UserSummary {
                    id: self.user_id,
                    name,
                    email,
                }),
                _ => None,
            };
            let post = self.post_title.map(|title| PostSummary {
                id: self.post_id,
                title,
            });
            (user, post)
        } else {
            (None, None)
        };

        Comment {
            id: self.id,
            post_id: self.post_id,
            user_id: self.user_id,
            content: self.content,
            likes: self.likes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user,
            post,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[validate(length(min = 1, max = 5000, message = "Comment cannot be empty"), custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Comment cannot be empty"), custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentFilter {
    pub post_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub with_info: bool,
}

#[derive(Debug, Serialize)]
pub struct CommentStatistics {
    pub total_comments: i64,
    pub total_likes: i64,
    pub average_likes: f64,
}
