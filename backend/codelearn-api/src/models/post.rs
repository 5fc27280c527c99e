use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;
use super::user::UserSummary;

pub const MAX_TAG_LEN: usize = 50;

/// Post row joined with its tags, author and comment count
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub likes: i32,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub likes: i32,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<i64>,
}

/// Which joined data to include in a post view
#[derive(Debug, Clone, Copy, Default)]
pub struct PostView {
    pub with_user_info: bool,
    pub with_comment_count: bool,
}

impl PostView {
    pub fn full() -> Self {
        Self {
            with_user_info: true,
            with_comment_count: true,
        }
    }
}

impl PostRow {
    pub fn into_post(self, view: PostView) -> Post {
        let user = match (view.with_user_info, self.author_name, self.author_email) {
            (true, Some(name), Some(email)) => Some(UserSummary {
                id: self.user_id,
                name,
                email,
            }),
            _ => None,
        };

        Post {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            tags: self.tags,
            likes: self.likes,
            views: self.views,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user,
            comment_count: view.with_comment_count.then_some(self.comment_count),
        }
    }
}

/// Trim tags, drop empty ones and collapse duplicates, keeping first-seen order
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag: String = tag.trim().chars().take(MAX_TAG_LEN).collect();
        let tag = tag.trim_end();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"), custom(function = "not_blank"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1), custom(function = "not_blank"))]
    pub content: Option<String>,
    #[validate(length(max = 20, message = "At most 20 tags"))]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PostFilter {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub with_user_info: bool,
    #[serde(default)]
    pub with_comment_count: bool,
}

#[derive(Debug, Serialize)]
pub struct PostStatistics {
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_views: i64,
    pub average_likes: f64,
    pub average_views: f64,
}
