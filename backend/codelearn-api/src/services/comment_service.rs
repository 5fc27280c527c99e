use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentFilter, CommentRow, CommentStatistics};

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.post_id, c.user_id, c.content, c.likes, c.created_at, c.updated_at,
        u.name AS author_name,
        u.email AS author_email,
        p.title AS post_title
    FROM comments c
    LEFT JOIN users u ON u.id = c.user_id
    LEFT JOIN posts p ON p.id = c.post_id
"#;

pub struct CommentService {
    db: Database,
}

impl CommentService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &CommentFilter) -> Result<Vec<Comment>> {
        let query = format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR c.post_id = $1)
              AND ($2::uuid IS NULL OR c.user_id = $2)
            ORDER BY c.created_at DESC"#,
            COMMENT_SELECT
        );

        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(filter.post_id)
            .bind(filter.user_id)
            .fetch_all(&self.db.pg)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_comment(filter.with_info))
            .collect())
    }

    pub async fn get(&self, comment_id: Uuid, with_info: bool) -> Result<Comment> {
        let query = format!("{} WHERE c.id = $1", COMMENT_SELECT);

        let row = sqlx::query_as::<_, CommentRow>(&query)
            .bind(comment_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        Ok(row.into_comment(with_info))
    }

    pub async fn owner_of(&self, comment_id: Uuid) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }

    pub async fn create(&self, post_id: Uuid, author_id: Uuid, content: &str) -> Result<Comment> {
        let post_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(post_id)
                .fetch_one(&self.db.pg)
                .await?;

        if !post_exists {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comment_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, user_id, content)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(author_id)
        .bind(content.trim())
        .execute(&self.db.pg)
        .await?;

        tracing::info!(comment_id = %comment_id, post_id = %post_id, "comment created");
        self.get(comment_id, true).await
    }

    pub async fn update(&self, comment_id: Uuid, content: &str) -> Result<Comment> {
        let updated = sqlx::query(
            "UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(comment_id)
        .bind(content.trim())
        .execute(&self.db.pg)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        self.get(comment_id, true).await
    }

    pub async fn delete(&self, comment_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.db.pg)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        tracing::info!(comment_id = %comment_id, "comment deleted");
        Ok(())
    }

    pub async fn like(&self, comment_id: Uuid) -> Result<Comment> {
        self.adjust_likes(comment_id, 1).await
    }

    /// Decrement likes, never below zero
    pub async fn unlike(&self, comment_id: Uuid) -> Result<Comment> {
        self.adjust_likes(comment_id, -1).await
    }

    async fn adjust_likes(&self, comment_id: Uuid, delta: i32) -> Result<Comment> {
        let updated =
            sqlx::query("UPDATE comments SET likes = GREATEST(likes + $2, 0) WHERE id = $1")
                .bind(comment_id)
                .bind(delta)
                .execute(&self.db.pg)
                .await?
                .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        self.get(comment_id, false).await
    }

    pub async fn statistics(&self) -> Result<CommentStatistics> {
        let (total_comments, total_likes, average_likes): (i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(likes), 0)::BIGINT,
                COALESCE(AVG(likes), 0)::DOUBLE PRECISION
            FROM comments
            "#,
        )
        .fetch_one(&self.db.pg)
        .await?;

        Ok(CommentStatistics {
            total_comments,
            total_likes,
            average_likes,
        })
    }
}
