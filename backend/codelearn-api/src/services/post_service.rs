use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    normalize_tags, CreatePostRequest, Post, PostRow, PostStatistics, PostView, UpdatePostRequest,
};

const POST_SELECT: &str = r#"
    SELECT
        p.id, p.user_id, p.title, p.content, p.likes, p.views, p.created_at, p.updated_at,
        ARRAY(SELECT pt.tag::text FROM post_tags pt WHERE pt.post_id = p.id ORDER BY pt.tag) AS tags,
        u.name AS author_name,
        u.email AS author_email,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    LEFT JOIN users u ON u.id = p.user_id
"#;

pub struct PostService {
    db: Database,
}

impl PostService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest first, optionally only one author's posts
    pub async fn list(&self, user_id: Option<Uuid>, view: PostView) -> Result<Vec<Post>> {
        let query = format!(
            "{} WHERE ($1::uuid IS NULL OR p.user_id = $1) ORDER BY p.created_at DESC",
            POST_SELECT
        );

        let rows = sqlx::query_as::<_, PostRow>(&query)
            .bind(user_id)
            .fetch_all(&self.db.pg)
            .await?;

        Ok(rows.into_iter().map(|row| row.into_post(view)).collect())
    }

    pub async fn get(&self, post_id: Uuid, view: PostView) -> Result<Post> {
        let query = format!("{} WHERE p.id = $1", POST_SELECT);

        let row = sqlx::query_as::<_, PostRow>(&query)
            .bind(post_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        Ok(row.into_post(view))
    }

    /// Author of a post, used for ownership checks
    pub async fn owner_of(&self, post_id: Uuid) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.db.pg)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Insert the post and its tags in one transaction
    pub async fn create(&self, author_id: Uuid, req: CreatePostRequest) -> Result<Post> {
        let post_id = Uuid::new_v4();
        let tags = normalize_tags(&req.tags);

        let mut tx = self.db.pg.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, title, content)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(req.title.trim())
        .bind(&req.content)
        .execute(tx.as_mut())
        .await?;

        insert_tags(tx.as_mut(), post_id, &tags).await?;

        tx.commit().await?;

        tracing::info!(post_id = %post_id, author_id = %author_id, tags = tags.len(), "post created");
        self.get(post_id, PostView::full()).await
    }

    /// Update title/content; when `tags` is given the tag set is replaced
    pub async fn update(&self, post_id: Uuid, req: UpdatePostRequest) -> Result<Post> {
        let mut tx = self.db.pg.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE posts SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(req.title.as_deref().map(str::trim))
        .bind(req.content)
        .execute(tx.as_mut())
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        if let Some(tags) = req.tags {
            let tags = normalize_tags(&tags);
            sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
                .bind(post_id)
                .execute(tx.as_mut())
                .await?;
            insert_tags(tx.as_mut(), post_id, &tags).await?;
        }

        tx.commit().await?;

        self.get(post_id, PostView::full()).await
    }

    pub async fn delete(&self, post_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.db.pg)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        tracing::info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    pub async fn like(&self, post_id: Uuid) -> Result<Post> {
        self.adjust_likes(post_id, 1).await
    }

    /// Decrement likes, never below zero
    pub async fn unlike(&self, post_id: Uuid) -> Result<Post> {
        self.adjust_likes(post_id, -1).await
    }

    async fn adjust_likes(&self, post_id: Uuid, delta: i32) -> Result<Post> {
        let updated = sqlx::query("UPDATE posts SET likes = GREATEST(likes + $2, 0) WHERE id = $1")
            .bind(post_id)
            .bind(delta)
            .execute(&self.db.pg)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        self.get(post_id, PostView::default()).await
    }

    pub async fn statistics(&self) -> Result<PostStatistics> {
        let (total_posts, total_likes, total_views, average_likes, average_views): (
            i64,
            i64,
            i64,
            f64,
            f64,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(likes), 0)::BIGINT,
                COALESCE(SUM(views), 0)::BIGINT,
                COALESCE(AVG(likes), 0)::DOUBLE PRECISION,
                COALESCE(AVG(views), 0)::DOUBLE PRECISION
            FROM posts
            "#,
        )
        .fetch_one(&self.db.pg)
        .await?;

        Ok(PostStatistics {
            total_posts,
            total_likes,
            total_views,
            average_likes,
            average_views,
        })
    }
}

async fn insert_tags(conn: &mut PgConnection, post_id: Uuid, tags: &[String]) -> Result<()> {
    for tag in tags {
        sqlx::query("INSERT INTO post_tags (post_id, tag) VALUES ($1, $2)")
            .bind(post_id)
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
