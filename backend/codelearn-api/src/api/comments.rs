use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{parse_id, ValidatedJson};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{
    Comment, CommentFilter, CommentStatistics, CreateCommentRequest, UpdateCommentRequest,
};
use crate::services::CommentService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route("/statistics", get(statistics))
        .route(
            "/:id",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/:id/like", post(like_comment))
        .route("/:id/unlike", post(unlike_comment))
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
    pub count: usize,
}

async fn list_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> Result<Json<CommentListResponse>> {
    let comments = CommentService::new(state.db.clone()).list(&filter).await?;
    Ok(Json(CommentListResponse {
        count: comments.len(),
        comments,
    }))
}

#[derive(Debug, Serialize)]
pub struct CommentMessageResponse {
    pub message: &'static str,
    pub comment: Comment,
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentMessageResponse>)> {
    let comment = CommentService::new(state.db.clone())
        .create(payload.post_id, user.id, payload.content.trim())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentMessageResponse {
            message: "Comment created successfully",
            comment,
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentViewQuery {
    #[serde(default)]
    pub with_info: bool,
}

async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(view): Query<CommentViewQuery>,
) -> Result<Json<Comment>> {
    let comment_id = parse_id(&id, "comment")?;
    let comment = CommentService::new(state.db.clone())
        .get(comment_id, view.with_info)
        .await?;
    Ok(Json(comment))
}

async fn update_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateCommentRequest>,
) -> Result<Json<CommentMessageResponse>> {
    let comment_id = parse_id(&id, "comment")?;
    let service = CommentService::new(state.db.clone());

    user.ensure_can_modify(service.owner_of(comment_id).await?)?;
    let comment = service.update(comment_id, payload.content.trim()).await?;

    Ok(Json(CommentMessageResponse {
        message: "Comment updated successfully",
        comment,
    }))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let comment_id = parse_id(&id, "comment")?;
    let service = CommentService::new(state.db.clone());

    user.ensure_can_modify(service.owner_of(comment_id).await?)?;
    service.delete(comment_id).await?;

    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}

async fn like_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentMessageResponse>> {
    let comment_id = parse_id(&id, "comment")?;
    let comment = CommentService::new(state.db.clone()).like(comment_id).await?;
    Ok(Json(CommentMessageResponse {
        message: "Comment liked successfully",
        comment,
    }))
}

async fn unlike_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommentMessageResponse>> {
    let comment_id = parse_id(&id, "comment")?;
    let comment = CommentService::new(state.db.clone()).unlike(comment_id).await?;
    Ok(Json(CommentMessageResponse {
        message: "Comment unliked successfully",
        comment,
    }))
}

async fn statistics(State(state): State<AppState>) -> Result<Json<CommentStatistics>> {
    Ok(Json(CommentService::new(state.db.clone()).statistics().await?))
}
