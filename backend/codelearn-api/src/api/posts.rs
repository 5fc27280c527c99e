use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::api::{parse_id, ValidatedJson};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{
    CreatePostRequest, Post, PostFilter, PostStatistics, PostView, UpdatePostRequest,
};
use crate::services::PostService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/statistics", get(statistics))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/like", post(like_post))
        .route("/:id/unlike", post(unlike_post))
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<PostListResponse>> {
    let view = PostView {
        with_user_info: filter.with_user_info,
        with_comment_count: filter.with_comment_count,
    };

    let posts = PostService::new(state.db.clone())
        .list(filter.user_id, view)
        .await?;
    Ok(Json(PostListResponse { posts }))
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: Post,
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let post = PostService::new(state.db.clone())
        .create(user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse { post })))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Post>> {
    let post_id = parse_id(&id, "post")?;
    let post = PostService::new(state.db.clone())
        .get(post_id, PostView::full())
        .await?;
    Ok(Json(post))
}

async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdatePostRequest>,
) -> Result<Json<Post>> {
    let post_id = parse_id(&id, "post")?;
    let service = PostService::new(state.db.clone());

    user.ensure_can_modify(service.owner_of(post_id).await?)?;

    Ok(Json(service.update(post_id, payload).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let post_id = parse_id(&id, "post")?;
    let service = PostService::new(state.db.clone());

    user.ensure_can_modify(service.owner_of(post_id).await?)?;
    service.delete(post_id).await?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: &'static str,
    pub post: Post,
}

async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let post_id = parse_id(&id, "post")?;
    let post = PostService::new(state.db.clone()).like(post_id).await?;
    Ok(Json(LikeResponse {
        message: "Post liked successfully",
        post,
    }))
}

async fn unlike_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let post_id = parse_id(&id, "post")?;
    let post = PostService::new(state.db.clone()).unlike(post_id).await?;
    Ok(Json(LikeResponse {
        message: "Post unliked successfully",
        post,
    }))
}

async fn statistics(State(state): State<AppState>) -> Result<Json<PostStatistics>> {
    Ok(Json(PostService::new(state.db.clone()).statistics().await?))
}
