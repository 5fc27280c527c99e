use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::{parse_id, ValidatedJson};
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::{
    Comment, CommentFilter, Course, CreateUserRequest, EnrollRequest, Post, PostView, Role,
    StrictEnrollRequest, UpdateUserRequest, User, UserProfile,
};
use crate::services::{
    CommentService, CourseService, EnrollmentChange, NewUser, PostService, UserChanges,
    UserService,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/enroll", post(enroll_strict))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/posts", get(user_posts))
        .route("/:id/comments", get(user_comments))
        .route("/:id/courses", get(user_courses).post(enroll))
        .route("/:id/courses/:course_id", delete(unenroll))
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub count: usize,
}

async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<UserListResponse>> {
    let users = UserService::new(state.db.clone()).list().await?;
    Ok(Json(UserListResponse {
        count: users.len(),
        users,
    }))
}

#[derive(Debug, Serialize)]
pub struct UserMessageResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserMessageResponse>)> {
    let password_hash = crypto_core::hash_password(&payload.password)?;

    let service = UserService::new(state.db.clone());
    let user = service
        .create(NewUser {
            name: &payload.name,
            email: &payload.email,
            password_hash: &password_hash,
            role: payload.role.unwrap_or(Role::User),
            bio: payload.bio.as_deref(),
        })
        .await?;

    tracing::info!(admin_id = %admin.id, user_id = %user.id, "admin created user");

    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse {
            message: "User created successfully",
            user: service.profile(user).await?,
        }),
    ))
}

async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    let user_id = parse_id(&id, "user")?;
    current.ensure_can_modify(user_id)?;

    let service = UserService::new(state.db.clone());
    let user = service.get(user_id).await?;
    Ok(Json(service.profile(user).await?))
}

async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserMessageResponse>> {
    let user_id = parse_id(&id, "user")?;
    current.ensure_can_modify(user_id)?;

    if payload.role.is_some() && !current.is_admin() {
        return Err(AppError::Forbidden);
    }

    let password_hash = match payload.password.as_deref() {
        Some(password) => Some(crypto_core::hash_password(password)?),
        None => None,
    };

    let service = UserService::new(state.db.clone());
    let user = service
        .update(user_id, UserChanges::from_request(payload, password_hash))
        .await?;

    Ok(Json(UserMessageResponse {
        message: "User updated successfully",
        user: service.profile(user).await?,
    }))
}

async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let user_id = parse_id(&id, "user")?;
    UserService::new(state.db.clone()).delete(user_id).await?;

    tracing::info!(admin_id = %admin.id, user_id = %user_id, "admin deleted user");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[derive(Debug, Serialize)]
pub struct UserPostsResponse {
    pub posts: Vec<Post>,
    pub count: usize,
}

async fn user_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserPostsResponse>> {
    let user_id = parse_id(&id, "user")?;
    UserService::new(state.db.clone()).get(user_id).await?;

    let posts = PostService::new(state.db.clone())
        .list(
            Some(user_id),
            PostView {
                with_user_info: false,
                with_comment_count: true,
            },
        )
        .await?;

    Ok(Json(UserPostsResponse {
        count: posts.len(),
        posts,
    }))
}

#[derive(Debug, Serialize)]
pub struct UserCommentsResponse {
    pub comments: Vec<Comment>,
    pub count: usize,
}

async fn user_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserCommentsResponse>> {
    let user_id = parse_id(&id, "user")?;
    UserService::new(state.db.clone()).get(user_id).await?;

    let comments = CommentService::new(state.db.clone())
        .list(&CommentFilter {
            post_id: None,
            user_id: Some(user_id),
            with_info: true,
        })
        .await?;

    Ok(Json(UserCommentsResponse {
        count: comments.len(),
        comments,
    }))
}

#[derive(Debug, Serialize)]
pub struct UserCoursesResponse {
    pub courses: Vec<Course>,
    pub count: usize,
}

async fn user_courses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserCoursesResponse>> {
    let user_id = parse_id(&id, "user")?;

    let service = UserService::new(state.db.clone());
    service.get(user_id).await?;
    let courses = service.enrolled_courses(user_id).await?;

    Ok(Json(UserCoursesResponse {
        count: courses.len(),
        courses,
    }))
}

/// Lenient enrollment: enrolling twice is not an error
async fn enroll(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<EnrollRequest>,
) -> Result<Json<serde_json::Value>> {
    let user_id = parse_id(&id, "user")?;
    current.ensure_can_modify(user_id)?;

    let service = UserService::new(state.db.clone());
    service.get(user_id).await?;
    CourseService::new(state.db.clone()).get(payload.course_id).await?;

    let message = match service.enroll(user_id, payload.course_id).await? {
        EnrollmentChange::Changed => "User enrolled in course successfully",
        EnrollmentChange::Unchanged => "User already enrolled in this course",
    };

    let user = service.get(user_id).await?;
    Ok(Json(json!({
        "message": message,
        "user": service.profile(user).await?,
    })))
}

async fn unenroll(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, course_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>> {
    let user_id = parse_id(&id, "user")?;
    let course_id = parse_id(&course_id, "course")?;
    current.ensure_can_modify(user_id)?;

    let service = UserService::new(state.db.clone());
    service.get(user_id).await?;

    let message = match service.unenroll(user_id, course_id).await? {
        EnrollmentChange::Changed => "User unenrolled from course successfully",
        EnrollmentChange::Unchanged => "User not enrolled in this course",
    };

    let user = service.get(user_id).await?;
    Ok(Json(json!({
        "message": message,
        "user": service.profile(user).await?,
    })))
}

#[derive(Debug, Serialize)]
pub struct StrictEnrollResponse {
    pub success: bool,
    pub message: &'static str,
    pub enrolled_course_ids: Vec<Uuid>,
}

/// Strict enrollment: a repeated enrollment is rejected with 400
async fn enroll_strict(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(payload): ValidatedJson<StrictEnrollRequest>,
) -> Result<Json<StrictEnrollResponse>> {
    current.ensure_can_modify(payload.user_id)?;

    let service = UserService::new(state.db.clone());
    service.get(payload.user_id).await?;
    CourseService::new(state.db.clone()).get(payload.course_id).await?;

    if service.enroll(payload.user_id, payload.course_id).await? == EnrollmentChange::Unchanged {
        return Err(AppError::BadRequest("Already enrolled in this course".to_string()));
    }

    Ok(Json(StrictEnrollResponse {
        success: true,
        message: "Successfully enrolled in course",
        enrolled_course_ids: service.enrolled_course_ids(payload.user_id).await?,
    }))
}
