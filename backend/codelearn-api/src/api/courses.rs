use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::api::{parse_id, ValidatedJson};
use crate::error::Result;
use crate::middleware::AdminUser;
use crate::models::{Course, CourseFilter, CourseStatistics, CreateCourseRequest, UpdateCourseRequest};
use crate::services::CourseService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/statistics", get(statistics))
        .route("/enrolled-count", get(total_enrolled))
        .route(
            "/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/:id/enrolled-count", get(enrolled_count))
}

async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<Vec<Course>>> {
    let category = filter.category.as_deref().filter(|c| !c.is_empty());
    let courses = CourseService::new(state.db.clone()).list(category).await?;
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>)> {
    let course = CourseService::new(state.db.clone()).create(payload).await?;
    tracing::info!(admin_id = %admin.id, course_id = %course.id, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

async fn get_course(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Course>> {
    let course_id = parse_id(&id, "course")?;
    Ok(Json(CourseService::new(state.db.clone()).get(course_id).await?))
}

#[derive(Debug, Serialize)]
pub struct CourseMessageResponse {
    pub message: &'static str,
    pub course: Course,
}

async fn update_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateCourseRequest>,
) -> Result<Json<CourseMessageResponse>> {
    let course_id = parse_id(&id, "course")?;
    let course = CourseService::new(state.db.clone())
        .update(course_id, payload)
        .await?;

    Ok(Json(CourseMessageResponse {
        message: "Course updated successfully",
        course,
    }))
}

async fn delete_course(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<CourseMessageResponse>> {
    let course_id = parse_id(&id, "course")?;
    let course = CourseService::new(state.db.clone()).delete(course_id).await?;

    tracing::info!(admin_id = %admin.id, course_id = %course_id, "course deleted");
    Ok(Json(CourseMessageResponse {
        message: "Course deleted successfully",
        course,
    }))
}

async fn enrolled_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let course_id = parse_id(&id, "course")?;
    let count = CourseService::new(state.db.clone())
        .enrolled_count(course_id)
        .await?;
    Ok(Json(json!({ "count": count })))
}

async fn total_enrolled(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let total = CourseService::new(state.db.clone()).total_enrolled().await?;
    Ok(Json(json!({ "total": total })))
}

async fn statistics(State(state): State<AppState>) -> Result<Json<CourseStatistics>> {
    Ok(Json(CourseService::new(state.db.clone()).statistics().await?))
}
