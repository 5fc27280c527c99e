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
use crate::middleware::{AdminUser, CurrentUser};
use crate::models::{
    CreateQuestionRequest, Question, QuestionFilter, QuestionStatistics, UpdateQuestionRequest,
};
use crate::services::QuestionService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/statistics", get(statistics))
        .route(
            "/:id",
            get(get_question)
                .put(update_question)
                .delete(delete_question),
        )
}

fn sees_solution(user: &Option<CurrentUser>) -> bool {
    user.as_ref().is_some_and(CurrentUser::is_admin)
}

fn present(question: Question, show_solution: bool) -> Question {
    if show_solution {
        question
    } else {
        question.for_learner()
    }
}

async fn list_questions(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(filter): Query<QuestionFilter>,
) -> Result<Json<Vec<Question>>> {
    let show_solution = sees_solution(&user);
    let questions = QuestionService::new(state.db.clone()).list(&filter).await?;

    Ok(Json(
        questions
            .into_iter()
            .map(|q| present(q, show_solution))
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct QuestionMessageResponse {
    pub message: &'static str,
    pub question: Question,
}

async fn create_question(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<QuestionMessageResponse>)> {
    let question = QuestionService::new(state.db.clone()).create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(QuestionMessageResponse {
            message: "Question created successfully",
            question,
        }),
    ))
}

async fn get_question(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Question>> {
    let question_id = parse_id(&id, "question")?;
    let question = QuestionService::new(state.db.clone()).get(question_id).await?;
    Ok(Json(present(question, sees_solution(&user))))
}

async fn update_question(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateQuestionRequest>,
) -> Result<Json<QuestionMessageResponse>> {
    let question_id = parse_id(&id, "question")?;
    let question = QuestionService::new(state.db.clone())
        .update(question_id, payload)
        .await?;

    Ok(Json(QuestionMessageResponse {
        message: "Question updated successfully",
        question,
    }))
}

async fn delete_question(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let question_id = parse_id(&id, "question")?;
    QuestionService::new(state.db.clone()).delete(question_id).await?;

    tracing::info!(admin_id = %admin.id, question_id = %question_id, "question deleted");
    Ok(Json(json!({ "message": "Question deleted successfully" })))
}

async fn statistics(State(state): State<AppState>) -> Result<Json<QuestionStatistics>> {
    Ok(Json(QuestionService::new(state.db.clone()).statistics().await?))
}
