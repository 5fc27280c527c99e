use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use code_runner::{ExecutionOutcome, Language};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::services::QuestionService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/execute", post(execute))
}

#[derive(Debug, Deserialize)]
pub struct TestMode {
    pub solution_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: Option<String>,
    pub question_id: Option<Uuid>,
    pub action: Option<String>,
    pub language: Option<String>,
    pub test_mode: Option<TestMode>,
}

/// Runner failures are reported in the body, not through the error envelope
fn failure(status: StatusCode, output: &str) -> Response {
    (status, Json(ExecutionOutcome::failed(output))).into_response()
}

async fn execute(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected code request body");
            return Ok(failure(StatusCode::BAD_REQUEST, "Invalid request body."));
        }
    };

    let code = match payload.code.as_deref() {
        Some(code) if !code.trim().is_empty() => code,
        _ => return Ok(failure(StatusCode::BAD_REQUEST, "No code provided.")),
    };

    let language: Language = match payload.language.as_deref().unwrap_or("javascript").parse() {
        Ok(language) => language,
        Err(_) => return Ok(failure(StatusCode::BAD_REQUEST, "Unsupported language.")),
    };

    if let Some(test_mode) = payload.test_mode {
        let result = state
            .runner
            .compare(code, &test_mode.solution_code, language)
            .await;
        return Ok(Json(json!({ "test_result": result })).into_response());
    }

    match payload.action.as_deref().unwrap_or("execute") {
        "execute" => {
            tracing::debug!(language = %language, "executing submission");
            Ok(Json(state.runner.execute(code, language).await).into_response())
        }
        "check" => {
            let question = match payload.question_id {
                Some(id) => QuestionService::new(state.db.clone()).find_by_id(id).await?,
                None => None,
            };
            let Some(solution) = question.and_then(|q| q.solution) else {
                return Ok(failure(StatusCode::NOT_FOUND, "Question not found."));
            };

            let outcome = state.runner.check_solution(code, &solution, language).await;
            tracing::info!(
                question_id = ?payload.question_id,
                correct = outcome.success,
                "checked submission"
            );
            Ok(Json(outcome).into_response())
        }
        _ => Ok(failure(StatusCode::BAD_REQUEST, "Invalid action.")),
    }
}
