//! Router-level tests that never reach PostgreSQL.
//!
//! The pool is created lazily and every request below is answered before a
//! query would run: auth extractors, id parsing, validation and the code
//! endpoint's request checks all happen first.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use codelearn_api::config::Config;
use codelearn_api::db::Database;
use codelearn_api::{build_router, AppState};

fn test_state() -> AppState {
    let config = Config::test_defaults();
    let db = Database::connect_lazy(&config).expect("lazy database handles");
    AppState::new(db, config)
}

fn app() -> (Router, AppState) {
    let state = test_state();
    (build_router(state.clone()), state)
}

fn token_for(state: &AppState, role: &str) -> String {
    let (token, _) = state
        .sessions
        .issue(Uuid::new_v4(), "learner@example.com", "Learner", role, Duration::hours(1))
        .unwrap();
    token
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (app, _) = app();

    let requests = vec![
        Request::get("/api/users").body(Body::empty()).unwrap(),
        json_request("POST", "/api/posts", json!({"title": "t", "content": "c"})),
        json_request(
            "POST",
            "/api/comments",
            json!({"post_id": Uuid::new_v4(), "content": "hi"}),
        ),
        json_request("POST", "/api/admin/rehash-passwords", json!({})),
    ];

    for request in requests {
        let uri = request.uri().clone();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_invalid_token_is_treated_as_anonymous() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::get("/api/users")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let (app, state) = app();
    let token = token_for(&state, "user");

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/users")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut create = json_request(
        "POST",
        "/api/courses",
        json!({"title": "Rust", "category": "backend"}),
    );
    create.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    let response = app.oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let (app, state) = app();
    let token = token_for(&state, "user");

    let response = app
        .oneshot(
            Request::get("/api/users")
                .header(header::COOKIE, format!("auth={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Authenticated but not an admin
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_session_without_token() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/api/auth/session").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"authenticated": false, "session": null}));
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({"name": "Ada", "email": "not-an-email", "password": "secret123"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let (app, _) = app();

    let response = app
        .oneshot(
            Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_invalid_ids_are_bad_requests() {
    let (app, _) = app();

    for (uri, message) in [
        ("/api/courses/abc", "Invalid course ID"),
        ("/api/questions/42", "Invalid question ID"),
        ("/api/posts/xyz", "Invalid post ID"),
        ("/api/comments/1", "Invalid comment ID"),
    ] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], message);
    }
}

#[tokio::test]
async fn test_code_requires_code() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/code/execute",
            json!({"code": "   ", "action": "execute"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["output"], "No code provided.");
}

#[tokio::test]
async fn test_code_rejects_unknown_action() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/code/execute",
            json!({"code": "console.log(1)", "action": "deploy"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["output"], "Invalid action.");
}

#[tokio::test]
async fn test_code_rejects_unsupported_language() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/code/execute",
            json!({"code": "puts 1", "language": "ruby", "action": "execute"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["output"], "Unsupported language.");
}

#[tokio::test]
async fn test_code_syntax_error_reported_without_running() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/code/execute",
            json!({"code": "print 'hello'", "language": "python", "action": "execute"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["syntax_error"], true);
    assert_eq!(
        body["output"],
        "Syntax Error: Missing parentheses in print statement"
    );
}

#[tokio::test]
async fn test_code_bad_body_keeps_runner_shape() {
    let (app, _) = app();

    let malformed = Request::post("/api/code/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"code\": "))
        .unwrap();
    let bad_question_id = json_request(
        "POST",
        "/api/code/execute",
        json!({"code": "print(1)", "action": "check", "question_id": "seven"}),
    );

    for request in [malformed, bad_question_id] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["output"], "Invalid request body.");
    }
}
