//! Database-backed tests: full request flows and the counters they maintain.
//!
//! Each test gets a fresh database from `sqlx::test` with all migrations
//! applied. Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.
//! Redis is not required: revocation lookups fail open and no test logs out.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use codelearn_api::config::Config;
use codelearn_api::db::Database;
use codelearn_api::models::{CreateCourseRequest, Role, User};
use codelearn_api::services::{
    AuthService, CourseService, EnrollmentChange, NewUser, UserChanges, UserService,
};
use codelearn_api::{build_router, AppState};

fn state_for(pool: PgPool) -> AppState {
    let config = Config::test_defaults();
    let redis = redis::Client::open(config.redis.url.as_str()).unwrap();
    AppState::new(Database { pg: pool, redis }, config)
}

async fn create_user(state: &AppState, email: &str, role: Role) -> User {
    let password_hash = crypto_core::hash_password("secret123").unwrap();
    UserService::new(state.db.clone())
        .create(NewUser {
            name: "Test User",
            email,
            password_hash: &password_hash,
            role,
            bio: None,
        })
        .await
        .unwrap()
}

fn token_for(state: &AppState, user: &User) -> String {
    let (token, _) = state
        .sessions
        .issue(user.id, &user.email, &user.name, &user.role, Duration::hours(1))
        .unwrap();
    token
}

async fn create_course(state: &AppState, title: &str) -> Uuid {
    CourseService::new(state.db.clone())
        .create(CreateCourseRequest {
            title: title.to_string(),
            category: "backend".to_string(),
            description: String::new(),
            instructor: String::new(),
            duration: String::new(),
            level: None,
            price: None,
        })
        .await
        .unwrap()
        .id
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn course_students(state: &AppState, course_id: Uuid) -> i32 {
    CourseService::new(state.db.clone())
        .get(course_id)
        .await
        .unwrap()
        .enrolled_students
}

async fn user_courses(state: &AppState, user_id: Uuid) -> i32 {
    UserService::new(state.db.clone())
        .get(user_id)
        .await
        .unwrap()
        .enrolled_courses
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_register_login_and_session(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());

    let response = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"name": "Ada", "email": "ada@example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());

    let duplicate = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"name": "Ada", "email": "ADA@Example.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let wrong = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "Ada@example.COM", "password": "secret123"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth="));
    assert!(cookie.contains("HttpOnly"));

    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["enrolled_course_ids"], json!([]));

    let user = UserService::new(state.db.clone())
        .find_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.last_login_at.is_some());

    let session = body_json(send(&app, "GET", "/api/auth/session", Some(&token), None).await).await;
    assert_eq!(session["authenticated"], true);
    assert_eq!(session["session"]["user"]["email"], "ada@example.com");
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_legacy_credential_upgraded_on_login(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());

    // base64 of "321nimda", the reversed password
    let legacy = UserService::new(state.db.clone())
        .create(NewUser {
            name: "Legacy",
            email: "legacy@example.com",
            password_hash: "MzIxbmltZGE=",
            role: Role::User,
            bio: None,
        })
        .await
        .unwrap();

    let rejected = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "legacy@example.com", "password": "admin124"})),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "legacy@example.com", "password": "admin123"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = UserService::new(state.db.clone()).get(legacy.id).await.unwrap();
    assert!(crypto_core::is_phc_hash(&stored.password_hash));
    assert!(crypto_core::verify_password("admin123", &stored.password_hash).unwrap());
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_rehash_legacy_passwords(pool: PgPool) {
    let state = state_for(pool);
    let users = UserService::new(state.db.clone());

    for (email, stored) in [("a@example.com", "MzIxbmltZGE="), ("b@example.com", "%%%")] {
        users
            .create(NewUser {
                name: "Legacy",
                email,
                password_hash: stored,
                role: Role::User,
                bio: None,
            })
            .await
            .unwrap();
    }
    create_user(&state, "modern@example.com", Role::User).await;

    let auth = AuthService::new(state.db.clone(), state.config.clone(), state.sessions.clone());
    let report = auth.rehash_legacy_passwords().await.unwrap();
    assert_eq!(report.migrated_count, 1);
    assert_eq!(report.skipped_count, 1);

    let again = auth.rehash_legacy_passwords().await.unwrap();
    assert_eq!(again.migrated_count, 0);
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_course_crud_round_trip(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());
    let admin = create_user(&state, "admin@example.com", Role::Admin).await;
    let token = token_for(&state, &admin);

    let response = send(
        &app,
        "POST",
        "/api/courses",
        Some(&token),
        Some(json!({"title": "Rust Basics", "category": "backend", "level": "beginner"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let course = body_json(response).await;
    let id = course["id"].as_str().unwrap().to_string();
    assert_eq!(course["enrolled_students"], 0);

    let listed = body_json(send(&app, "GET", "/api/courses?category=backend", None, None).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let other = body_json(send(&app, "GET", "/api/courses?category=database", None, None).await).await;
    assert!(other.as_array().unwrap().is_empty());

    let updated = body_json(
        send(
            &app,
            "PUT",
            &format!("/api/courses/{}", id),
            Some(&token),
            Some(json!({"title": "Rust Intermediate", "level": "intermediate"})),
        )
        .await,
    )
    .await;
    assert_eq!(updated["message"], "Course updated successfully");
    assert_eq!(updated["course"]["title"], "Rust Intermediate");
    assert_eq!(updated["course"]["category"], "backend");

    let stats = body_json(send(&app, "GET", "/api/courses/statistics", None, None).await).await;
    assert_eq!(stats["total_courses"], 1);
    assert_eq!(stats["level_counts"]["intermediate"], 1);

    let deleted = send(&app, "DELETE", &format!("/api/courses/{}", id), Some(&token), None).await;
    assert_eq!(deleted.status(), StatusCode::OK);

    let missing = send(&app, "GET", &format!("/api/courses/{}", id), None, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_question_solution_visible_only_to_admins(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());
    let admin = create_user(&state, "admin@example.com", Role::Admin).await;
    let token = token_for(&state, &admin);
    let course_id = create_course(&state, "Python").await;

    let missing_course = send(
        &app,
        "POST",
        "/api/questions",
        Some(&token),
        Some(json!({"course_id": Uuid::new_v4(), "title": "Sum", "difficulty": "easy"})),
    )
    .await;
    assert_eq!(missing_course.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/api/questions",
        Some(&token),
        Some(json!({
            "course_id": course_id,
            "title": "Sum",
            "difficulty": "easy",
            "solution": "print(1 + 1)"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["question"]["question_type"], "programming");
    let uri = format!("/api/questions/{}", created["question"]["id"].as_str().unwrap());

    let public = body_json(send(&app, "GET", &uri, None, None).await).await;
    assert!(public.get("solution").is_none());

    let private = body_json(send(&app, "GET", &uri, Some(&token), None).await).await;
    assert_eq!(private["solution"], "print(1 + 1)");

    let filtered = body_json(
        send(&app, "GET", &format!("/api/questions?course_id={}&difficulty=hard", course_id), None, None).await,
    )
    .await;
    assert!(filtered.as_array().unwrap().is_empty());

    let deleted = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(send(&app, "GET", &uri, None, None).await.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_post_lifecycle_and_likes(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());
    let author = create_user(&state, "author@example.com", Role::User).await;
    let stranger = create_user(&state, "stranger@example.com", Role::User).await;
    let author_token = token_for(&state, &author);
    let stranger_token = token_for(&state, &stranger);

    let long_tag = "t".repeat(60);
    let response = send(
        &app,
        "POST",
        "/api/posts",
        Some(&author_token),
        Some(json!({
            "title": "Ownership",
            "content": "Moves and borrows",
            "tags": [" rust ", "rust", "async", long_tag, long_tag]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = body_json(response).await["post"].clone();
    assert_eq!(post["tags"], json!(["async", "rust", "t".repeat(50)]));
    assert_eq!(post["user_id"], author.id.to_string());
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let unliked = body_json(send(&app, "POST", &format!("{}/unlike", uri), None, None).await).await;
    assert_eq!(unliked["post"]["likes"], 0);
    let liked = body_json(send(&app, "POST", &format!("{}/like", uri), None, None).await).await;
    assert_eq!(liked["message"], "Post liked successfully");
    assert_eq!(liked["post"]["likes"], 1);

    let forbidden = send(
        &app,
        "PUT",
        &uri,
        Some(&stranger_token),
        Some(json!({"title": "Hijacked"})),
    )
    .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let updated = body_json(
        send(&app, "PUT", &uri, Some(&author_token), Some(json!({"tags": ["sql"]}))).await,
    )
    .await;
    assert_eq!(updated["tags"], json!(["sql"]));
    assert_eq!(updated["title"], "Ownership");

    let full = body_json(send(&app, "GET", &uri, None, None).await).await;
    assert_eq!(full["user"]["email"], "author@example.com");
    assert_eq!(full["comment_count"], 0);

    let listed = body_json(
        send(&app, "GET", &format!("/api/posts?user_id={}", author.id), None, None).await,
    )
    .await;
    assert_eq!(listed["posts"].as_array().unwrap().len(), 1);
    assert!(listed["posts"][0].get("user").is_none());

    let deleted = body_json(send(&app, "DELETE", &uri, Some(&author_token), None).await).await;
    assert_eq!(deleted, json!({"success": true}));
    assert_eq!(send(&app, "GET", &uri, None, None).await.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_comment_lifecycle(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());
    let author = create_user(&state, "author@example.com", Role::User).await;
    let admin = create_user(&state, "admin@example.com", Role::Admin).await;
    let author_token = token_for(&state, &author);
    let admin_token = token_for(&state, &admin);

    let post = body_json(
        send(
            &app,
            "POST",
            "/api/posts",
            Some(&author_token),
            Some(json!({"title": "Traits", "content": "Static vs dynamic"})),
        )
        .await,
    )
    .await["post"]
        .clone();
    let post_id = post["id"].as_str().unwrap().to_string();

    let orphan = send(
        &app,
        "POST",
        "/api/comments",
        Some(&author_token),
        Some(json!({"post_id": Uuid::new_v4(), "content": "hello"})),
    )
    .await;
    assert_eq!(orphan.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/api/comments",
        Some(&author_token),
        Some(json!({"post_id": post_id, "content": "  Great read  "})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment = body_json(response).await["comment"].clone();
    assert_eq!(comment["content"], "Great read");
    let uri = format!("/api/comments/{}", comment["id"].as_str().unwrap());

    let listed = body_json(
        send(
            &app,
            "GET",
            &format!("/api/comments?post_id={}&with_info=true", post_id),
            None,
            None,
        )
        .await,
    )
    .await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["comments"][0]["post"]["title"], "Traits");

    let unliked = body_json(send(&app, "POST", &format!("{}/unlike", uri), None, None).await).await;
    assert_eq!(unliked["comment"]["likes"], 0);

    let updated = body_json(
        send(&app, "PUT", &uri, Some(&author_token), Some(json!({"content": "Edited"}))).await,
    )
    .await;
    assert_eq!(updated["comment"]["content"], "Edited");

    let post_view = body_json(send(&app, "GET", &format!("/api/posts/{}", post_id), None, None).await).await;
    assert_eq!(post_view["comment_count"], 1);

    let deleted = body_json(send(&app, "DELETE", &uri, Some(&admin_token), None).await).await;
    assert_eq!(deleted["message"], "Comment deleted successfully");
    assert_eq!(send(&app, "GET", &uri, None, None).await.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_enrollment_counters(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());
    let learner = create_user(&state, "learner@example.com", Role::User).await;
    let token = token_for(&state, &learner);
    let course_id = create_course(&state, "SQL").await;
    let users = UserService::new(state.db.clone());

    let response = send(
        &app,
        "POST",
        &format!("/api/users/{}/courses", learner.id),
        Some(&token),
        Some(json!({"course_id": course_id})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User enrolled in course successfully");
    assert_eq!(body["user"]["enrolled_course_ids"], json!([course_id]));
    assert_eq!(course_students(&state, course_id).await, 1);
    assert_eq!(user_courses(&state, learner.id).await, 1);

    let repeat = body_json(
        send(
            &app,
            "POST",
            &format!("/api/users/{}/courses", learner.id),
            Some(&token),
            Some(json!({"course_id": course_id})),
        )
        .await,
    )
    .await;
    assert_eq!(repeat["message"], "User already enrolled in this course");
    assert_eq!(course_students(&state, course_id).await, 1);

    let strict = send(
        &app,
        "POST",
        "/api/users/enroll",
        Some(&token),
        Some(json!({"user_id": learner.id, "course_id": course_id})),
    )
    .await;
    assert_eq!(strict.status(), StatusCode::BAD_REQUEST);

    assert_eq!(
        users.unenroll(learner.id, course_id).await.unwrap(),
        EnrollmentChange::Changed
    );
    assert_eq!(
        users.unenroll(learner.id, course_id).await.unwrap(),
        EnrollmentChange::Unchanged
    );
    assert_eq!(course_students(&state, course_id).await, 0);
    assert_eq!(user_courses(&state, learner.id).await, 0);

    let count = body_json(
        send(&app, "GET", &format!("/api/courses/{}/enrolled-count", course_id), None, None).await,
    )
    .await;
    assert_eq!(count["count"], 0);
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_deletes_keep_enrollment_counters_consistent(pool: PgPool) {
    let state = state_for(pool);
    let users = UserService::new(state.db.clone());
    let courses = CourseService::new(state.db.clone());

    let leaving = create_user(&state, "leaving@example.com", Role::User).await;
    let staying = create_user(&state, "staying@example.com", Role::User).await;
    let kept_course = create_course(&state, "Kept").await;
    let dropped_course = create_course(&state, "Dropped").await;

    for user_id in [leaving.id, staying.id] {
        users.enroll(user_id, kept_course).await.unwrap();
        users.enroll(user_id, dropped_course).await.unwrap();
    }
    assert_eq!(course_students(&state, kept_course).await, 2);

    users.delete(leaving.id).await.unwrap();
    assert_eq!(course_students(&state, kept_course).await, 1);
    assert_eq!(course_students(&state, dropped_course).await, 1);

    courses.delete(dropped_course).await.unwrap();
    assert_eq!(user_courses(&state, staying.id).await, 1);

    let stats = courses.statistics().await.unwrap();
    assert_eq!(stats.total_students, 1);
    assert_eq!(courses.total_enrolled().await.unwrap(), 1);
}

#[sqlx::test(migrator = "codelearn_api::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL database"]
async fn test_demoted_admin_loses_admin_routes(pool: PgPool) {
    let state = state_for(pool);
    let app = build_router(state.clone());
    let admin = create_user(&state, "admin@example.com", Role::Admin).await;
    let token = token_for(&state, &admin);

    let allowed = send(&app, "GET", "/api/users", Some(&token), None).await;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(body_json(allowed).await["count"], 1);

    UserService::new(state.db.clone())
        .update(
            admin.id,
            UserChanges {
                role: Some(Role::User),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let denied = send(&app, "GET", "/api/users", Some(&token), None).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}
