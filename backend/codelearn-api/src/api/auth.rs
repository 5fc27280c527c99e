use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::ValidatedJson;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{LoginRequest, RegisterRequest, UserProfile};
use crate::services::{AuthService, UserService};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), state.config.clone(), state.sessions.clone())
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: UserProfile,
}

async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let user = auth_service(&state).register(&payload).await?;
    let profile = UserService::new(state.db.clone()).profile(user).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful",
            token: None,
            user: profile,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let (user, token, _claims) = auth_service(&state)
        .login(&payload.email, &payload.password)
        .await?;
    let profile = UserService::new(state.db.clone()).profile(user).await?;

    let cookie = Cookie::build((state.config.session.cookie_name.clone(), token.clone()))
        .http_only(true)
        .secure(state.config.session.secure_cookie)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            message: "Login successful",
            token: Some(token),
            user: profile,
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    if let Some(user) = user {
        auth_service(&state).logout(&user).await?;
    }

    let removal = Cookie::build((state.config.session.cookie_name.clone(), "")).path("/");

    Ok((
        jar.remove(removal),
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub enrolled_course_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: SessionUser,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub session: Option<SessionInfo>,
}

/// Report the caller's session; a missing or invalid token is not an error
async fn session(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
) -> Result<Json<SessionResponse>> {
    let Some(user) = user else {
        return Ok(Json(SessionResponse {
            authenticated: false,
            session: None,
        }));
    };

    let enrolled_course_ids = UserService::new(state.db.clone())
        .enrolled_course_ids(user.id)
        .await?;

    Ok(Json(SessionResponse {
        authenticated: true,
        session: Some(SessionInfo {
            expires_at: user.expires_at,
            user: SessionUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role.as_str().to_string(),
                enrolled_course_ids,
            },
        }),
    }))
}
