mod admin;
mod auth;
mod code;
mod comments;
mod courses;
mod posts;
mod questions;
mod stats;
mod users;

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Json, Router,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::AppState;

pub use admin::rehash_on_startup;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/courses", courses::routes())
        .nest("/questions", questions::routes())
        .nest("/posts", posts::routes())
        .nest("/comments", comments::routes())
        .nest("/stats", stats::routes())
        .nest("/code", code::routes())
        .nest("/admin", admin::routes())
}

/// JSON body that has passed its `validator` rules
///
/// Malformed JSON and failed validation both become a 400 in the common
/// error shape instead of axum's plain-text rejection.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}
