use axum::{extract::State, routing::get, Json, Router};

use crate::error::Result;
use crate::services::{PlatformStats, StatsService};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(platform_stats))
}

async fn platform_stats(State(state): State<AppState>) -> Result<Json<PlatformStats>> {
    Ok(Json(StatsService::new(state.db.clone()).platform().await?))
}
