use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::AdminUser;
use crate::services::AuthService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/rehash-passwords", post(rehash_passwords))
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), state.config.clone(), state.sessions.clone())
}

#[derive(Debug, Serialize)]
pub struct RehashResponse {
    pub success: bool,
    pub message: String,
    pub migrated_count: usize,
}

async fn rehash_passwords(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<RehashResponse>> {
    tracing::info!(admin_id = %admin.id, "admin triggered password migration");
    let report = auth_service(&state).rehash_legacy_passwords().await?;

    Ok(Json(RehashResponse {
        success: true,
        message: format!(
            "Password migration completed. Migrated {} passwords.",
            report.migrated_count
        ),
        migrated_count: report.migrated_count,
    }))
}

/// Upgrade legacy credentials before serving traffic; failures are logged, not fatal
pub async fn rehash_on_startup(state: &AppState) {
    match auth_service(state).rehash_legacy_passwords().await {
        Ok(report) if report.skipped_count > 0 => {
            tracing::warn!(
                migrated = report.migrated_count,
                skipped = report.skipped_count,
                "some stored passwords could not be migrated"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "password migration at startup failed"),
    }
}
