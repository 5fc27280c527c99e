use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use crypto_core::SessionClaims;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::Role;
use crate::AppState;

const REVOKED_KEY_PREFIX: &str = "session:revoked:";

/// Authenticated caller, resolved from the session token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub jti: String,
    /// Unix timestamp at which the session token expires
    pub expires_at: i64,
}

impl CurrentUser {
    pub fn from_claims(claims: SessionClaims) -> Result<Self> {
        Ok(Self {
            id: claims.user_id()?,
            role: Role::parse(&claims.role),
            email: claims.email,
            name: claims.name,
            jti: claims.jti,
            expires_at: claims.exp,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners may modify their own resources; admins may modify anything
    pub fn can_modify(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.id == owner_id
    }

    pub fn ensure_can_modify(&self, owner_id: Uuid) -> Result<()> {
        if self.can_modify(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        (self.expires_at - chrono::Utc::now().timestamp()).max(0) as u64
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Caller with the admin role; rejects everyone else with 403
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::debug!(user_id = %user.id, "non-admin rejected from admin route");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

/// Session token from `Authorization: Bearer ...`, falling back to the session cookie
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

fn revoked_key(jti: &str) -> String {
    format!("{}{}", REVOKED_KEY_PREFIX, jti)
}

/// Mark a session as revoked until its token would have expired anyway
pub async fn revoke_session(db: &Database, jti: &str, ttl_secs: u64) -> Result<()> {
    let mut conn = db
        .get_redis_conn()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Redis connection failed: {}", e)))?;

    conn.set_ex::<_, _, ()>(revoked_key(jti), "1", ttl_secs.max(1))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session revocation failed: {}", e)))?;

    Ok(())
}

/// Revocation lookups fail open: an unreachable Redis is logged and the
/// token's own signature and expiry checks still apply.
async fn is_revoked(db: &Database, jti: &str) -> bool {
    let mut conn = match db.get_redis_conn().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "redis unavailable, skipping revocation check");
            return false;
        }
    };

    match conn.exists::<_, bool>(revoked_key(jti)).await {
        Ok(revoked) => revoked,
        Err(e) => {
            tracing::warn!(error = %e, "revocation lookup failed");
            false
        }
    }
}

pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<CurrentUser> {
    let token = extract_token(headers, &state.config.session.cookie_name)?;

    let claims = match state.sessions.validate(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring invalid session token");
            return None;
        }
    };

    if is_revoked(&state.db, &claims.jti).await {
        tracing::debug!(jti = %claims.jti, "session has been revoked");
        return None;
    }

    let mut user = CurrentUser::from_claims(claims).ok()?;
    if user.is_admin() {
        user.role = stored_role(&state.db, user.id).await?;
    }
    Some(user)
}

/// Role as currently stored, so a demoted admin loses admin rights immediately
///
/// `None` means the account no longer exists. A failed lookup grants the
/// ordinary user role.
async fn stored_role(db: &Database, user_id: Uuid) -> Option<Role> {
    let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&db.pg)
        .await;

    match role {
        Ok(role) => role.as_deref().map(Role::parse),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "role lookup failed, treating admin token as user");
            Some(Role::User)
        }
    }
}

/// Attach the caller's session to the request, if there is a valid one
///
/// Never rejects: handlers decide whether a session is required by
/// extracting [`CurrentUser`], [`AdminUser`] or `Option<CurrentUser>`.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = authenticate(&state, request.headers()).await {
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}
