// Auth service - registration, login, logout and credential upgrades
use crypto_core::{
    decode_legacy_password, hash_password, is_phc_hash, verify_password, SessionClaims, SessionKeys,
};
use serde::Serialize;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::{auth::revoke_session, CurrentUser};
use crate::models::{RegisterRequest, Role, User};
use super::user_service::{NewUser, UserService};

pub struct AuthService {
    db: Database,
    config: Config,
    sessions: SessionKeys,
}

/// Outcome of a legacy credential upgrade run
#[derive(Debug, Default, Serialize)]
pub struct RehashReport {
    pub migrated_count: usize,
    pub skipped_count: usize,
}

impl AuthService {
    pub fn new(db: Database, config: Config, sessions: SessionKeys) -> Self {
        Self {
            db,
            config,
            sessions,
        }
    }

    fn users(&self) -> UserService {
        UserService::new(self.db.clone())
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<User> {
        let users = self.users();

        if users.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&req.password)?;

        users
            .create(NewUser {
                name: &req.name,
                email: &req.email,
                password_hash: &password_hash,
                role: Role::User,
                bio: req.bio.as_deref(),
            })
            .await
    }

    /// Check credentials and issue a session token
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String, SessionClaims)> {
        let users = self.users();

        let user = users
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.check_password(&user, password).await? {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        users.touch_last_login(user.id).await?;

        let (token, claims) = self.sessions.issue(
            user.id,
            &user.email,
            &user.name,
            &user.role,
            self.config.session.ttl(),
        )?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok((user, token, claims))
    }

    /// Verify a password, upgrading a legacy stored credential in place on success
    async fn check_password(&self, user: &User, password: &str) -> Result<bool> {
        if is_phc_hash(&user.password_hash) {
            return Ok(verify_password(password, &user.password_hash)?);
        }

        match decode_legacy_password(&user.password_hash) {
            Some(legacy) if legacy == password => {
                let upgraded = hash_password(password)?;
                self.users().set_password_hash(user.id, &upgraded).await?;
                tracing::info!(user_id = %user.id, "legacy credential upgraded on login");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Revoke the caller's session for the rest of its lifetime
    pub async fn logout(&self, user: &CurrentUser) -> Result<()> {
        revoke_session(&self.db, &user.jti, user.remaining_secs()).await?;
        tracing::info!(user_id = %user.id, "user logged out");
        Ok(())
    }

    /// Re-hash every stored credential that is still in the legacy format
    pub async fn rehash_legacy_passwords(&self) -> Result<RehashReport> {
        let users = self.users();
        let mut report = RehashReport::default();

        for (user_id, email, stored) in users.list_legacy_credentials().await? {
            match decode_legacy_password(&stored) {
                Some(password) => {
                    let hash = hash_password(&password)?;
                    users.set_password_hash(user_id, &hash).await?;
                    report.migrated_count += 1;
                    tracing::info!(user_id = %user_id, email = %email, "migrated legacy password");
                }
                None => {
                    report.skipped_count += 1;
                    tracing::warn!(user_id = %user_id, email = %email, "stored password is not in a known format");
                }
            }
        }

        if report.migrated_count == 0 {
            tracing::info!("no passwords needed migration");
        } else {
            tracing::info!(migrated = report.migrated_count, "password migration completed");
        }

        Ok(report)
    }
}
