/// Session tokens for CodeLearn services
///
/// Tokens are HS256 JWTs signed with a shared secret from configuration.
/// Each token carries a `jti` so a single session can be revoked on logout.
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CryptoError, Result};

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub email: String,
    pub name: String,
    /// "admin" or "user"
    pub role: String,
    /// Token ID, used for revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| CryptoError::InvalidToken(format!("invalid subject: {e}")))
    }

    /// Seconds until expiry, never negative
    pub fn remaining_secs(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}

/// Signing and verification keys derived from one shared secret
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a session token valid for `ttl`
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
        role: &str,
        ttl: Duration,
    ) -> Result<(String, SessionClaims)> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| CryptoError::TokenGeneration(e.to_string()))?;

        Ok((token, claims))
    }

    /// Validate signature and expiry, returning the embedded claims
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.validate_exp = true;

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CryptoError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "session token rejected");
                    CryptoError::InvalidToken(e.to_string())
                }
            })
    }
}
