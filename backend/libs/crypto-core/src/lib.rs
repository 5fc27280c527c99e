//! Credential primitives shared by CodeLearn services.
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`session`]: HS256 session tokens carried in the `auth` cookie or a
//!   `Bearer` header

pub mod password;
pub mod session;

pub use password::{decode_legacy_password, hash_password, is_phc_hash, verify_password};
pub use session::{SessionClaims, SessionKeys};

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("invalid password hash format: {0}")]
    InvalidHash(String),

    #[error("session token expired")]
    TokenExpired,

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("token generation failed: {0}")]
    TokenGeneration(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
