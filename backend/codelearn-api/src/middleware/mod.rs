pub mod auth;

pub use auth::{resolve_session, AdminUser, CurrentUser};
