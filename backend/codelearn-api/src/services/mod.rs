mod auth_service;
mod comment_service;
mod course_service;
mod post_service;
mod question_service;
mod stats_service;
mod user_service;

pub use auth_service::*;
pub use comment_service::*;
pub use course_service::*;
pub use post_service::*;
pub use question_service::*;
pub use stats_service::*;
pub use user_service::*;
