mod comment;
mod course;
mod post;
mod question;
mod user;

pub use comment::*;
pub use course::*;
pub use post::*;
pub use question::*;
pub use user::*;

use validator::ValidationError;

/// Rejects text that is empty once surrounding whitespace is trimmed
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
