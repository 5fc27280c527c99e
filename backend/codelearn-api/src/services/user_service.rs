// User service - accounts, profile updates and course enrollment
use uuid::Uuid;

use crate::db::Database;
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::{Course, Role, UpdateUserRequest, User, UserProfile};

pub struct UserService {
    db: Database,
}

/// New account fields; the password is already hashed
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub bio: Option<&'a str>,
}

/// Profile changes; `password_hash` replaces the plaintext password of the request
#[derive(Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub bio: Option<String>,
}

impl UserChanges {
    pub fn from_request(req: UpdateUserRequest, password_hash: Option<String>) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()),
            email: req.email.map(|e| e.trim().to_string()),
            password_hash,
            role: req.role,
            bio: req.bio,
        }
    }
}

/// Result of an enrollment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentChange {
    Changed,
    Unchanged,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.db.pg)
            .await?;
        Ok(users)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db.pg)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User> {
        self.find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Email lookup is case-insensitive
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.db.pg)
            .await?;
        Ok(user)
    }

    pub async fn enrolled_course_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT course_id FROM user_enrolled_courses WHERE user_id = $1 ORDER BY enrolled_at",
        )
        .bind(user_id)
        .fetch_all(&self.db.pg)
        .await?;
        Ok(ids)
    }

    pub async fn profile(&self, user: User) -> Result<UserProfile> {
        let enrolled_course_ids = self.enrolled_course_ids(user.id).await?;
        Ok(UserProfile {
            user,
            enrolled_course_ids,
        })
    }

    pub async fn create(&self, new_user: NewUser<'_>) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, bio)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_user.name.trim())
        .bind(new_user.email.trim())
        .bind(new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(new_user.bio)
        .fetch_one(&self.db.pg)
        .await;

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "user created");
                Ok(user)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply the provided fields; absent fields keep their stored value
    pub async fn update(&self, user_id: Uuid, changes: UserChanges) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                bio = COALESCE($6, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.bio)
        .fetch_optional(&self.db.pg)
        .await;

        match result {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::NotFound("User not found".to_string())),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a user; courses they were enrolled in lose one student each
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        let mut tx = self.db.pg.begin().await?;

        sqlx::query(
            r#"
            UPDATE courses SET enrolled_students = GREATEST(enrolled_students - 1, 0)
            WHERE id IN (SELECT course_id FROM user_enrolled_courses WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .execute(tx.as_mut())
        .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(tx.as_mut())
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    pub async fn touch_last_login(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.db.pg)
            .await?;
        Ok(())
    }

    pub async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.db.pg)
            .await?;
        Ok(())
    }

    pub async fn enrolled_courses(&self, user_id: Uuid) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT c.*
            FROM courses c
            JOIN user_enrolled_courses e ON e.course_id = c.id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db.pg)
        .await?;
        Ok(courses)
    }

    /// Enroll a user in a course and bump both denormalized counters
    ///
    /// Returns `Unchanged` if the user was already enrolled.
    pub async fn enroll(&self, user_id: Uuid, course_id: Uuid) -> Result<EnrollmentChange> {
        let mut tx = self.db.pg.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO user_enrolled_courses (user_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .execute(tx.as_mut())
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(EnrollmentChange::Unchanged);
        }

        sqlx::query("UPDATE users SET enrolled_courses = enrolled_courses + 1 WHERE id = $1")
            .bind(user_id)
            .execute(tx.as_mut())
            .await?;

        sqlx::query("UPDATE courses SET enrolled_students = enrolled_students + 1 WHERE id = $1")
            .bind(course_id)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, course_id = %course_id, "user enrolled");
        Ok(EnrollmentChange::Changed)
    }

    /// Remove an enrollment; counters never drop below zero
    pub async fn unenroll(&self, user_id: Uuid, course_id: Uuid) -> Result<EnrollmentChange> {
        let mut tx = self.db.pg.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM user_enrolled_courses WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(tx.as_mut())
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(EnrollmentChange::Unchanged);
        }

        sqlx::query(
            "UPDATE users SET enrolled_courses = GREATEST(enrolled_courses - 1, 0) WHERE id = $1",
        )
        .bind(user_id)
        .execute(tx.as_mut())
        .await?;

        sqlx::query(
            "UPDATE courses SET enrolled_students = GREATEST(enrolled_students - 1, 0) WHERE id = $1",
        )
        .bind(course_id)
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, course_id = %course_id, "user unenrolled");
        Ok(EnrollmentChange::Changed)
    }

    /// Accounts whose stored credential is not a PHC hash yet
    pub async fn list_legacy_credentials(&self) -> Result<Vec<(Uuid, String, String)>> {
        let rows: Vec<(Uuid, String, String)> = sqlx::query_as(
            "SELECT id, email, password_hash FROM users WHERE password_hash NOT LIKE '$%'",
        )
        .fetch_all(&self.db.pg)
        .await?;
        Ok(rows)
    }
}
