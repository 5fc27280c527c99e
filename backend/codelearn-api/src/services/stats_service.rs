// Platform-wide counters for the dashboard
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct PlatformStats {
    pub users: i64,
    pub courses: i64,
    pub questions: i64,
}

pub struct StatsService {
    db: Database,
}

impl StatsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn platform(&self) -> Result<PlatformStats> {
        let (users, courses, questions): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM courses),
                (SELECT COUNT(*) FROM questions)
            "#,
        )
        .fetch_one(&self.db.pg)
        .await?;

        Ok(PlatformStats {
            users,
            courses,
            questions,
        })
    }
}
