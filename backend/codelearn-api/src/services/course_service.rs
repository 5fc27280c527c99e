use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    CategoryCounts, Course, CourseLevel, CourseStatistics, CreateCourseRequest, LevelCounts,
    UpdateCourseRequest,
};

pub struct CourseService {
    db: Database,
}

impl CourseService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE ($1::text IS NULL OR category = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(category)
        .fetch_all(&self.db.pg)
        .await?;
        Ok(courses)
    }

    pub async fn find_by_id(&self, course_id: Uuid) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.db.pg)
            .await?;
        Ok(course)
    }

    pub async fn get(&self, course_id: Uuid) -> Result<Course> {
        self.find_by_id(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    pub async fn create(&self, req: CreateCourseRequest) -> Result<Course> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, title, category, description, instructor, duration, level, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.title.trim())
        .bind(req.category.trim())
        .bind(&req.description)
        .bind(&req.instructor)
        .bind(&req.duration)
        .bind(req.level.unwrap_or(CourseLevel::Beginner).as_str())
        .bind(req.price.unwrap_or(0.0))
        .fetch_one(&self.db.pg)
        .await?;

        tracing::info!(course_id = %course.id, "course created");
        Ok(course)
    }

    pub async fn update(&self, course_id: Uuid, req: UpdateCourseRequest) -> Result<Course> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses SET
                title = COALESCE($2, title),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                instructor = COALESCE($5, instructor),
                duration = COALESCE($6, duration),
                level = COALESCE($7, level),
                price = COALESCE($8, price),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(req.title.as_deref().map(str::trim))
        .bind(req.category.as_deref().map(str::trim))
        .bind(req.description)
        .bind(req.instructor)
        .bind(req.duration)
        .bind(req.level.map(|l| l.as_str()))
        .bind(req.price)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    /// Delete a course, returning the removed row
    ///
    /// Enrolled users' course counters are lowered in the same transaction.
    pub async fn delete(&self, course_id: Uuid) -> Result<Course> {
        let mut tx = self.db.pg.begin().await?;

        sqlx::query(
            r#"
            UPDATE users SET enrolled_courses = GREATEST(enrolled_courses - 1, 0)
            WHERE id IN (SELECT user_id FROM user_enrolled_courses WHERE course_id = $1)
            "#,
        )
        .bind(course_id)
        .execute(tx.as_mut())
        .await?;

        let course = sqlx::query_as::<_, Course>("DELETE FROM courses WHERE id = $1 RETURNING *")
            .bind(course_id)
            .fetch_optional(tx.as_mut())
            .await?;

        let Some(course) = course else {
            tx.rollback().await?;
            return Err(AppError::NotFound("Course not found".to_string()));
        };

        tx.commit().await?;

        tracing::info!(course_id = %course.id, "course deleted");
        Ok(course)
    }

    /// Number of users enrolled in one course
    pub async fn enrolled_count(&self, course_id: Uuid) -> Result<i64> {
        self.get(course_id).await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_enrolled_courses WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&self.db.pg)
                .await?;
        Ok(count)
    }

    /// Number of enrollments across all courses
    pub async fn total_enrolled(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_enrolled_courses")
            .fetch_one(&self.db.pg)
            .await?;
        Ok(total)
    }

    pub async fn statistics(&self) -> Result<CourseStatistics> {
        let (total_courses, total_students): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(enrolled_students), 0)::BIGINT FROM courses",
        )
        .fetch_one(&self.db.pg)
        .await?;

        let by_category: Vec<(String, i64)> =
            sqlx::query_as("SELECT category, COUNT(*) FROM courses GROUP BY category")
                .fetch_all(&self.db.pg)
                .await?;

        let by_level: Vec<(String, i64)> =
            sqlx::query_as("SELECT level, COUNT(*) FROM courses GROUP BY level")
                .fetch_all(&self.db.pg)
                .await?;

        Ok(CourseStatistics {
            total_courses,
            total_students,
            category_counts: tally_categories(&by_category),
            level_counts: tally_levels(&by_level),
        })
    }
}

/// Categories outside the three tracked ones are not counted
fn tally_categories(rows: &[(String, i64)]) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for (category, n) in rows {
        match category.to_ascii_lowercase().as_str() {
            "frontend" => counts.frontend += n,
            "backend" => counts.backend += n,
            "database" => counts.database += n,
            _ => {}
        }
    }
    counts
}

fn tally_levels(rows: &[(String, i64)]) -> LevelCounts {
    let mut counts = LevelCounts::default();
    for (level, n) in rows {
        match level.as_str() {
            "beginner" => counts.beginner += n,
            "intermediate" => counts.intermediate += n,
            "advanced" => counts.advanced += n,
            _ => {}
        }
    }
    counts
}
