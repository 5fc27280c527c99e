use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub instructor: String,
    pub duration: String,
    pub level: String,
    pub price: f64,
    pub enrolled_students: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required"), custom(function = "not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 50, message = "Category is required"), custom(function = "not_blank"))]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub instructor: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub duration: String,
    pub level: Option<CourseLevel>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub instructor: Option<String>,
    #[validate(length(max = 100))]
    pub duration: Option<String>,
    pub level: Option<CourseLevel>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CourseFilter {
    pub category: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CategoryCounts {
    pub frontend: i64,
    pub backend: i64,
    pub database: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct LevelCounts {
    pub beginner: i64,
    pub intermediate: i64,
    pub advanced: i64,
}

#[derive(Debug, Serialize)]
pub struct CourseStatistics {
    pub total_courses: i64,
    pub total_students: i64,
    pub category_counts: CategoryCounts,
    pub level_counts: LevelCounts,
}
