use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Programming,
    MultipleChoice,
    TrueFalse,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Programming => "programming",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
        }
    }
}

/// Answer choices for multiple-choice questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOptions {
    pub options: Vec<String>,
    pub correct_answer: usize,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub question_type: String,
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    pub options: Option<Json<ChoiceOptions>>,
    pub correct_answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Strip the reference solution before showing the question to a learner
    pub fn for_learner(mut self) -> Self {
        self.solution = None;
        self
    }
}

fn validate_choice_options(options: &ChoiceOptions) -> Result<(), ValidationError> {
    if options.options.len() < 2 {
        return Err(ValidationError::new("too_few_options"));
    }
    if options.options.iter().any(|o| o.trim().is_empty()) {
        return Err(ValidationError::new("empty_option"));
    }
    if options.correct_answer >= options.options.len() {
        return Err(ValidationError::new("correct_answer_out_of_range"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub course_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title is required"), custom(function = "not_blank"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub question_type: QuestionType,
    pub code: Option<String>,
    pub solution: Option<String>,
    #[validate(custom(function = "validate_choice_options"))]
    pub options: Option<ChoiceOptions>,
    pub correct_answer: Option<String>,
}

impl CreateQuestionRequest {
    /// Field checks plus the rules that depend on the question type
    pub fn check(&self) -> Result<(), crate::error::AppError> {
        self.validate()?;
        check_type_rules(self.question_type, self.options.as_ref(), self.correct_answer.as_deref())
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    pub course_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub question_type: Option<QuestionType>,
    pub code: Option<String>,
    pub solution: Option<String>,
    #[validate(custom(function = "validate_choice_options"))]
    pub options: Option<ChoiceOptions>,
    pub correct_answer: Option<String>,
}

/// Multiple-choice questions need options; true/false answers must be a boolean word
pub fn check_type_rules(
    question_type: QuestionType,
    options: Option<&ChoiceOptions>,
    correct_answer: Option<&str>,
) -> Result<(), crate::error::AppError> {
    use crate::error::AppError;

    match question_type {
        QuestionType::MultipleChoice if options.is_none() => Err(AppError::BadRequest(
            "Multiple choice questions require options".to_string(),
        )),
        QuestionType::TrueFalse => match correct_answer {
            Some("true") | Some("false") | None => Ok(()),
            Some(_) => Err(AppError::BadRequest(
                "True/false answers must be \"true\" or \"false\"".to_string(),
            )),
        },
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionFilter {
    pub course_id: Option<Uuid>,
    pub difficulty: Option<Difficulty>,
    pub question_type: Option<QuestionType>,
}

#[derive(Debug, Default, Serialize)]
pub struct DifficultyCounts {
    pub easy: i64,
    pub medium: i64,
    pub hard: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct TypeCounts {
    pub programming: i64,
    pub multiple_choice: i64,
    pub true_false: i64,
}

#[derive(Debug, Serialize)]
pub struct QuestionStatistics {
    pub total_questions: i64,
    pub difficulty_count: DifficultyCounts,
    pub type_count: TypeCounts,
}
