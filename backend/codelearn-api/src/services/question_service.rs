use sqlx::types::Json;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    check_type_rules, CreateQuestionRequest, DifficultyCounts, Question, QuestionFilter,
    QuestionStatistics, QuestionType, TypeCounts, UpdateQuestionRequest,
};

pub struct QuestionService {
    db: Database,
}

impl QuestionService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List questions; every filter that is present must match
    pub async fn list(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT * FROM questions
            WHERE ($1::uuid IS NULL OR course_id = $1)
              AND ($2::text IS NULL OR difficulty = $2)
              AND ($3::text IS NULL OR question_type = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.course_id)
        .bind(filter.difficulty.map(|d| d.as_str()))
        .bind(filter.question_type.map(|t| t.as_str()))
        .fetch_all(&self.db.pg)
        .await?;
        Ok(questions)
    }

    pub async fn find_by_id(&self, question_id: Uuid) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
            .bind(question_id)
            .fetch_optional(&self.db.pg)
            .await?;
        Ok(question)
    }

    pub async fn get(&self, question_id: Uuid) -> Result<Question> {
        self.find_by_id(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
    }

    async fn ensure_course_exists(&self, course_id: Uuid) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
            .bind(course_id)
            .fetch_one(&self.db.pg)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound("Course not found".to_string()))
        }
    }

    pub async fn create(&self, req: CreateQuestionRequest) -> Result<Question> {
        req.check()?;
        self.ensure_course_exists(req.course_id).await?;

        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (
                id, course_id, title, description, difficulty, question_type,
                code, solution, options, correct_answer
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.course_id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(req.difficulty.as_str())
        .bind(req.question_type.as_str())
        .bind(&req.code)
        .bind(&req.solution)
        .bind(req.options.map(Json))
        .bind(&req.correct_answer)
        .fetch_one(&self.db.pg)
        .await?;

        tracing::info!(question_id = %question.id, course_id = %question.course_id, "question created");
        Ok(question)
    }

    pub async fn update(&self, question_id: Uuid, req: UpdateQuestionRequest) -> Result<Question> {
        let existing = self.get(question_id).await?;

        if let Some(course_id) = req.course_id {
            if course_id != existing.course_id {
                self.ensure_course_exists(course_id).await?;
            }
        }

        // Validate the question as it will look after the update
        let question_type = match req.question_type {
            Some(t) => t,
            None => parse_question_type(&existing.question_type),
        };
        let options = req
            .options
            .clone()
            .or_else(|| existing.options.clone().map(|Json(o)| o));
        let correct_answer = req.correct_answer.clone().or(existing.correct_answer.clone());
        check_type_rules(question_type, options.as_ref(), correct_answer.as_deref())?;

        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions SET
                course_id = COALESCE($2, course_id),
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                difficulty = COALESCE($5, difficulty),
                question_type = COALESCE($6, question_type),
                code = COALESCE($7, code),
                solution = COALESCE($8, solution),
                options = COALESCE($9, options),
                correct_answer = COALESCE($10, correct_answer),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(question_id)
        .bind(req.course_id)
        .bind(req.title.as_deref().map(str::trim))
        .bind(req.description)
        .bind(req.difficulty.map(|d| d.as_str()))
        .bind(req.question_type.map(|t| t.as_str()))
        .bind(req.code)
        .bind(req.solution)
        .bind(req.options.map(Json))
        .bind(req.correct_answer)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        Ok(question)
    }

    pub async fn delete(&self, question_id: Uuid) -> Result<Question> {
        let question =
            sqlx::query_as::<_, Question>("DELETE FROM questions WHERE id = $1 RETURNING *")
                .bind(question_id)
                .fetch_optional(&self.db.pg)
                .await?
                .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        tracing::info!(question_id = %question.id, "question deleted");
        Ok(question)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.db.pg)
            .await?;
        Ok(count)
    }

    pub async fn statistics(&self) -> Result<QuestionStatistics> {
        let total_questions = self.count().await?;

        let by_difficulty: Vec<(String, i64)> =
            sqlx::query_as("SELECT difficulty, COUNT(*) FROM questions GROUP BY difficulty")
                .fetch_all(&self.db.pg)
                .await?;

        let by_type: Vec<(String, i64)> =
            sqlx::query_as("SELECT question_type, COUNT(*) FROM questions GROUP BY question_type")
                .fetch_all(&self.db.pg)
                .await?;

        let mut difficulty_count = DifficultyCounts::default();
        for (difficulty, n) in by_difficulty {
            match difficulty.as_str() {
                "easy" => difficulty_count.easy = n,
                "medium" => difficulty_count.medium = n,
                "hard" => difficulty_count.hard = n,
                _ => {}
            }
        }

        let mut type_count = TypeCounts::default();
        for (question_type, n) in by_type {
            match parse_question_type(&question_type) {
                QuestionType::Programming => type_count.programming += n,
                QuestionType::MultipleChoice => type_count.multiple_choice += n,
                QuestionType::TrueFalse => type_count.true_false += n,
            }
        }

        Ok(QuestionStatistics {
            total_questions,
            difficulty_count,
            type_count,
        })
    }
}

fn parse_question_type(s: &str) -> QuestionType {
    match s {
        "multiple_choice" => QuestionType::MultipleChoice,
        "true_false" => QuestionType::TrueFalse,
        _ => QuestionType::Programming,
    }
}
