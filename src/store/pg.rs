// src/store/pg.rs

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::blueprint::{CreateBlueprintRequest, ExamBlueprint};
use crate::models::exam_result::{ExamResult, NewExamResult};
use crate::models::question::{CreateQuestionRequest, Question};
use crate::store::{BlueprintStore, QuestionFilter, QuestionStore, ResultStore};

/// Postgres-backed implementation of the three storage contracts.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn insert_question(
        &self,
        institution_id: Uuid,
        req: CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO institution_questions
            (institution_id, question_type, subject, topic, difficulty,
             question_text, passage_text, choices, answer_key, explanation, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(institution_id)
        .bind(req.question_type.as_str())
        .bind(&req.subject)
        .bind(&req.topic)
        .bind(req.difficulty.to_string())
        .bind(&req.question_text)
        .bind(&req.passage_text)
        .bind(Json(&req.choices))
        .bind(&req.answer_key)
        .bind(&req.explanation)
        .bind(Json(&req.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(question)
    }

    async fn questions_by_ids(
        &self,
        institution_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Question>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT * FROM institution_questions
            WHERE institution_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(institution_id)
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch questions by ids: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(questions)
    }

    async fn list_questions(
        &self,
        institution_id: Uuid,
        filter: QuestionFilter,
    ) -> Result<Vec<Question>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM institution_questions WHERE institution_id = ");
        builder.push_bind(institution_id);

        if let Some(subject) = &filter.subject {
            builder.push(" AND subject = ");
            builder.push_bind(subject.clone());
        }

        if let Some(topic) = &filter.topic {
            builder.push(" AND topic = ");
            builder.push_bind(topic.clone());
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(filter.limit());
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset());

        let questions = builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list questions: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(questions)
    }
}

#[async_trait]
impl BlueprintStore for PgStore {
    async fn insert_blueprint(
        &self,
        institution_id: Uuid,
        req: CreateBlueprintRequest,
    ) -> Result<ExamBlueprint, AppError> {
        let blueprint = sqlx::query_as::<_, ExamBlueprint>(
            r#"
            INSERT INTO institution_exam_blueprints
            (institution_id, name, exam_type, duration_minutes, question_count, question_ids, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(institution_id)
        .bind(&req.name)
        .bind(&req.exam_type)
        .bind(req.duration_minutes)
        .bind(req.question_ids.len() as i32)
        .bind(Json(&req.question_ids))
        .bind(Json(&req.metadata))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert blueprint: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(blueprint)
    }

    async fn blueprint_by_id(
        &self,
        institution_id: Uuid,
        blueprint_id: Uuid,
    ) -> Result<Option<ExamBlueprint>, AppError> {
        let blueprint = sqlx::query_as::<_, ExamBlueprint>(
            r#"
            SELECT * FROM institution_exam_blueprints
            WHERE institution_id = $1 AND id = $2
            "#,
        )
        .bind(institution_id)
        .bind(blueprint_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch blueprint: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(blueprint)
    }

    async fn list_blueprints(&self, institution_id: Uuid) -> Result<Vec<ExamBlueprint>, AppError> {
        let blueprints = sqlx::query_as::<_, ExamBlueprint>(
            r#"
            SELECT * FROM institution_exam_blueprints
            WHERE institution_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list blueprints: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(blueprints)
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn insert_result(&self, new: NewExamResult) -> Result<ExamResult, AppError> {
        // Insert-or-fetch on the attempt id so a double submit never
        // creates a second record for the same attempt.
        let inserted = sqlx::query_as::<_, ExamResult>(
            r#"
            INSERT INTO institution_exam_results
            (attempt_id, institution_id, user_id, student_id, exam_blueprint_id,
             question_ids, answers, correct_count, wrong_count, empty_count,
             score, duration_seconds, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (attempt_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(new.attempt_id)
        .bind(new.institution_id)
        .bind(new.user_id)
        .bind(new.student_id)
        .bind(new.exam_blueprint_id)
        .bind(Json(&new.question_ids))
        .bind(Json(&new.answers))
        .bind(new.correct_count)
        .bind(new.wrong_count)
        .bind(new.empty_count)
        .bind(new.score)
        .bind(new.duration_seconds)
        .bind(Json(&new.metadata))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert exam result: {:?}", e);
            AppError::Persistence(e.to_string())
        })?;

        if let Some(result) = inserted {
            return Ok(result);
        }

        // Conflict path: the attempt was already recorded.
        let existing = sqlx::query_as::<_, ExamResult>(
            "SELECT * FROM institution_exam_results WHERE attempt_id = $1",
        )
        .bind(new.attempt_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch existing exam result: {:?}", e);
            AppError::Persistence(e.to_string())
        })?;

        tracing::warn!(
            attempt_id = %new.attempt_id,
            "duplicate submission, returning existing result"
        );
        Ok(existing)
    }

    async fn list_results(
        &self,
        institution_id: Uuid,
        user_id: Uuid,
        blueprint_id: Option<Uuid>,
    ) -> Result<Vec<ExamResult>, AppError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM institution_exam_results WHERE institution_id = ");
        builder.push_bind(institution_id);
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);

        if let Some(blueprint_id) = blueprint_id {
            builder.push(" AND exam_blueprint_id = ");
            builder.push_bind(blueprint_id);
        }

        builder.push(" ORDER BY created_at DESC");

        let results = builder
            .build_query_as::<ExamResult>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list exam results: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(results)
    }
}
