// src/store/memory.rs

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::blueprint::{CreateBlueprintRequest, ExamBlueprint};
use crate::models::exam_result::{ExamResult, NewExamResult};
use crate::models::question::{CreateQuestionRequest, Question};
use crate::store::{BlueprintStore, QuestionFilter, QuestionStore, ResultStore};

/// In-memory implementation of the storage contracts.
///
/// Backs the integration tests and local development without a database.
/// Rows are kept in insertion order; listings that promise newest-first
/// iterate in reverse.
#[derive(Default)]
pub struct MemoryStore {
    questions: Mutex<Vec<Question>>,
    blueprints: Mutex<Vec<ExamBlueprint>>,
    results: Mutex<Vec<ExamResult>>,
    fail_result_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `insert_result` fail with a persistence
    /// error until called again with `false`. Used to exercise the
    /// submit-retry path.
    pub fn set_fail_result_inserts(&self, fail: bool) {
        self.fail_result_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn result_count(&self) -> usize {
        self.results.lock().unwrap().len()
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn insert_question(
        &self,
        institution_id: Uuid,
        req: CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        let now = Utc::now();
        let question = Question {
            id: Uuid::new_v4(),
            institution_id,
            question_type: req.question_type,
            subject: req.subject,
            topic: req.topic,
            difficulty: req.difficulty,
            question_text: req.question_text,
            passage_text: req.passage_text,
            choices: Json(req.choices),
            answer_key: req.answer_key,
            explanation: req.explanation,
            metadata: Json(req.metadata),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.questions.lock().unwrap().push(question.clone());
        Ok(question)
    }

    async fn questions_by_ids(
        &self,
        institution_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Question>, AppError> {
        let questions = self.questions.lock().unwrap();
        Ok(questions
            .iter()
            .filter(|q| q.institution_id == institution_id && ids.contains(&q.id))
            .cloned()
            .collect())
    }

    async fn list_questions(
        &self,
        institution_id: Uuid,
        filter: QuestionFilter,
    ) -> Result<Vec<Question>, AppError> {
        let questions = self.questions.lock().unwrap();
        Ok(questions
            .iter()
            .rev()
            .filter(|q| q.institution_id == institution_id)
            .filter(|q| filter.subject.as_ref().is_none_or(|s| &q.subject == s))
            .filter(|q| filter.topic.as_ref().is_none_or(|t| &q.topic == t))
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BlueprintStore for MemoryStore {
    async fn insert_blueprint(
        &self,
        institution_id: Uuid,
        req: CreateBlueprintRequest,
    ) -> Result<ExamBlueprint, AppError> {
        let now = Utc::now();
        let blueprint = ExamBlueprint {
            id: Uuid::new_v4(),
            institution_id,
            name: req.name,
            exam_type: req.exam_type,
            duration_minutes: req.duration_minutes,
            question_count: req.question_ids.len() as i32,
            question_ids: Json(req.question_ids),
            metadata: Json(req.metadata),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.blueprints.lock().unwrap().push(blueprint.clone());
        Ok(blueprint)
    }

    async fn blueprint_by_id(
        &self,
        institution_id: Uuid,
        blueprint_id: Uuid,
    ) -> Result<Option<ExamBlueprint>, AppError> {
        let blueprints = self.blueprints.lock().unwrap();
        Ok(blueprints
            .iter()
            .find(|b| b.institution_id == institution_id && b.id == blueprint_id)
            .cloned())
    }

    async fn list_blueprints(&self, institution_id: Uuid) -> Result<Vec<ExamBlueprint>, AppError> {
        let blueprints = self.blueprints.lock().unwrap();
        Ok(blueprints
            .iter()
            .rev()
            .filter(|b| b.institution_id == institution_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert_result(&self, new: NewExamResult) -> Result<ExamResult, AppError> {
        if self.fail_result_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Persistence(
                "result store unavailable".to_string(),
            ));
        }

        let mut results = self.results.lock().unwrap();

        // Same idempotency contract as the unique constraint in Postgres.
        if let Some(existing) = results.iter().find(|r| r.attempt_id == new.attempt_id) {
            tracing::warn!(
                attempt_id = %new.attempt_id,
                "duplicate submission, returning existing result"
            );
            return Ok(existing.clone());
        }

        let result = ExamResult {
            id: Uuid::new_v4(),
            attempt_id: new.attempt_id,
            institution_id: new.institution_id,
            user_id: new.user_id,
            student_id: new.student_id,
            exam_blueprint_id: new.exam_blueprint_id,
            question_ids: Json(new.question_ids),
            answers: Json(new.answers),
            correct_count: new.correct_count,
            wrong_count: new.wrong_count,
            empty_count: new.empty_count,
            score: new.score,
            duration_seconds: new.duration_seconds,
            metadata: Json(new.metadata),
            created_at: Some(Utc::now()),
        };
        results.push(result.clone());
        Ok(result)
    }

    async fn list_results(
        &self,
        institution_id: Uuid,
        user_id: Uuid,
        blueprint_id: Option<Uuid>,
    ) -> Result<Vec<ExamResult>, AppError> {
        let results = self.results.lock().unwrap();
        Ok(results
            .iter()
            .rev()
            .filter(|r| r.institution_id == institution_id && r.user_id == user_id)
            .filter(|r| blueprint_id.is_none_or(|b| r.exam_blueprint_id == b))
            .cloned()
            .collect())
    }
}
