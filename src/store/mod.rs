// src/store/mod.rs

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::blueprint::{CreateBlueprintRequest, ExamBlueprint};
use crate::models::exam_result::{ExamResult, NewExamResult};
use crate::models::question::{CreateQuestionRequest, Question};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Pagination and filtering for question bank listings.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl QuestionFilter {
    pub fn limit(&self) -> i64 {
        let size = if self.page_size == 0 { 25 } else { self.page_size };
        size.min(100) as i64
    }

    pub fn offset(&self) -> i64 {
        self.page as i64 * self.limit()
    }
}

/// Read/write access to the question bank. The exam flow itself only reads.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn insert_question(
        &self,
        institution_id: Uuid,
        req: CreateQuestionRequest,
    ) -> Result<Question, AppError>;

    /// Fetches the questions matching `ids` within one institution.
    /// Order of the returned rows is unspecified; ids with no matching
    /// record are simply absent from the result.
    async fn questions_by_ids(
        &self,
        institution_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Question>, AppError>;

    async fn list_questions(
        &self,
        institution_id: Uuid,
        filter: QuestionFilter,
    ) -> Result<Vec<Question>, AppError>;
}

#[async_trait]
pub trait BlueprintStore: Send + Sync {
    async fn insert_blueprint(
        &self,
        institution_id: Uuid,
        req: CreateBlueprintRequest,
    ) -> Result<ExamBlueprint, AppError>;

    async fn blueprint_by_id(
        &self,
        institution_id: Uuid,
        blueprint_id: Uuid,
    ) -> Result<Option<ExamBlueprint>, AppError>;

    async fn list_blueprints(&self, institution_id: Uuid) -> Result<Vec<ExamBlueprint>, AppError>;
}

/// Write-once result storage.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persists one completed attempt. Idempotent on `attempt_id`: when a
    /// record with the same attempt id already exists, that record is
    /// returned and nothing is written.
    async fn insert_result(&self, new: NewExamResult) -> Result<ExamResult, AppError>;

    /// Results for one learner, newest first, optionally narrowed to one
    /// blueprint.
    async fn list_results(
        &self,
        institution_id: Uuid,
        user_id: Uuid,
        blueprint_id: Option<Uuid>,
    ) -> Result<Vec<ExamResult>, AppError>;
}
