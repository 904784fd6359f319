// src/models/exam_result.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::metadata::Metadata;
use crate::models::question::QuestionType;

/// A learner's raw answer to one question, as sent by the client.
/// Multiple-choice answers carry a choice id (label is display-only);
/// written answers carry free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub choice_id: Option<String>,
    pub choice_label: Option<String>,
    pub text: Option<String>,
}

impl AnswerEntry {
    pub fn choice(choice_id: impl Into<String>, label: impl Into<String>) -> Self {
        AnswerEntry {
            choice_id: Some(choice_id.into()),
            choice_label: Some(label.into()),
            text: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        AnswerEntry {
            choice_id: None,
            choice_label: None,
            text: Some(value.into()),
        }
    }
}

/// Scored outcome for one question, persisted inside the result's `answers`
/// JSON column. Field names stay camelCase for compatibility with the
/// history and reporting consumers of the original payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    pub is_correct: bool,
}

/// Represents the 'institution_exam_results' table in the database.
/// Write-once: created exactly once per submitted attempt, never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: Uuid,

    /// Client-generated idempotency key; unique across all results.
    pub attempt_id: Uuid,

    pub institution_id: Uuid,
    pub user_id: Uuid,
    pub student_id: Option<Uuid>,
    pub exam_blueprint_id: Uuid,

    /// Snapshot of the exact ordered question list scored for this attempt.
    pub question_ids: Json<Vec<Uuid>>,

    /// One outcome entry per question in `question_ids`.
    pub answers: Json<HashMap<Uuid, AnswerOutcome>>,

    pub correct_count: i32,
    pub wrong_count: i32,
    pub empty_count: i32,

    /// 0-100, rounded to two decimals.
    pub score: f64,

    pub duration_seconds: Option<i32>,

    pub metadata: Json<Metadata>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Insert payload for one completed attempt, handed to the result store.
#[derive(Debug, Clone)]
pub struct NewExamResult {
    pub attempt_id: Uuid,
    pub institution_id: Uuid,
    pub user_id: Uuid,
    pub student_id: Option<Uuid>,
    pub exam_blueprint_id: Uuid,
    pub question_ids: Vec<Uuid>,
    pub answers: HashMap<Uuid, AnswerOutcome>,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub empty_count: i32,
    pub score: f64,
    pub duration_seconds: Option<i32>,
    pub metadata: Metadata,
}

/// DTO for submitting a completed attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    pub user_id: Uuid,
    pub student_id: Option<Uuid>,

    /// Client-generated idempotency key. Resubmitting with the same id
    /// returns the already-stored result instead of creating a duplicate.
    pub attempt_id: Option<Uuid>,

    /// Answer map keyed by question id. Unanswered questions may simply be
    /// omitted; they are scored as blank.
    #[serde(default)]
    pub answers: HashMap<Uuid, AnswerEntry>,

    pub duration_seconds: Option<i32>,
}
