// src/models/blueprint.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::models::metadata::Metadata;

/// Represents the 'institution_exam_blueprints' table in the database.
///
/// A blueprint names an exam and fixes the ordered list of question ids it
/// presents. Results reference blueprints by id only; the question id list
/// used for an attempt is snapshotted into the result, so editing a blueprint
/// never rewrites history.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamBlueprint {
    pub id: Uuid,
    pub institution_id: Uuid,
    pub name: String,
    pub exam_type: String,

    /// Advisory display value; no timeout is enforced by the exam flow.
    pub duration_minutes: Option<i32>,

    /// Always equals `question_ids.len()`, enforced at creation.
    pub question_count: i32,

    /// Presentation order of the exam.
    pub question_ids: Json<Vec<Uuid>>,

    pub metadata: Json<Metadata>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new blueprint.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlueprintRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default = "default_exam_type")]
    #[validate(length(min = 1, max = 50))]
    pub exam_type: String,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
    #[validate(length(min = 1))]
    pub question_ids: Vec<Uuid>,
    /// Declared count; when present it must match `question_ids.len()`.
    pub question_count: Option<i32>,
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_exam_type() -> String {
    "custom".to_string()
}

impl CreateBlueprintRequest {
    /// The declared question count must agree with the id list.
    pub fn check_shape(&self) -> Result<(), String> {
        if let Some(count) = self.question_count {
            if count as usize != self.question_ids.len() {
                return Err(format!(
                    "question_count {} does not match {} question ids",
                    count,
                    self.question_ids.len()
                ));
            }
        }
        Ok(())
    }
}
