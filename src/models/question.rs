// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::models::metadata::Metadata;

/// How a question is answered and auto-scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Written,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Written => "written",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for QuestionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "written" => Ok(QuestionType::Written),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// One selectable option of a multiple-choice question.
/// Stored inside the question's JSON `choices` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionChoice {
    pub id: String,
    pub label: String,
    pub text: String,
    pub is_correct: bool,
}

/// Represents the 'institution_questions' table in the database.
///
/// Immutable from the exam flow's perspective: the flow only ever reads
/// questions, and a question referenced by a submitted result must not be
/// edited afterwards (historical integrity, enforced administratively).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub institution_id: Uuid,

    #[sqlx(try_from = "String")]
    pub question_type: QuestionType,

    pub subject: String,
    pub topic: String,

    #[sqlx(try_from = "String")]
    pub difficulty: Difficulty,

    /// The question stem shown to the learner.
    pub question_text: String,

    /// Optional reading passage the stem refers to.
    pub passage_text: Option<String>,

    /// Ordered choice list; empty for written questions.
    pub choices: Json<Vec<QuestionChoice>>,

    /// Expected answer for written questions. A written question with no
    /// answer key is never auto-scored as correct.
    pub answer_key: Option<String>,

    pub explanation: Option<String>,

    pub metadata: Json<Metadata>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// Choice lookup used by the scoring engine.
    pub fn choice_by_id(&self, choice_id: &str) -> Option<&QuestionChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }
}

/// DTO for sending a question to a learner during an exam.
/// Excludes the answer key, the per-choice correctness flags and the
/// explanation so the client can never derive the solution.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_text: String,
    pub passage_text: Option<String>,
    pub choices: Vec<PublicChoice>,
}

#[derive(Debug, Serialize)]
pub struct PublicChoice {
    pub id: String,
    pub label: String,
    pub text: String,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id,
            question_type: q.question_type,
            subject: q.subject.clone(),
            topic: q.topic.clone(),
            difficulty: q.difficulty,
            question_text: q.question_text.clone(),
            passage_text: q.passage_text.clone(),
            choices: q
                .choices
                .iter()
                .map(|c| PublicChoice {
                    id: c.id.clone(),
                    label: c.label.clone(),
                    text: c.text.clone(),
                })
                .collect(),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub question_type: QuestionType,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    pub difficulty: Difficulty,
    #[validate(length(min = 1, max = 5000))]
    pub question_text: String,
    #[validate(length(max = 20000))]
    pub passage_text: Option<String>,
    #[serde(default)]
    pub choices: Vec<QuestionChoice>,
    pub answer_key: Option<String>,
    #[validate(length(max = 5000))]
    pub explanation: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CreateQuestionRequest {
    /// Structural invariants the `validator` derive cannot express.
    ///
    /// * multiple_choice: at least two choices, exactly one marked correct,
    ///   choice ids unique within the question.
    /// * written: no choices allowed.
    pub fn check_shape(&self) -> Result<(), String> {
        match self.question_type {
            QuestionType::MultipleChoice => {
                if self.choices.len() < 2 {
                    return Err("multiple_choice questions need at least two choices".to_string());
                }
                let correct = self.choices.iter().filter(|c| c.is_correct).count();
                if correct != 1 {
                    return Err(format!(
                        "multiple_choice questions need exactly one correct choice, found {}",
                        correct
                    ));
                }
                let mut ids: Vec<&str> = self.choices.iter().map(|c| c.id.as_str()).collect();
                ids.sort_unstable();
                ids.dedup();
                if ids.len() != self.choices.len() {
                    return Err("choice ids must be unique within a question".to_string());
                }
                Ok(())
            }
            QuestionType::Written => {
                if !self.choices.is_empty() {
                    return Err("written questions cannot have choices".to_string());
                }
                Ok(())
            }
        }
    }
}
