// src/exam/hydrate.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::blueprint::ExamBlueprint;
use crate::models::question::Question;
use crate::store::{BlueprintStore, QuestionStore};

/// A blueprint resolved into its full question content, in blueprint order.
#[derive(Debug)]
pub struct HydratedExam {
    pub blueprint: ExamBlueprint,
    pub questions: Vec<Question>,
}

/// Resolves a blueprint's question id list into ordered question content.
///
/// Blueprint order is preserved. Ids with no matching question are dropped
/// with a warning rather than failing the whole exam (availability over
/// strictness). Fails when the blueprint is unresolvable or when zero
/// questions resolve; the exam must not start in either case.
pub async fn hydrate_exam(
    blueprints: &dyn BlueprintStore,
    questions: &dyn QuestionStore,
    institution_id: Uuid,
    blueprint_id: Uuid,
) -> Result<HydratedExam, AppError> {
    let blueprint = blueprints
        .blueprint_by_id(institution_id, blueprint_id)
        .await?
        .ok_or_else(|| AppError::Hydration("Exam blueprint not found".to_string()))?;

    let fetched = questions
        .questions_by_ids(institution_id, &blueprint.question_ids)
        .await?;

    let mut by_id: HashMap<Uuid, Question> =
        fetched.into_iter().map(|q| (q.id, q)).collect();

    let mut ordered = Vec::with_capacity(blueprint.question_ids.len());
    for question_id in blueprint.question_ids.iter() {
        match by_id.remove(question_id) {
            Some(question) => ordered.push(question),
            None => {
                tracing::warn!(
                    blueprint_id = %blueprint.id,
                    question_id = %question_id,
                    "blueprint references a missing question, dropping it"
                );
            }
        }
    }

    if ordered.is_empty() {
        return Err(AppError::Hydration(
            "No questions available for this exam".to_string(),
        ));
    }

    Ok(HydratedExam {
        blueprint,
        questions: ordered,
    })
}
