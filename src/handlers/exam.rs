// src/handlers/exam.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    exam::{ExamSession, hydrate_exam},
    models::{exam_result::SubmitExamRequest, question::PublicQuestion},
    state::AppState,
};

/// Response of the hydration endpoint: the exam header plus the ordered
/// questions in their public projection (no answer keys, no correctness
/// flags, no explanations).
#[derive(Debug, Serialize)]
pub struct ExamPaper {
    pub blueprint_id: Uuid,
    pub name: String,
    pub exam_type: String,
    pub duration_minutes: Option<i32>,
    /// Number of questions actually hydrated; may be lower than the
    /// blueprint's declared count when ids failed to resolve.
    pub question_count: usize,
    pub questions: Vec<PublicQuestion>,
}

/// Resolves a blueprint into the question set a learner sees.
///
/// Fails with 404 when the blueprint is unknown or none of its question
/// ids resolve; the exam must not start in that case.
pub async fn get_exam_paper(
    State(state): State<AppState>,
    Path((institution_id, blueprint_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let hydrated = hydrate_exam(
        state.blueprints.as_ref(),
        state.questions.as_ref(),
        institution_id,
        blueprint_id,
    )
    .await?;

    let paper = ExamPaper {
        blueprint_id: hydrated.blueprint.id,
        name: hydrated.blueprint.name,
        exam_type: hydrated.blueprint.exam_type,
        duration_minutes: hydrated.blueprint.duration_minutes,
        question_count: hydrated.questions.len(),
        questions: hydrated.questions.iter().map(PublicQuestion::from).collect(),
    };

    Ok(Json(paper))
}

/// Submits a learner's exam answers.
///
/// * Re-hydrates the blueprint server-side so scoring always runs against
///   the authoritative answer keys.
/// * Replays the client answer map through a fresh session and scores it;
///   unanswered questions count as blank, there is no minimum-completion
///   gate.
/// * Persists exactly one result record. A resubmission carrying the same
///   `attempt_id` returns the already-stored record.
pub async fn submit_exam(
    State(state): State<AppState>,
    Path((institution_id, blueprint_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut session = ExamSession::new(
        institution_id,
        blueprint_id,
        req.user_id,
        req.student_id,
        req.attempt_id,
    );

    session
        .start(state.blueprints.as_ref(), state.questions.as_ref())
        .await?;

    for (question_id, entry) in req.answers {
        // A question deleted between hydration and submission is dropped
        // here the same way hydration drops it: the attempt still counts.
        if let Err(err) = session.record_answer(question_id, entry) {
            tracing::warn!(
                question_id = %question_id,
                "ignoring answer outside the hydrated question set: {}",
                err
            );
        }
    }

    let result = session
        .submit(state.results.as_ref(), req.duration_seconds)
        .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub user_id: Uuid,
    pub blueprint_id: Option<Uuid>,
}

/// Lists a learner's results, newest first. Pure read; any averaging or
/// trend computation is a reporting concern outside this service.
pub async fn list_results(
    State(state): State<AppState>,
    Path(institution_id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let results = state
        .results
        .list_results(institution_id, query.user_id, query.blueprint_id)
        .await?;

    Ok(Json(results))
}
