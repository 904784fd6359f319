// src/handlers/catalog.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{blueprint::CreateBlueprintRequest, question::CreateQuestionRequest},
    state::AppState,
    store::QuestionFilter,
};

/// Creates a new question in the institution's bank.
pub async fn create_question(
    State(state): State<AppState>,
    Path(institution_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.check_shape().map_err(AppError::BadRequest)?;

    let question = state
        .questions
        .insert_question(institution_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(question)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    pub subject: Option<String>,
    pub topic: Option<String>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// Lists questions, filterable by subject and topic, paginated.
pub async fn list_questions(
    State(state): State<AppState>,
    Path(institution_id): Path<Uuid>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = QuestionFilter {
        subject: query.subject,
        topic: query.topic,
        page: query.page,
        page_size: query.page_size,
    };

    let questions = state.questions.list_questions(institution_id, filter).await?;

    Ok(Json(questions))
}

/// Creates a new exam blueprint.
///
/// The question id list must be non-empty and, when a question count is
/// declared, it must match the list length.
pub async fn create_blueprint(
    State(state): State<AppState>,
    Path(institution_id): Path<Uuid>,
    Json(payload): Json<CreateBlueprintRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.check_shape().map_err(AppError::BadRequest)?;

    let blueprint = state
        .blueprints
        .insert_blueprint(institution_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(blueprint)))
}

/// Lists the institution's blueprints, newest first.
pub async fn list_blueprints(
    State(state): State<AppState>,
    Path(institution_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let blueprints = state.blueprints.list_blueprints(institution_id).await?;

    Ok(Json(blueprints))
}

/// Fetches one blueprint by id.
pub async fn get_blueprint(
    State(state): State<AppState>,
    Path((institution_id, blueprint_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let blueprint = state
        .blueprints
        .blueprint_by_id(institution_id, blueprint_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Blueprint not found".to_string()))?;

    Ok(Json(blueprint))
}
