// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{catalog, exam},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Catalog routes: question bank and blueprint authoring.
/// * Exam routes: hydration, submission, result history.
/// * Applies global middleware (Trace, CORS) and injects shared state.
///
/// All routes are institution-scoped; callers pass explicit institution
/// and user ids instead of relying on ambient session state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let catalog_routes = Router::new()
        .route(
            "/questions",
            get(catalog::list_questions).post(catalog::create_question),
        )
        .route(
            "/blueprints",
            get(catalog::list_blueprints).post(catalog::create_blueprint),
        )
        .route("/blueprints/{blueprint_id}", get(catalog::get_blueprint));

    let exam_routes = Router::new()
        .route("/exams/{blueprint_id}/paper", get(exam::get_exam_paper))
        .route("/exams/{blueprint_id}/submit", post(exam::submit_exam))
        .route("/results", get(exam::list_results));

    Router::new()
        .nest(
            "/api/institutions/{institution_id}",
            catalog_routes.merge(exam_routes),
        )
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
