// src/state.rs

use std::sync::Arc;

use crate::store::{BlueprintStore, QuestionStore, ResultStore};

/// Shared application state: the three storage contracts behind trait
/// objects so the router can run against Postgres in production and the
/// in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionStore>,
    pub blueprints: Arc<dyn BlueprintStore>,
    pub results: Arc<dyn ResultStore>,
}

impl AppState {
    /// Builds state from one store implementing all three contracts.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: QuestionStore + BlueprintStore + ResultStore + 'static,
    {
        AppState {
            questions: store.clone(),
            blueprints: store.clone(),
            results: store,
        }
    }
}
