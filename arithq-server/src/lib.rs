//! arithq-server library - HTTP access to the arithmetic question bank
//!
//! Exposes count, list, single-record CRUD and bulk import over the
//! SQLite-backed [`QuestionStore`](arithq_common::store::QuestionStore).

use api::import::ImportSources;
use arithq_common::db::SqliteQuestionStore;
use arithq_common::question::validator::Validator;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Question store; validates every write
    pub store: SqliteQuestionStore,
    /// Files `POST /import` may read; none until configured
    pub import_sources: ImportSources,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, validator: Validator) -> Self {
        Self {
            store: SqliteQuestionStore::new(db, validator),
            import_sources: ImportSources::default(),
        }
    }

    /// Allow imports of `sources`
    pub fn with_import_sources(mut self, sources: ImportSources) -> Self {
        self.import_sources = sources;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/count", get(api::count_questions))
        .route("/questions", get(api::list_questions))
        .route(
            "/question",
            get(api::get_question)
                .post(api::create_question)
                .put(api::update_question)
                .delete(api::delete_question),
        )
        .route("/question/:question", get(api::get_question_by_text))
        .route("/import", post(api::import_questions))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
