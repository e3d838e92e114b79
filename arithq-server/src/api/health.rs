//! Health check endpoint
//!
//! Reports the service version and whether the question store answers.

use arithq_common::query::Filter;
use arithq_common::store::QuestionStore;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the store cannot be queried
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Questions in the store; absent when degraded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<i64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, status, questions) = match state.store.count(&Filter::all()).await {
        Ok(count) => (StatusCode::OK, "ok", Some(count)),
        Err(e) => {
            warn!("Health check could not query the store: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", None)
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            module: "arithq-server",
            version: env!("CARGO_PKG_VERSION"),
            questions,
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
