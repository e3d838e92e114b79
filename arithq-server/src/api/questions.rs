//! Question count, listing and single-record endpoints
//!
//! Count and list requests take conjunctive filter parameters
//! (`firstNumber`, `secondNumber`, `answer`, `operator`, `distractor`,
//! `numDistractors`, `range`). Single-record requests identify their target
//! by `question`, or by `firstNumber` + `secondNumber` + `operator` together.

use arithq_common::query::{build_filter, resolve_identity, Filter, Predicate, QueryParams, Sort};
use arithq_common::store::QuestionStore;
use arithq_common::{Error, QuestionPatch, QuestionRecord};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::pagination::{Pagination, PAGE_SIZE};
use crate::AppState;

/// Sorting and paging parameters for GET /questions
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Sort field (camelCase record field name)
    pub sort: Option<String>,
    /// `asc` (default) or `desc`
    pub order: Option<String>,
    /// Page number (1-indexed)
    pub page: Option<String>,
}

/// One page of matching questions
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub questions: Vec<QuestionRecord>,
}

/// Response for GET /count
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

fn parse_page(raw: Option<&str>) -> ApiResult<i64> {
    match raw {
        None => Ok(1),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::BadRequest(format!("page must be an integer, got {:?}", raw))),
    }
}

/// GET /count
pub async fn count_questions(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<CountResponse>> {
    let filter = build_filter(&params)?;
    let count = state.store.count(&filter).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /questions
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
    Query(list): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let filter = build_filter(&params)?;
    let sort = Sort::parse(list.sort.as_deref(), list.order.as_deref())?;
    let requested_page = parse_page(list.page.as_deref())?;

    let total_results = state.store.count(&filter).await?;
    let p = Pagination::new(total_results, requested_page);
    let questions = state.store.find(&filter, sort, p.offset, p.limit()).await?;

    Ok(Json(ListResponse {
        total_results,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        questions,
    }))
}

/// GET /question
pub async fn get_question(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<QuestionRecord>> {
    let filter = resolve_identity(&params)?.require_filter()?;
    find_required(&state, &filter).await
}

/// GET /question/:question
pub async fn get_question_by_text(
    State(state): State<AppState>,
    Path(question): Path<String>,
) -> ApiResult<Json<QuestionRecord>> {
    let filter = Filter::all().and(Predicate::Question(question));
    find_required(&state, &filter).await
}

async fn find_required(state: &AppState, filter: &Filter) -> ApiResult<Json<QuestionRecord>> {
    state
        .store
        .find_one(filter)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No matching question".to_string()))
}

/// POST /question
///
/// Operands and operator omitted from the body are derived from the
/// question string.
pub async fn create_question(
    State(state): State<AppState>,
    Json(body): Json<QuestionPatch>,
) -> ApiResult<(StatusCode, Json<QuestionRecord>)> {
    let record = body.into_record()?;
    state.store.insert(&record).await?;
    info!("Created question {:?}", record.question);
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /question
///
/// Merges the body into the identified record; the merged record must pass
/// validation or nothing is written.
pub async fn update_question(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
    Json(patch): Json<QuestionPatch>,
) -> ApiResult<Json<QuestionRecord>> {
    let filter = resolve_identity(&params)?.require_filter()?;
    if patch.is_empty() {
        return Err(Error::InvalidInput("Update body has no fields".to_string()).into());
    }

    match state.store.update(&filter, patch).await? {
        Some(record) => {
            info!("Updated question {:?}", record.question);
            Ok(Json(record))
        }
        None => Err(ApiError::NotFound("No matching question".to_string())),
    }
}

/// DELETE /question
pub async fn delete_question(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Value>> {
    let filter = resolve_identity(&params)?.require_filter()?;
    if state.store.remove_one(&filter).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::NotFound("No matching question".to_string()))
    }
}
