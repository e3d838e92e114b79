//! Persistence contract for question records
//!
//! The import orchestrator and HTTP handlers talk to the record store only
//! through [`QuestionStore`]. Store failures are surfaced unmodified and
//! never retried here.

use crate::query::{Filter, Sort};
use crate::{QuestionPatch, QuestionRecord, Result};
use std::future::Future;

/// Asynchronous question record store
///
/// Every write validates the record it would persist and leaves the store
/// untouched when validation fails.
pub trait QuestionStore: Send + Sync {
    /// Insert `record`, or replace the record whose question is `key`
    ///
    /// Idempotent: repeating the same upsert leaves one record.
    fn upsert(
        &self,
        key: &str,
        record: &QuestionRecord,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Insert a new record; fails with `Conflict` if the question exists
    fn insert(&self, record: &QuestionRecord) -> impl Future<Output = Result<()>> + Send;

    /// First record matching `filter`, if any
    fn find_one(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = Result<Option<QuestionRecord>>> + Send;

    /// One ordered page of records matching `filter`
    fn find(
        &self,
        filter: &Filter,
        sort: Sort,
        skip: i64,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<QuestionRecord>>> + Send;

    /// Number of records matching `filter`
    fn count(&self, filter: &Filter) -> impl Future<Output = Result<i64>> + Send;

    /// Remove the first record matching `filter`; returns whether one was removed
    fn remove_one(&self, filter: &Filter) -> impl Future<Output = Result<bool>> + Send;

    /// Merge `patch` into the first record matching `filter` and persist it
    ///
    /// Returns the updated record, or `None` if nothing matched.
    fn update(
        &self,
        filter: &Filter,
        patch: QuestionPatch,
    ) -> impl Future<Output = Result<Option<QuestionRecord>>> + Send;
}
