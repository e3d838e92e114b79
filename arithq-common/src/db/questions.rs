//! SQLite question store
//!
//! Implements [`QuestionStore`] over the `questions` table. Filters are
//! translated into parameterized `WHERE` clauses; distractor predicates use
//! SQLite's JSON functions over the stored array.

use crate::query::{Comparison, Filter, NumericField, Predicate, Sort};
use crate::question::validator::Validator;
use crate::store::QuestionStore;
use crate::{Error, QuestionPatch, QuestionRecord, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

const COLUMNS: &str = "question, first_number, second_number, operator, answer, distractors";

/// Question store backed by an SQLite pool
///
/// Every write runs the validator first; a rejected record never reaches
/// the database.
#[derive(Clone)]
pub struct SqliteQuestionStore {
    pool: SqlitePool,
    validator: Validator,
}

impl SqliteQuestionStore {
    pub fn new(pool: SqlitePool, validator: Validator) -> Self {
        Self { pool, validator }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn validator(&self) -> Validator {
        self.validator
    }
}

fn numeric_column(field: NumericField) -> &'static str {
    match field {
        NumericField::FirstNumber => "first_number",
        NumericField::SecondNumber => "second_number",
        NumericField::Answer => "answer",
    }
}

fn comparison_sql(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Eq => " = ",
        Comparison::Gt => " > ",
        Comparison::Lt => " < ",
    }
}

/// Append ` WHERE p1 AND p2 ...` for a non-empty filter
fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    for (i, predicate) in filter.predicates().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Number {
                field,
                comparison,
                value,
            } => {
                builder
                    .push(numeric_column(*field))
                    .push(comparison_sql(*comparison))
                    .push_bind(*value);
            }
            Predicate::Operator(operator) => {
                builder.push("operator = ").push_bind(operator.clone());
            }
            Predicate::Question(question) => {
                builder.push("question = ").push_bind(question.clone());
            }
            Predicate::HasDistractor(value) => {
                builder
                    .push("EXISTS (SELECT 1 FROM json_each(questions.distractors) WHERE json_each.value = ")
                    .push_bind(*value)
                    .push(")");
            }
            Predicate::DistractorCount(count) => {
                builder
                    .push("json_array_length(questions.distractors) = ")
                    .push_bind(*count as i64);
            }
        }
    }
}

fn record_from_row(row: &SqliteRow) -> Result<QuestionRecord> {
    let question: String = row.try_get("question")?;
    let distractors: String = row.try_get("distractors")?;
    let distractors = serde_json::from_str(&distractors).map_err(|e| {
        Error::Internal(format!("Stored distractors for {:?} are corrupt: {}", question, e))
    })?;

    Ok(QuestionRecord {
        question,
        first_number: row.try_get("first_number")?,
        second_number: row.try_get("second_number")?,
        operator: row.try_get("operator")?,
        answer: row.try_get("answer")?,
        distractors,
    })
}

fn encode_distractors(record: &QuestionRecord) -> Result<String> {
    serde_json::to_string(&record.distractors)
        .map_err(|e| Error::Internal(format!("Failed to encode distractors: {}", e)))
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Store`
fn write_error(question: &str, e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_error) = &e {
        if db_error.is_unique_violation() {
            return Error::Conflict(format!("Question already exists: {:?}", question));
        }
    }
    Error::Store(e)
}

impl QuestionStore for SqliteQuestionStore {
    async fn upsert(&self, key: &str, record: &QuestionRecord) -> Result<()> {
        self.validator.validate(record)?;
        let distractors = encode_distractors(record)?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE questions
            SET question = ?, first_number = ?, second_number = ?, operator = ?,
                answer = ?, distractors = ?, updated_at = CURRENT_TIMESTAMP
            WHERE question = ?
            "#,
        )
        .bind(&record.question)
        .bind(record.first_number)
        .bind(record.second_number)
        .bind(&record.operator)
        .bind(record.answer)
        .bind(&distractors)
        .bind(key)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(&record.question, e))?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO questions (guid, question, first_number, second_number, operator, answer, distractors)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&record.question)
            .bind(record.first_number)
            .bind(record.second_number)
            .bind(&record.operator)
            .bind(record.answer)
            .bind(&distractors)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(&record.question, e))?;
            debug!("Inserted question {:?}", record.question);
        } else {
            debug!("Replaced question {:?}", key);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert(&self, record: &QuestionRecord) -> Result<()> {
        self.validator.validate(record)?;
        let distractors = encode_distractors(record)?;

        sqlx::query(
            r#"
            INSERT INTO questions (guid, question, first_number, second_number, operator, answer, distractors)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.question)
        .bind(record.first_number)
        .bind(record.second_number)
        .bind(&record.operator)
        .bind(record.answer)
        .bind(&distractors)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(&record.question, e))?;

        Ok(())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<QuestionRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM questions", COLUMNS));
        push_where(&mut builder, filter);
        builder.push(" ORDER BY created_at, question LIMIT 1");

        let row = builder.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn find(
        &self,
        filter: &Filter,
        sort: Sort,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<QuestionRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM questions", COLUMNS));
        push_where(&mut builder, filter);
        builder
            .push(" ORDER BY ")
            .push(sort.field.column())
            .push(if sort.descending { " DESC" } else { " ASC" })
            .push(", question ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(skip);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM questions");
        push_where(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn remove_one(&self, filter: &Filter) -> Result<bool> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("DELETE FROM questions WHERE guid = (SELECT guid FROM questions");
        push_where(&mut builder, filter);
        builder.push(" ORDER BY created_at, question LIMIT 1)");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, filter: &Filter, patch: QuestionPatch) -> Result<Option<QuestionRecord>> {
        let mut tx = self.pool.begin().await?;

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT guid, {} FROM questions", COLUMNS));
        push_where(&mut builder, filter);
        builder.push(" ORDER BY created_at, question LIMIT 1");

        let Some(row) = builder.build().fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };
        let guid: String = row.try_get("guid")?;
        let existing = record_from_row(&row)?;

        let merged = existing.merged(patch)?;
        self.validator.validate(&merged)?;
        let distractors = encode_distractors(&merged)?;

        sqlx::query(
            r#"
            UPDATE questions
            SET question = ?, first_number = ?, second_number = ?, operator = ?,
                answer = ?, distractors = ?, updated_at = CURRENT_TIMESTAMP
            WHERE guid = ?
            "#,
        )
        .bind(&merged.question)
        .bind(merged.first_number)
        .bind(merged.second_number)
        .bind(&merged.operator)
        .bind(merged.answer)
        .bind(&distractors)
        .bind(&guid)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(&merged.question, e))?;

        tx.commit().await?;
        debug!("Updated question {:?}", merged.question);
        Ok(Some(merged))
    }
}
