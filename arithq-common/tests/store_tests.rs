//! Tests for the SQLite question store
//!
//! Covers upsert idempotence, filter translation (ranges, distractor
//! membership and count), identity filters, merge-then-validate updates and
//! rejection without partial writes.

use arithq_common::db::{init_database, SqliteQuestionStore};
use arithq_common::query::{build_filter, resolve_identity, Filter, QueryParams, Sort, SortField};
use arithq_common::question::validator::{AnswerRule, Check, Validator};
use arithq_common::store::QuestionStore;
use arithq_common::{Error, QuestionPatch, QuestionRecord};
use serde_json::json;
use tempfile::TempDir;

async fn setup_store(dir: &TempDir) -> SqliteQuestionStore {
    let pool = init_database(&dir.path().join("arithq.db"))
        .await
        .expect("Should initialize database");
    SqliteQuestionStore::new(pool, Validator::default())
}

fn record(first: i64, second: i64, distractors: &[f64]) -> QuestionRecord {
    QuestionRecord {
        question: format!("What is {} + {}?", first, second),
        first_number: first,
        second_number: second,
        operator: "+".to_string(),
        answer: (first + second) as f64,
        distractors: distractors.to_vec(),
    }
}

async fn seed(store: &SqliteQuestionStore) {
    for rec in [
        record(1, 1, &[3.0, 4.0]),
        record(5, 2, &[1.0, 4.0, 9.0]),
        record(6, 3, &[4.0, 8.0]),
        record(9, 9, &[17.0, 19.0, 20.0]),
    ] {
        store.upsert(&rec.question, &rec).await.unwrap();
    }
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    let rec = record(2, 3, &[1.0, 4.0, 9.0]);

    store.upsert(&rec.question, &rec).await.unwrap();
    store.upsert(&rec.question, &rec).await.unwrap();

    assert_eq!(store.count(&Filter::all()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_replaces_existing_record() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    let mut rec = record(2, 3, &[1.0, 4.0, 9.0]);
    store.upsert(&rec.question, &rec).await.unwrap();

    rec.distractors = vec![7.0];
    store.upsert(&rec.question, &rec).await.unwrap();

    let stored = store.find_one(&Filter::all()).await.unwrap().unwrap();
    assert_eq!(stored.distractors, vec![7.0]);
}

#[tokio::test]
async fn test_invalid_record_never_written() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    let rec = record(2, 3, &[5.0, 5.0, 8.0]);

    let result = store.upsert(&rec.question, &rec).await;
    assert!(matches!(result, Err(Error::ValidationFailed(_))));
    assert!(matches!(store.insert(&rec).await, Err(Error::ValidationFailed(_))));
    assert_eq!(store.count(&Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_insert_duplicate_is_conflict() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    let rec = record(2, 3, &[1.0]);

    store.insert(&rec).await.unwrap();
    assert!(matches!(store.insert(&rec).await, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_count_with_range_filter() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;

    let params = QueryParams {
        first_number: Some("5".to_string()),
        range: Some("gt".to_string()),
        ..Default::default()
    };
    let filter = build_filter(&params).unwrap();
    assert_eq!(store.count(&filter).await.unwrap(), 2);

    let params = QueryParams {
        first_number: Some("5".to_string()),
        ..Default::default()
    };
    let filter = build_filter(&params).unwrap();
    assert_eq!(store.count(&filter).await.unwrap(), 1);
}

#[tokio::test]
async fn test_distractor_membership_and_count_combine() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;

    let only_member = build_filter(&QueryParams {
        distractor: Some("4".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(store.count(&only_member).await.unwrap(), 3);

    let both = build_filter(&QueryParams {
        distractor: Some("4".to_string()),
        num_distractors: Some("3".to_string()),
        ..Default::default()
    })
    .unwrap();
    let found = store.find(&both, Sort::default(), 0, 100).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].question, "What is 5 + 2?");
}

#[tokio::test]
async fn test_sql_filter_agrees_with_in_memory_filter() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;
    let all = store.find(&Filter::all(), Sort::default(), 0, 100).await.unwrap();

    let cases = [
        QueryParams { answer: Some("9".to_string()), range: Some("lt".to_string()), ..Default::default() },
        QueryParams { second_number: Some("3".to_string()), ..Default::default() },
        QueryParams { operator: Some("+".to_string()), num_distractors: Some("2".to_string()), ..Default::default() },
        QueryParams { distractor: Some("17".to_string()), ..Default::default() },
    ];
    for params in cases {
        let filter = build_filter(&params).unwrap();
        let expected = all.iter().filter(|r| filter.matches(r)).count() as i64;
        assert_eq!(store.count(&filter).await.unwrap(), expected, "{:?}", params);
    }
}

#[tokio::test]
async fn test_find_sorts_and_pages() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;

    let sort = Sort { field: SortField::Answer, descending: true };
    let page = store.find(&Filter::all(), sort, 1, 2).await.unwrap();
    let answers: Vec<f64> = page.iter().map(|r| r.answer).collect();
    assert_eq!(answers, vec![9.0, 7.0]);
}

#[tokio::test]
async fn test_identity_filters_find_single_record() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;

    let by_question = resolve_identity(&QueryParams {
        question: Some("What is 6 + 3?".to_string()),
        ..Default::default()
    })
    .unwrap();
    let found = store.find_one(&by_question.require_filter().unwrap()).await.unwrap();
    assert_eq!(found.unwrap().first_number, 6);

    let by_operands = resolve_identity(&QueryParams {
        first_number: Some("9".to_string()),
        second_number: Some("9".to_string()),
        operator: Some("+".to_string()),
        ..Default::default()
    })
    .unwrap();
    let found = store.find_one(&by_operands.require_filter().unwrap()).await.unwrap();
    assert_eq!(found.unwrap().question, "What is 9 + 9?");
}

#[tokio::test]
async fn test_remove_one() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;

    let filter = resolve_identity(&QueryParams {
        question: Some("What is 1 + 1?".to_string()),
        ..Default::default()
    })
    .unwrap()
    .require_filter()
    .unwrap();

    assert!(store.remove_one(&filter).await.unwrap());
    assert!(!store.remove_one(&filter).await.unwrap());
    assert_eq!(store.count(&Filter::all()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_update_merges_and_validates() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;
    let filter = resolve_identity(&QueryParams {
        question: Some("What is 1 + 1?".to_string()),
        ..Default::default()
    })
    .unwrap()
    .require_filter()
    .unwrap();

    let patch = QuestionPatch {
        distractors: Some(json!([5, 6, 7])),
        ..Default::default()
    };
    let updated = store.update(&filter, patch).await.unwrap().unwrap();
    assert_eq!(updated.distractors, vec![5.0, 6.0, 7.0]);
    assert_eq!(updated.answer, 2.0);

    let stored = store.find_one(&filter).await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_rejected_update_leaves_record_unchanged() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;
    seed(&store).await;
    let filter = resolve_identity(&QueryParams {
        question: Some("What is 1 + 1?".to_string()),
        ..Default::default()
    })
    .unwrap()
    .require_filter()
    .unwrap();
    let before = store.find_one(&filter).await.unwrap().unwrap();

    let patch = QuestionPatch {
        answer: Some(json!(3)),
        distractors: Some(json!([2, 2])),
        ..Default::default()
    };
    match store.update(&filter, patch).await {
        Err(Error::ValidationFailed(failure)) => {
            assert_eq!(failure.checks(), &[Check::Distractors, Check::Answer]);
        }
        other => panic!("Expected validation failure, got {:?}", other),
    }

    let after = store.find_one(&filter).await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_update_missing_record_returns_none() {
    let dir = TempDir::new().unwrap();
    let store = setup_store(&dir).await;

    let filter = resolve_identity(&QueryParams {
        question: Some("What is 4 + 4?".to_string()),
        ..Default::default()
    })
    .unwrap()
    .require_filter()
    .unwrap();
    let patch = QuestionPatch {
        answer: Some(json!(8)),
        ..Default::default()
    };
    assert!(store.update(&filter, patch).await.unwrap().is_none());
}

#[tokio::test]
async fn test_per_operator_store_accepts_subtraction() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("arithq.db")).await.unwrap();
    let store = SqliteQuestionStore::new(pool, Validator::new(AnswerRule::PerOperator));

    let rec = QuestionRecord {
        question: "What is 6 - 2?".to_string(),
        first_number: 6,
        second_number: 2,
        operator: "-".to_string(),
        answer: 4.0,
        distractors: vec![3.0, 8.0],
    };
    store.insert(&rec).await.unwrap();
    assert_eq!(store.find_one(&Filter::all()).await.unwrap(), Some(rec));
}
