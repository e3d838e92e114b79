//! End-to-end tests for the bulk question import
//!
//! Files are written to a temp dir and imported into a fresh SQLite store.

use arithq_common::db::{init_database, SqliteQuestionStore};
use arithq_common::import::{ImportReport, Importer};
use arithq_common::query::{resolve_identity, Filter, QueryParams, Sort};
use arithq_common::question::validator::Validator;
use arithq_common::store::QuestionStore;
use arithq_common::QuestionRecord;
use std::path::PathBuf;
use tempfile::TempDir;

async fn setup(dir: &TempDir) -> (SqliteQuestionStore, Importer<SqliteQuestionStore>) {
    let pool = init_database(&dir.path().join("arithq.db"))
        .await
        .expect("Should initialize database");
    let store = SqliteQuestionStore::new(pool, Validator::default());
    let importer = Importer::new(store.clone(), Validator::default());
    (store, importer)
}

fn write_file(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("questions.csv");
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_import_single_row_after_header() {
    let dir = TempDir::new().unwrap();
    let (store, importer) = setup(&dir).await;
    let path = write_file(&dir, "question|answer|distractors\nWhat is 2 + 3?|5|1,4,9\n");

    let report = importer.import_file(&path).await.unwrap();
    assert_eq!(
        report,
        ImportReport {
            lines_read: 1,
            imported: 1,
            ..Default::default()
        }
    );

    let stored = store.find_one(&Filter::all()).await.unwrap();
    assert_eq!(
        stored,
        Some(QuestionRecord {
            question: "What is 2 + 3?".to_string(),
            first_number: 2,
            second_number: 3,
            operator: "+".to_string(),
            answer: 5.0,
            distractors: vec![1.0, 4.0, 9.0],
        })
    );
}

#[tokio::test]
async fn test_reimport_creates_no_duplicates() {
    let dir = TempDir::new().unwrap();
    let (store, importer) = setup(&dir).await;
    let path = write_file(
        &dir,
        "question|answer|distractors\nWhat is 2 + 3?|5|1,4,9\nWhat is 4 + 4?|8|7,9",
    );

    importer.import_file(&path).await.unwrap();
    let second = importer.import_file(&path).await.unwrap();

    assert_eq!(second.imported, 2);
    assert_eq!(store.count(&Filter::all()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_bad_rows_do_not_abort_import() {
    let dir = TempDir::new().unwrap();
    let (store, importer) = setup(&dir).await;
    let path = write_file(
        &dir,
        concat!(
            "question|answer|distractors\n",
            "What is 1 + 1?|2|3,4\n",
            "this row is garbage\n",
            "What is 2 + 2?|4|5,5\n",
            "What is two + 2?|4|1\n",
            "\n",
            "What is 3 + 3?|6|1,2,3\n",
        ),
    );

    let report = importer.import_file(&path).await.unwrap();
    assert_eq!(report.lines_read, 5);
    assert_eq!(report.imported, 2);
    assert_eq!(report.malformed, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.store_errors, 0);

    let questions: Vec<String> = store
        .find(&Filter::all(), Sort::default(), 0, 100)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.question)
        .collect();
    assert_eq!(questions, vec!["What is 1 + 1?", "What is 3 + 3?"]);
}

#[tokio::test]
async fn test_final_line_without_newline_is_imported() {
    let dir = TempDir::new().unwrap();
    let (store, importer) = setup(&dir).await;
    let path = write_file(&dir, "header\nWhat is 1 + 1?|2|3\nWhat is 2 + 5?|7|1");

    let report = importer.import_file(&path).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(store.count(&Filter::all()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_crlf_file() {
    let dir = TempDir::new().unwrap();
    let (_store, importer) = setup(&dir).await;
    let path = write_file(&dir, "header\r\nWhat is 1 + 1?|2|3\r\nWhat is 2 + 5?|7|1\r\n");

    let report = importer.import_file(&path).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.malformed, 0);
}

#[tokio::test]
async fn test_header_only_file() {
    let dir = TempDir::new().unwrap();
    let (store, importer) = setup(&dir).await;
    let path = write_file(&dir, "What is 1 + 1?|2|3\n");

    let report = importer.import_file(&path).await.unwrap();
    assert_eq!(report, ImportReport::default());
    assert_eq!(store.count(&Filter::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let (_store, importer) = setup(&dir).await;

    let result = importer.import_file(&dir.path().join("nope.csv")).await;
    assert!(matches!(result, Err(arithq_common::Error::Io(_))));
}

#[tokio::test]
async fn test_import_from_reader_with_custom_delimiter() {
    let dir = TempDir::new().unwrap();
    let (store, importer) = setup(&dir).await;
    let importer = importer.with_delimiter(b';');

    let input: &[u8] = b"header;What is 1 + 1?|2|3;What is 2 + 2?|4|1";
    let report = importer.import_reader(input).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(store.count(&Filter::all()).await.unwrap(), 2);
}

#[tokio::test]
async fn test_non_canonical_operands_are_malformed() {
    let dir = TempDir::new().unwrap();
    let (store, importer) = setup(&dir).await;
    let path = write_file(
        &dir,
        "question|answer|distractors\n\
         What is 5 + 3?|8|1,2\n\
         What is 05 + 3?|8|1,2\n\
         What is +5 + 3?|8|1,2\n\
         What is -0 + 3?|3|1,2\n",
    );

    let report = importer.import_file(&path).await.unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(report.malformed, 3);

    let identity = resolve_identity(&QueryParams {
        first_number: Some("5".to_string()),
        second_number: Some("3".to_string()),
        operator: Some("+".to_string()),
        ..Default::default()
    })
    .unwrap()
    .require_filter()
    .unwrap();
    assert_eq!(store.count(&identity).await.unwrap(), 1);
}
