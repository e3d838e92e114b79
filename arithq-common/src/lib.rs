//! # arithq Common Library
//!
//! Shared code for the arithq question service including:
//! - Question record model, question-string and import-row parsers
//! - Record validation (field and cross-field checks)
//! - Streaming line reassembly and the bulk import orchestrator
//! - Filter building and identity resolution for store queries
//! - SQLite-backed question store
//! - Bootstrap configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod query;
pub mod question;
pub mod store;

pub use error::{Error, Result};
pub use question::{Operator, QuestionPatch, QuestionRecord};
