//! Database layer: connection setup and the SQLite question store

pub mod init;
pub mod questions;

pub use init::*;
pub use questions::SqliteQuestionStore;
