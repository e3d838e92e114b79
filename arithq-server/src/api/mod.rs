//! HTTP API handlers for arithq-server

pub mod health;
pub mod import;
pub mod questions;

pub use health::health_routes;
pub use import::import_questions;
pub use questions::{
    count_questions, create_question, delete_question, get_question, get_question_by_text,
    list_questions, update_question,
};
