//! Question record model
//!
//! A question record is the sole persisted entity: a canonical question string
//! ("What is 7 + 3?"), its operands and operator, the correct answer and a list
//! of numeric distractors shown alongside the answer.

pub mod parser;
pub mod validator;

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use parser::parse_question;
use validator::{numeric_answer, numeric_distractors, Check, ValidationFailure};

/// The closed set of arithmetic operators a question may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// All supported operators, in display order
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    /// Single-character symbol used in question strings
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
        }
    }

    /// Look up an operator by its symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Evaluate `left <op> right`
    ///
    /// Returns `None` for division by zero.
    pub fn apply(self, left: f64, right: f64) -> Option<f64> {
        match self {
            Operator::Add => Some(left + right),
            Operator::Subtract => Some(left - right),
            Operator::Multiply => Some(left * right),
            Operator::Divide if right == 0.0 => None,
            Operator::Divide => Some(left / right),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A question record, either persisted or a not-yet-validated candidate
///
/// `operator` is kept as text so that a candidate carrying an unsupported
/// symbol can be represented and rejected by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question: String,
    pub first_number: i64,
    pub second_number: i64,
    pub operator: String,
    #[serde(with = "number_format")]
    pub answer: f64,
    #[serde(with = "number_format::list")]
    pub distractors: Vec<f64>,
}

impl QuestionRecord {
    /// Merge a partial update into a copy of this record
    ///
    /// When the patch replaces `question` without supplying any of the
    /// operands or the operator, those are re-derived from the new question
    /// string. Loosely-typed `answer`/`distractors` values that are not
    /// numeric fail here; every other invariant is left to the validator.
    pub fn merged(&self, patch: QuestionPatch) -> Result<QuestionRecord> {
        let mut merged = self.clone();
        let mut failure = ValidationFailure::default();

        let rederive = patch.question.is_some()
            && patch.first_number.is_none()
            && patch.second_number.is_none()
            && patch.operator.is_none();

        if let Some(question) = patch.question {
            merged.question = question;
        }
        if rederive {
            if let Ok(parsed) = parse_question(&merged.question) {
                merged.first_number = parsed.first_number;
                merged.second_number = parsed.second_number;
                merged.operator = parsed.operator;
            }
        }
        if let Some(first) = patch.first_number {
            merged.first_number = first;
        }
        if let Some(second) = patch.second_number {
            merged.second_number = second;
        }
        if let Some(operator) = patch.operator {
            merged.operator = operator;
        }
        if let Some(value) = patch.answer {
            match numeric_answer(&value) {
                Some(answer) => merged.answer = answer,
                None => failure.push(Check::Answer),
            }
        }
        if let Some(value) = patch.distractors {
            match numeric_distractors(&value) {
                Some(distractors) => merged.distractors = distractors,
                None => failure.push(Check::Distractors),
            }
        }

        failure.into_result()?;
        Ok(merged)
    }
}

/// Loosely-typed question fields from an external request body
///
/// Used both for create requests (see [`QuestionPatch::into_record`]) and
/// for partial updates merged into an existing record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    pub question: Option<String>,
    pub first_number: Option<i64>,
    pub second_number: Option<i64>,
    pub operator: Option<String>,
    pub answer: Option<Value>,
    pub distractors: Option<Value>,
}

impl QuestionPatch {
    /// True when the patch would not change any field
    pub fn is_empty(&self) -> bool {
        self.question.is_none()
            && self.first_number.is_none()
            && self.second_number.is_none()
            && self.operator.is_none()
            && self.answer.is_none()
            && self.distractors.is_none()
    }

    /// Build a full candidate record from a create request
    ///
    /// If any of `firstNumber`, `secondNumber` or `operator` is missing, all
    /// three are taken from the parsed question string.
    pub fn into_record(self) -> Result<QuestionRecord> {
        let mut failure = ValidationFailure::default();

        let question = match self.question {
            Some(question) if !question.is_empty() => question,
            _ => {
                failure.push(Check::Question);
                String::new()
            }
        };

        let (first_number, second_number, operator) =
            match (self.first_number, self.second_number, self.operator) {
                (Some(first), Some(second), Some(operator)) => (first, second, operator),
                _ if question.is_empty() => (0, 0, String::new()),
                _ => {
                    let parsed = parse_question(&question)?;
                    (parsed.first_number, parsed.second_number, parsed.operator)
                }
            };

        let answer = match self.answer.as_ref().and_then(numeric_answer) {
            Some(answer) => answer,
            None => {
                failure.push(Check::Answer);
                0.0
            }
        };

        let distractors = match self.distractors.as_ref().and_then(numeric_distractors) {
            Some(distractors) => distractors,
            None => {
                failure.push(Check::Distractors);
                Vec::new()
            }
        };

        failure.into_result()?;

        Ok(QuestionRecord {
            question,
            first_number,
            second_number,
            operator,
            answer,
            distractors,
        })
    }
}

/// Serialize whole-valued numbers as JSON integers (`5` rather than `5.0`)
mod number_format {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

    struct Number(f64);

    impl Serialize for Number {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if self.0.fract() == 0.0 && self.0.abs() <= MAX_EXACT_INTEGER {
                serializer.serialize_i64(self.0 as i64)
            } else {
                serializer.serialize_f64(self.0)
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        Number(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer)
    }

    pub mod list {
        use super::Number;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(values.iter().map(|v| Number(*v)))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
            Vec::<f64>::deserialize(deserializer)
        }
    }
}
