//! Question record validation
//!
//! Every check receives the whole candidate record so cross-field rules
//! (answer vs. operands, operands vs. question string) see sibling fields
//! directly. Checks are independent; a record is accepted only if all pass.
//!
//! # Answer rule
//! Imported question banks have historically been checked with an additive
//! rule, `answer == firstNumber + secondNumber`, whatever the operator.
//! [`AnswerRule::Additive`] keeps that behaviour and is the default.
//! [`AnswerRule::PerOperator`] evaluates the record's own operator instead.

use super::parser::parse_question;
use super::{Operator, QuestionRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Individual validation checks, named in rejection messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Distractors numeric, non-empty and pairwise distinct
    Distractors,
    /// Operator is one of `+ - * /`
    Operator,
    /// Question string matches the fixed grammar
    Question,
    /// Answer numeric and correct under the configured rule
    Answer,
    /// Operands and operator agree with the question string
    Operands,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Distractors => "distractors",
            Check::Operator => "operator",
            Check::Question => "question",
            Check::Answer => "answer",
            Check::Operands => "operands",
        };
        f.write_str(name)
    }
}

/// The set of checks a candidate record failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    checks: Vec<Check>,
}

impl ValidationFailure {
    pub fn push(&mut self, check: Check) {
        if !self.checks.contains(&check) {
            self.checks.push(check);
        }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// `Ok(())` if no check failed
    pub fn into_result(self) -> Result<(), ValidationFailure> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.checks.iter().map(Check::to_string).collect();
        write!(f, "failed checks: {}", names.join(", "))
    }
}

/// How the answer is checked against the operands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerRule {
    /// `answer == firstNumber + secondNumber` regardless of operator
    #[default]
    Additive,
    /// `answer == firstNumber <operator> secondNumber`
    PerOperator,
}

/// Validates candidate records before they reach the store
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    rule: AnswerRule,
}

impl Validator {
    pub fn new(rule: AnswerRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> AnswerRule {
        self.rule
    }

    /// Run every check, collecting all failures
    pub fn validate(&self, record: &QuestionRecord) -> Result<(), ValidationFailure> {
        let mut failure = ValidationFailure::default();

        if !check_distractors(record) {
            failure.push(Check::Distractors);
        }
        if !check_operator(record) {
            failure.push(Check::Operator);
        }
        if !check_question(record) {
            failure.push(Check::Question);
        }
        if !self.check_answer(record) {
            failure.push(Check::Answer);
        }
        if !check_operands(record) {
            failure.push(Check::Operands);
        }

        failure.into_result()
    }

    /// True if the record passes every check
    pub fn accept(&self, record: &QuestionRecord) -> bool {
        self.validate(record).is_ok()
    }

    fn check_answer(&self, record: &QuestionRecord) -> bool {
        if !record.answer.is_finite() {
            return false;
        }
        let first = record.first_number as f64;
        let second = record.second_number as f64;

        let expected = match self.rule {
            AnswerRule::Additive => Some(first + second),
            AnswerRule::PerOperator => {
                Operator::from_symbol(&record.operator).and_then(|op| op.apply(first, second))
            }
        };

        expected == Some(record.answer)
    }
}

fn check_distractors(record: &QuestionRecord) -> bool {
    if record.distractors.is_empty() {
        return false;
    }
    record.distractors.iter().enumerate().all(|(i, value)| {
        value.is_finite() && !record.distractors[..i].contains(value)
    })
}

fn check_operator(record: &QuestionRecord) -> bool {
    Operator::from_symbol(&record.operator).is_some()
}

fn check_question(record: &QuestionRecord) -> bool {
    parse_question(&record.question).is_ok()
}

/// Operands embedded in the question string must match the record's fields
///
/// An unparseable question is reported by the question check alone.
fn check_operands(record: &QuestionRecord) -> bool {
    match parse_question(&record.question) {
        Ok(parsed) => {
            parsed.first_number == record.first_number
                && parsed.second_number == record.second_number
                && parsed.operator == record.operator
        }
        Err(_) => true,
    }
}

/// Extract a numeric answer from a loosely-typed value
pub fn numeric_answer(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// Extract distractors from a loosely-typed value
///
/// Fails unless the value is an array whose elements are all numbers.
pub fn numeric_distractors(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(numeric_answer).collect()
}
