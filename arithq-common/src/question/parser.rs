//! Question-string and import-row parsing
//!
//! Question strings follow a fixed template, `What is <first> <op> <second>?`,
//! with single spaces between tokens and a one-character operator. Import rows
//! are `question|answer|distractor,distractor,...`.
//!
//! Both parsers validate token count and shape before touching any token and
//! return a typed failure instead of yielding a non-number.

use super::QuestionRecord;
use crate::{Error, Result};

/// Fields of a pipe-delimited import row
const ROW_FIELDS: usize = 3;

/// `What`, `is`, first operand, operator, second operand
const QUESTION_TOKENS: usize = 5;

/// Operator and operands extracted from a question string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    pub question: String,
    pub operator: String,
    pub first_number: i64,
    pub second_number: i64,
}

impl ParsedQuestion {
    /// Rebuild the canonical question string from the parsed parts
    pub fn to_question_string(&self) -> String {
        format_question(self.first_number, &self.operator, self.second_number)
    }
}

/// Format operands and operator with the fixed question template
pub fn format_question(first_number: i64, operator: &str, second_number: i64) -> String {
    format!("What is {} {} {}?", first_number, operator, second_number)
}

/// Parse a question string into its operator and two operands
///
/// The operator token must be exactly one character; membership in the
/// supported operator set is checked by the validator, not here.
pub fn parse_question(question: &str) -> Result<ParsedQuestion> {
    let tokens: Vec<&str> = question.split(' ').collect();

    let &[what, is, first, operator, second] = tokens.as_slice() else {
        return Err(Error::MalformedLine(format!(
            "Expected {} tokens in question, found {}: {:?}",
            QUESTION_TOKENS,
            tokens.len(),
            question
        )));
    };

    if what != "What" || is != "is" {
        return Err(Error::MalformedLine(format!(
            "Question must start with \"What is\": {:?}",
            question
        )));
    }

    if operator.chars().count() != 1 {
        return Err(Error::MalformedLine(format!(
            "Operator must be a single character, found {:?}",
            operator
        )));
    }

    let second = second.strip_suffix('?').ok_or_else(|| {
        Error::MalformedLine(format!("Question must end with '?': {:?}", question))
    })?;

    Ok(ParsedQuestion {
        question: question.to_string(),
        operator: operator.to_string(),
        first_number: parse_operand(first)?,
        second_number: parse_operand(second)?,
    })
}

/// Parse an operand written in canonical form
///
/// Leading zeros, a `+` sign and `-0` are rejected so that each operand
/// tuple has exactly one question string.
fn parse_operand(token: &str) -> Result<i64> {
    let value = token
        .parse::<i64>()
        .map_err(|_| Error::MalformedLine(format!("Operand is not an integer: {:?}", token)))?;

    if value.to_string() != token {
        return Err(Error::MalformedLine(format!(
            "Operand must be written as {}, found {:?}",
            value, token
        )));
    }

    Ok(value)
}

/// Parse a numeric field with all spaces removed
fn parse_number(field: &str, what: &str) -> Result<f64> {
    let cleaned: String = field.chars().filter(|c| !c.is_whitespace()).collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::MalformedLine(format!(
            "{} is not a number: {:?}",
            what, field
        ))),
    }
}

/// Parse one pipe-delimited import row into a candidate record
///
/// Distractors are converted independently and are not de-duplicated;
/// duplicates are rejected later by the validator.
pub fn parse_line(line: &str) -> Result<QuestionRecord> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split('|').collect();

    let &[question, answer, distractors] = fields.as_slice() else {
        return Err(Error::MalformedLine(format!(
            "Expected {} '|'-separated fields, found {}",
            ROW_FIELDS,
            fields.len()
        )));
    };

    let parsed = parse_question(question)?;
    let answer = parse_number(answer, "Answer")?;
    let distractors = distractors
        .split(',')
        .map(|token| parse_number(token, "Distractor"))
        .collect::<Result<Vec<f64>>>()?;

    Ok(QuestionRecord {
        question: parsed.question,
        first_number: parsed.first_number,
        second_number: parsed.second_number,
        operator: parsed.operator,
        answer,
        distractors,
    })
}
