//! Filter building and identity resolution
//!
//! External requests carry loosely-typed text parameters. [`build_filter`]
//! turns them into a conjunction of independent predicates for count/list;
//! [`resolve_identity`] determines which single record a get/update/delete
//! refers to. The same [`Filter`] is evaluated in memory by
//! [`Filter::matches`] and translated to SQL by the SQLite store.

use crate::question::{Operator, QuestionRecord};
use crate::{Error, Result};
use serde::Deserialize;

/// Numeric record fields that can be compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    FirstNumber,
    SecondNumber,
    Answer,
}

impl NumericField {
    fn value(self, record: &QuestionRecord) -> f64 {
        match self {
            NumericField::FirstNumber => record.first_number as f64,
            NumericField::SecondNumber => record.second_number as f64,
            NumericField::Answer => record.answer,
        }
    }
}

/// Comparison applied to a numeric field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Comparison {
    #[default]
    Eq,
    Gt,
    Lt,
}

impl Comparison {
    /// Parse the `range` request parameter
    pub fn from_range(range: &str) -> Result<Self> {
        match range {
            "gt" => Ok(Comparison::Gt),
            "lt" => Ok(Comparison::Lt),
            other => Err(Error::InvalidInput(format!(
                "range must be 'gt' or 'lt', got {:?}",
                other
            ))),
        }
    }

    fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Gt => left > right,
            Comparison::Lt => left < right,
        }
    }
}

/// One independent condition on a record
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Number {
        field: NumericField,
        comparison: Comparison,
        value: f64,
    },
    Operator(String),
    Question(String),
    /// Distractor list contains this value
    HasDistractor(f64),
    /// Distractor list has exactly this many entries
    DistractorCount(usize),
}

impl Predicate {
    pub fn matches(&self, record: &QuestionRecord) -> bool {
        match self {
            Predicate::Number {
                field,
                comparison,
                value,
            } => comparison.holds(field.value(record), *value),
            Predicate::Operator(operator) => record.operator == *operator,
            Predicate::Question(question) => record.question == *question,
            Predicate::HasDistractor(value) => record.distractors.contains(value),
            Predicate::DistractorCount(count) => record.distractors.len() == *count,
        }
    }
}

/// Conjunction of predicates; the empty filter matches every record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a predicate that must hold alongside the existing ones
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &QuestionRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

/// Record fields a list can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Question,
    FirstNumber,
    SecondNumber,
    Operator,
    Answer,
    CreatedAt,
}

impl SortField {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "question" => Ok(SortField::Question),
            "firstNumber" => Ok(SortField::FirstNumber),
            "secondNumber" => Ok(SortField::SecondNumber),
            "operator" => Ok(SortField::Operator),
            "answer" => Ok(SortField::Answer),
            "createdAt" => Ok(SortField::CreatedAt),
            other => Err(Error::InvalidInput(format!("Cannot sort by {:?}", other))),
        }
    }

    /// Column name in the questions table
    pub fn column(self) -> &'static str {
        match self {
            SortField::Question => "question",
            SortField::FirstNumber => "first_number",
            SortField::SecondNumber => "second_number",
            SortField::Operator => "operator",
            SortField::Answer => "answer",
            SortField::CreatedAt => "created_at",
        }
    }
}

/// List ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

impl Sort {
    /// Parse `sort` and `order` request parameters (`order` is `asc` or `desc`)
    pub fn parse(field: Option<&str>, order: Option<&str>) -> Result<Self> {
        let field = field.map(SortField::parse).transpose()?.unwrap_or_default();
        let descending = match order {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "order must be 'asc' or 'desc', got {:?}",
                    other
                )))
            }
        };
        Ok(Self { field, descending })
    }
}

/// Request parameters accepted by filter building and identity resolution
///
/// Values arrive as text from query strings; they are converted (and
/// rejected if malformed) when the filter or identity is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub question: Option<String>,
    #[serde(alias = "first")]
    pub first_number: Option<String>,
    #[serde(alias = "second")]
    pub second_number: Option<String>,
    #[serde(alias = "op")]
    pub operator: Option<String>,
    pub answer: Option<String>,
    pub distractor: Option<String>,
    pub num_distractors: Option<String>,
    pub range: Option<String>,
}

fn parse_number(name: &str, raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::InvalidInput(format!(
            "{} must be a number, got {:?}",
            name, raw
        ))),
    }
}

fn parse_integer(name: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidInput(format!("{} must be an integer, got {:?}", name, raw)))
}

fn parse_operator(raw: &str) -> Result<String> {
    Operator::from_symbol(raw)
        .map(|op| op.symbol().to_string())
        .ok_or_else(|| Error::InvalidInput(format!("Unknown operator {:?}", raw)))
}

/// Build a conjunctive filter for count/list requests
///
/// `range` turns the first/second/answer comparisons into greater-than or
/// less-than; `operator` is always matched exactly. `distractor` and
/// `numDistractors` combine, both must hold.
pub fn build_filter(params: &QueryParams) -> Result<Filter> {
    let comparison = params
        .range
        .as_deref()
        .map(Comparison::from_range)
        .transpose()?
        .unwrap_or_default();

    let mut filter = Filter::all();

    let numeric = [
        (NumericField::FirstNumber, "firstNumber", &params.first_number),
        (NumericField::SecondNumber, "secondNumber", &params.second_number),
        (NumericField::Answer, "answer", &params.answer),
    ];
    for (field, name, raw) in numeric {
        if let Some(raw) = raw {
            filter = filter.and(Predicate::Number {
                field,
                comparison,
                value: parse_number(name, raw)?,
            });
        }
    }

    if let Some(raw) = &params.operator {
        filter = filter.and(Predicate::Operator(parse_operator(raw)?));
    }
    if let Some(raw) = &params.distractor {
        filter = filter.and(Predicate::HasDistractor(parse_number("distractor", raw)?));
    }
    if let Some(raw) = &params.num_distractors {
        let count = raw.trim().parse::<usize>().map_err(|_| {
            Error::InvalidInput(format!("numDistractors must be a count, got {:?}", raw))
        })?;
        filter = filter.and(Predicate::DistractorCount(count));
    }

    Ok(filter)
}

/// Which single record a request refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Question(String),
    Operands {
        first_number: i64,
        second_number: i64,
        operator: String,
    },
    /// Neither parameter shape was present
    Unresolved,
}

impl Identity {
    /// Filter selecting the identified record
    ///
    /// `Unresolved` has no filter; it must never fall back to matching
    /// every record.
    pub fn filter(&self) -> Option<Filter> {
        match self {
            Identity::Question(question) => {
                Some(Filter::all().and(Predicate::Question(question.clone())))
            }
            Identity::Operands {
                first_number,
                second_number,
                operator,
            } => Some(
                Filter::all()
                    .and(Predicate::Number {
                        field: NumericField::FirstNumber,
                        comparison: Comparison::Eq,
                        value: *first_number as f64,
                    })
                    .and(Predicate::Number {
                        field: NumericField::SecondNumber,
                        comparison: Comparison::Eq,
                        value: *second_number as f64,
                    })
                    .and(Predicate::Operator(operator.clone())),
            ),
            Identity::Unresolved => None,
        }
    }

    /// Filter selecting the identified record, or `IdentityUnresolved`
    pub fn require_filter(&self) -> Result<Filter> {
        self.filter().ok_or(Error::IdentityUnresolved)
    }
}

/// Resolve a single record's identity from request parameters
///
/// `question` takes precedence; otherwise all three of `firstNumber`,
/// `secondNumber` and `operator` must be present.
pub fn resolve_identity(params: &QueryParams) -> Result<Identity> {
    if let Some(question) = params.question.as_deref().filter(|q| !q.is_empty()) {
        return Ok(Identity::Question(question.to_string()));
    }

    match (&params.first_number, &params.second_number, &params.operator) {
        (Some(first), Some(second), Some(operator)) => Ok(Identity::Operands {
            first_number: parse_integer("firstNumber", first)?,
            second_number: parse_integer("secondNumber", second)?,
            operator: parse_operator(operator)?,
        }),
        _ => Ok(Identity::Unresolved),
    }
}
