//! Filter conditions, the per-record predicate and the AND-combined filter set.
//!
//! A condition that cannot be evaluated because a value does not coerce to
//! the type its operator needs is dropped for the whole pass and reported as
//! a [`FilterWarning`]; the remaining conditions still apply. Operators that
//! do not belong to the field's semantic type pass every record.

use crate::error::{Result, ViewError};
use crate::field::{FieldDescriptor, FieldRegistry, FieldType};
use crate::record::{Record, Value, parse_number};
use chrono::{Local, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    Empty,
    NotEmpty,
    In,
    NotIn,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
    WithinDays,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    /// Anything else read back from storage. Always passes.
    #[serde(other)]
    Unknown,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Empty => "empty",
            Operator::NotEmpty => "not_empty",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::OnOrBefore => "on_or_before",
            Operator::OnOrAfter => "on_or_after",
            Operator::WithinDays => "within_days",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterEqual => "greater_equal",
            Operator::LessEqual => "less_equal",
            Operator::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = std::convert::Infallible;

    /// Unrecognised names map to [`Operator::Unknown`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let op = match s {
            "contains" => Operator::Contains,
            "not_contains" => Operator::NotContains,
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "empty" => Operator::Empty,
            "not_empty" => Operator::NotEmpty,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "before" => Operator::Before,
            "after" => Operator::After,
            "on_or_before" => Operator::OnOrBefore,
            "on_or_after" => Operator::OnOrAfter,
            "within_days" => Operator::WithinDays,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "greater_equal" => Operator::GreaterEqual,
            "less_equal" => Operator::LessEqual,
            _ => Operator::Unknown,
        };
        Ok(op)
    }
}

/// Comparison value of a condition. `in`/`not_in` take a list; a scalar
/// given to them is read as a one-element list.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    List(Vec<String>),
    Scalar(Value),
}

impl FilterValue {
    pub fn text(&self) -> String {
        match self {
            FilterValue::Scalar(v) => v.display(),
            FilterValue::List(items) => items.join(", "),
        }
    }

    pub fn items(&self) -> Vec<String> {
        match self {
            FilterValue::Scalar(v) => vec![v.display()],
            FilterValue::List(items) => items.clone(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Scalar(Value::text(s))
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Scalar(Value::Text(s))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Scalar(Value::Number(n))
    }
}

impl From<Value> for FilterValue {
    fn from(v: Value) -> Self {
        FilterValue::Scalar(v)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self {
        FilterValue::List(items)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct FilterCondition {
    pub id: String,
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl FilterCondition {
    /// New condition with a freshly generated id.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        FilterCondition {
            id: uuid::Uuid::new_v4().to_string(),
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Inputs to evaluation that do not come from the record or condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalContext {
    /// Reference day for `within_days`.
    pub today: NaiveDate,
}

impl EvalContext {
    pub fn at(today: NaiveDate) -> Self {
        EvalContext { today }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        EvalContext {
            today: Local::now().date_naive(),
        }
    }
}

fn comparison_error(
    condition: &FilterCondition,
    value: impl Into<String>,
    expected: &'static str,
) -> ViewError {
    ViewError::Comparison {
        field: condition.field.clone(),
        operator: condition.operator.to_string(),
        value: value.into(),
        expected,
    }
}

/// Decides whether `record` passes `condition`.
///
/// `field` must be the descriptor of `condition.field`. Fails with
/// [`ViewError::Comparison`] when either side cannot be coerced to the type
/// the operator compares on.
pub fn matches(
    record: &Record,
    condition: &FilterCondition,
    field: &FieldDescriptor,
    ctx: &EvalContext,
) -> Result<bool> {
    let op = &condition.operator;
    if !field.semantic_type.supports(op) {
        debug!(
            "operator {} not valid for {} field '{}', passing record {}",
            op, field.semantic_type, field.id, record.id
        );
        return Ok(true);
    }

    match field.semantic_type {
        FieldType::Text => Ok(match_text(&record.text_of(&field.id), op, &condition.value)),
        FieldType::Select => Ok(match_select(&record.text_of(&field.id), op, &condition.value)),
        FieldType::Number => match_number(record.get(&field.id), condition),
        FieldType::Date => match_date(record.get(&field.id), condition, ctx),
    }
}

fn match_text(actual: &str, op: &Operator, expected: &FilterValue) -> bool {
    let wanted = expected.text();
    match op {
        Operator::Contains => actual.to_lowercase().contains(&wanted.to_lowercase()),
        Operator::NotContains => !actual.to_lowercase().contains(&wanted.to_lowercase()),
        Operator::Equals => actual == wanted,
        Operator::NotEquals => actual != wanted,
        Operator::Empty => actual.is_empty(),
        Operator::NotEmpty => !actual.is_empty(),
        _ => true,
    }
}

fn match_select(actual: &str, op: &Operator, expected: &FilterValue) -> bool {
    match op {
        Operator::Equals => actual == expected.text(),
        Operator::NotEquals => actual != expected.text(),
        Operator::In => expected.items().iter().any(|item| item == actual),
        Operator::NotIn => !expected.items().iter().any(|item| item == actual),
        _ => true,
    }
}

/// Blank text in a Number or Date field reads as missing.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !matches!(v, Value::Text(s) if s.trim().is_empty()))
}

fn match_number(actual: Option<&Value>, condition: &FilterCondition) -> Result<bool> {
    let raw = condition.value.text();
    let wanted = parse_number(&raw).ok_or_else(|| comparison_error(condition, raw, "number"))?;

    let Some(actual) = present(actual) else {
        return Ok(condition.operator == Operator::NotEquals);
    };
    let actual = actual
        .as_number()
        .ok_or_else(|| comparison_error(condition, actual.display(), "number"))?;

    Ok(match condition.operator {
        Operator::Equals => actual == wanted,
        Operator::NotEquals => actual != wanted,
        Operator::GreaterThan => actual > wanted,
        Operator::LessThan => actual < wanted,
        Operator::GreaterEqual => actual >= wanted,
        Operator::LessEqual => actual <= wanted,
        _ => true,
    })
}

fn match_date(
    actual: Option<&Value>,
    condition: &FilterCondition,
    ctx: &EvalContext,
) -> Result<bool> {
    let raw = condition.value.text();

    if condition.operator == Operator::WithinDays {
        let days = parse_number(&raw)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0)
            .ok_or_else(|| comparison_error(condition, raw.clone(), "day count"))?;
        let Some(actual) = present(actual) else {
            return Ok(false);
        };
        let day = actual
            .as_date()
            .ok_or_else(|| comparison_error(condition, actual.display(), "date"))?;
        let delta = (day - ctx.today).num_days().abs();
        return Ok(delta as f64 <= days);
    }

    let wanted = match &condition.value {
        FilterValue::Scalar(v) => v.as_date(),
        FilterValue::List(_) => None,
    }
    .ok_or_else(|| comparison_error(condition, raw, "date"))?;

    let Some(actual) = present(actual) else {
        return Ok(false);
    };
    let day = actual
        .as_date()
        .ok_or_else(|| comparison_error(condition, actual.display(), "date"))?;

    Ok(match condition.operator {
        Operator::Equals => day == wanted,
        Operator::Before => day < wanted,
        Operator::After => day > wanted,
        Operator::OnOrBefore => day <= wanted,
        Operator::OnOrAfter => day >= wanted,
        _ => true,
    })
}

/// A condition that was skipped for one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterWarning {
    pub condition_id: String,
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOutcome {
    pub records: Vec<Record>,
    pub warnings: Vec<FilterWarning>,
}

impl FilterOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Applies `conditions` as a conjunction.
///
/// Field references are resolved before any record is touched, so an unknown
/// field fails the whole call. Each condition is then evaluated against the
/// full input; a condition that raises a comparison error on any record is
/// dropped and reported instead. Dropping is decided on the full input so
/// the result does not depend on condition order.
pub fn apply_filters(
    records: &[Record],
    conditions: &[FilterCondition],
    registry: &FieldRegistry,
    ctx: &EvalContext,
) -> Result<FilterOutcome> {
    let fields = conditions
        .iter()
        .map(|c| registry.resolve(&c.field))
        .collect::<Result<Vec<_>>>()?;

    let mut keep = vec![true; records.len()];
    let mut warnings = Vec::new();

    for (condition, field) in conditions.iter().zip(fields) {
        let verdicts = records
            .iter()
            .map(|r| matches(r, condition, field, ctx))
            .collect::<Result<Vec<bool>>>();

        match verdicts {
            Ok(verdicts) => {
                for (slot, pass) in keep.iter_mut().zip(verdicts) {
                    *slot = *slot && pass;
                }
            }
            Err(err) => {
                warn!("skipping filter {} on '{}': {}", condition.id, condition.field, err);
                warnings.push(FilterWarning {
                    condition_id: condition.id.clone(),
                    field: condition.field.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    let records = records
        .iter()
        .zip(keep)
        .filter_map(|(r, pass)| pass.then(|| r.clone()))
        .collect();

    Ok(FilterOutcome { records, warnings })
}

/// Case-insensitive substring search over every value of each record.
pub fn search_records(records: &[Record], query: &str) -> Vec<Record> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| {
            r.id.to_lowercase().contains(&needle)
                || r
                    .values
                    .values()
                    .any(|v| v.display().to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Ordered list of active conditions, combined with AND.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct FilterSet {
    conditions: Vec<FilterCondition>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, condition: FilterCondition) {
        self.conditions.push(condition);
    }

    pub fn remove(&mut self, id: &str) -> Option<FilterCondition> {
        let pos = self.conditions.iter().position(|c| c.id == id)?;
        Some(self.conditions.remove(pos))
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn apply(
        &self,
        records: &[Record],
        registry: &FieldRegistry,
        ctx: &EvalContext,
    ) -> Result<FilterOutcome> {
        apply_filters(records, &self.conditions, registry, ctx)
    }
}

impl FromIterator<FilterCondition> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilterCondition>>(iter: I) -> Self {
        FilterSet {
            conditions: iter.into_iter().collect(),
        }
    }
}
