use crate::field::FieldType;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell value. Dates are kept as calendar days.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Text shown in the grid and used by substring matching.
    pub fn display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            Value::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => parse_date(s),
            Value::Number(_) => None,
        }
    }

    /// Re-types a raw text value for a field of the given type. Values that
    /// do not parse stay as text so nothing is lost on import.
    pub fn coerce(self, semantic_type: FieldType) -> Value {
        match (semantic_type, self) {
            (FieldType::Number, Value::Text(s)) => match parse_number(&s) {
                Some(n) => Value::Number(n),
                None => Value::Text(s),
            },
            (FieldType::Date, Value::Text(s)) => match parse_date(&s) {
                Some(d) => Value::Date(d),
                None => Value::Text(s),
            },
            (_, value) => value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Standard float parse after trimming; empty text is not a number.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its calendar day is used).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(d);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// One row of a table. The engine only reads records; it never mutates them.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Stringified field value; `id` resolves to the record id and absent
    /// fields read as the empty string.
    pub fn text_of(&self, field: &str) -> String {
        if field == "id" && !self.values.contains_key("id") {
            return self.id.clone();
        }
        self.values.get(field).map(Value::display).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_drops_integral_fraction() {
        assert_eq!(Value::Number(50.0).display(), "50");
        assert_eq!(Value::Number(2.5).display(), "2.5");
    }

    #[test]
    fn coerce_keeps_unparseable_text() {
        let v = Value::text("soon").coerce(FieldType::Date);
        assert_eq!(v, Value::text("soon"));
        let v = Value::text("2024-10-25").coerce(FieldType::Date);
        assert_eq!(v, Value::Date(NaiveDate::from_ymd_opt(2024, 10, 25).unwrap()));
        let v = Value::text(" 42 ").coerce(FieldType::Number);
        assert_eq!(v, Value::Number(42.0));
    }

    #[test]
    fn rfc3339_timestamps_parse_to_their_day() {
        assert_eq!(
            parse_date("2024-11-08T10:30:00Z"),
            NaiveDate::from_ymd_opt(2024, 11, 8)
        );
        assert_eq!(parse_date("11/08/2024"), None);
    }

    #[test]
    fn text_of_reads_id_and_missing_fields() {
        let r = Record::new("7").with("status", "Pending");
        assert_eq!(r.text_of("id"), "7");
        assert_eq!(r.text_of("status"), "Pending");
        assert_eq!(r.text_of("priority"), "");
    }
}
