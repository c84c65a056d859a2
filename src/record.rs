//! Untyped backend entities.
//!
//! The admin API serves many resources with different shapes. [`Record`]
//! wraps a JSON object so every resource can be listed, searched and
//! filtered without a dedicated Rust type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ShopdeskError};
use crate::list::filter::{FieldSource, Matcher};
use crate::list::mutation::PayloadValidator;

/// One entity as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Value);

impl Record {
    /// Parse a JSON object from text.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Record(value))
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// Raw value at a dotted path such as `customer.email`. Array segments
    /// may be indexed numerically (`items.0.sku`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.0, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Display text of the value at `path`; `None` for missing or null.
    pub fn field(&self, path: &str) -> Option<String> {
        self.get(path).and_then(display_value)
    }

    /// Backend id read from `id_field`.
    pub fn id(&self, id_field: &str) -> Option<String> {
        self.field(id_field)
    }

    /// Every scalar in the record, depth first, for catch-all search.
    pub fn text_values(&self) -> Vec<String> {
        let mut parts = Vec::new();
        collect_text(&self.0, &mut parts);
        parts
    }

    /// Top-level keys; empty when the record is not an object.
    pub fn keys(&self) -> Vec<String> {
        self.as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Matcher searching every text value of a record, one value at a time.
    pub fn all_text_matcher() -> Matcher<Record> {
        std::sync::Arc::new(|record: &Record| record.text_values())
    }
}

impl FieldSource for Record {
    fn field_text(&self, field: &str) -> Option<String> {
        self.field(field)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record(value)
    }
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(display_value)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

fn collect_text(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => parts.push(s.clone()),
        Value::Bool(b) => parts.push(b.to_string()),
        Value::Number(n) => parts.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, parts)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, parts)),
    }
}

/// Accepts payloads that are JSON objects, optionally with required fields.
#[derive(Debug, Clone, Default)]
pub struct JsonObjectValidator {
    required: Vec<String>,
}

impl JsonObjectValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required.push(field.into());
        self
    }
}

impl PayloadValidator<Record> for JsonObjectValidator {
    fn validate(&self, payload: &Record) -> Result<()> {
        let Some(map) = payload.as_object() else {
            return Err(ShopdeskError::Validation(
                "payload must be a JSON object".to_string(),
            ));
        };

        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|field| {
                map.get(field.as_str())
                    .is_none_or(|v| v.is_null() || v.as_str().is_some_and(|s| s.trim().is_empty()))
            })
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(ShopdeskError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}
