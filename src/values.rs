//! Field value validation against a column's type and current settings.
//!
//! Clients send untagged JSON (`"done"`, `42`, `true`, `null`); this module
//! turns it into a [`FieldValue`] whose variant matches the column type.

use crate::types::{Column, ColumnSettings, ColumnType, FieldValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("{column_type} column expects {expected}, got {got}")]
    WrongShape {
        column_type: &'static str,
        expected: &'static str,
        got: &'static str,
    },
    #[error("not an ISO date: {0}")]
    BadDate(String),
    #[error("unknown status option: {0}")]
    UnknownOption(String),
    #[error("status options are only allowed on STATUS columns")]
    OptionsNotAllowed,
    #[error("duplicate status option id: {0}")]
    DuplicateOption(String),
    #[error("status option id must not be blank")]
    BlankOptionId,
}

fn shape_of(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn wrong_shape(column_type: ColumnType, expected: &'static str, raw: &Value) -> ValueError {
    ValueError::WrongShape {
        column_type: column_type.as_str(),
        expected,
        got: shape_of(raw),
    }
}

/// Null and the empty string both mean "unset" for nullable types.
fn optional_string(column_type: ColumnType, raw: &Value) -> Result<Option<String>, ValueError> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(wrong_shape(column_type, "string or null", other)),
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]`.
pub fn is_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// Validate a client-supplied raw value against the column's current type and settings.
pub fn validate(column: &Column, raw: &Value) -> Result<FieldValue, ValueError> {
    let ty = column.column_type;
    match ty {
        ColumnType::Text => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            other => Err(wrong_shape(ty, "string", other)),
        },
        ColumnType::Number | ColumnType::Money => {
            let n = raw
                .as_f64()
                .filter(|n| n.is_finite())
                .ok_or_else(|| wrong_shape(ty, "number", raw))?;
            Ok(if ty == ColumnType::Money {
                FieldValue::Money(n)
            } else {
                FieldValue::Number(n)
            })
        }
        ColumnType::Date => match optional_string(ty, raw)? {
            Some(s) if !is_iso_date(&s) => Err(ValueError::BadDate(s)),
            date => Ok(FieldValue::Date(date)),
        },
        ColumnType::Status => match optional_string(ty, raw)? {
            Some(id) if column.settings.option(&id).is_none() => Err(ValueError::UnknownOption(id)),
            id => Ok(FieldValue::Status(id)),
        },
        // Membership is the caller's concern.
        ColumnType::Person => Ok(FieldValue::Person(optional_string(ty, raw)?)),
        ColumnType::Checkbox => match raw {
            Value::Bool(b) => Ok(FieldValue::Checkbox(*b)),
            other => Err(wrong_shape(ty, "boolean", other)),
        },
    }
}

/// Decode a stored raw value. Never consults settings, so stale STATUS ids
/// survive the read and render as unset later. Returns None on a shape mismatch.
pub fn decode_stored(column_type: ColumnType, raw: &Value) -> Option<FieldValue> {
    let text = |v: &Value| match v {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        _ => None,
    };
    match column_type {
        ColumnType::Text => raw.as_str().map(|s| FieldValue::Text(s.to_string())),
        ColumnType::Number => raw.as_f64().map(FieldValue::Number),
        ColumnType::Money => raw.as_f64().map(FieldValue::Money),
        ColumnType::Date => text(raw).map(FieldValue::Date),
        ColumnType::Status => text(raw).map(FieldValue::Status),
        ColumnType::Person => text(raw).map(FieldValue::Person),
        ColumnType::Checkbox => raw.as_bool().map(FieldValue::Checkbox),
    }
}

/// Check settings for a column type: option ids unique and non-blank, and
/// options only on STATUS columns.
pub fn validate_settings(column_type: ColumnType, settings: &ColumnSettings) -> Result<(), ValueError> {
    if column_type != ColumnType::Status {
        if settings.options.is_empty() {
            return Ok(());
        }
        return Err(ValueError::OptionsNotAllowed);
    }
    let mut seen = HashSet::new();
    for option in &settings.options {
        if option.id.trim().is_empty() {
            return Err(ValueError::BlankOptionId);
        }
        if !seen.insert(option.id.as_str()) {
            return Err(ValueError::DuplicateOption(option.id.clone()));
        }
    }
    Ok(())
}
