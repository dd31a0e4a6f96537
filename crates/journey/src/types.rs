//! Runtime value types and error taxonomy for the journey engine.
//!
//! These types are DISTINCT from the definition constructs: the engine
//! works on a condition-evaluable projection of raw answers, not on
//! definition JSON. All numeric comparison uses `rust_decimal::Decimal`
//! -- never `f64`.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::datefn;

/// Reserved state key for the per-session reference number. Its absence
/// (or emptiness) is a caller contract breach, not a validation error.
pub const REFERENCE_NUMBER_KEY: &str = "referenceNumber";

/// Raw caller-supplied answers for the whole session, keyed by field name.
pub type FormState = BTreeMap<String, serde_json::Value>;

/// Per-request condition-evaluable projection of collected answers.
pub type EvaluationState = BTreeMap<String, Value>;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors during model construction. These are structural defects in the
/// definition and are raised once, when the model is compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("definition has no pages")]
    NoPages,

    #[error("duplicate page path: '{path}'")]
    DuplicatePagePath { path: String },

    #[error("duplicate condition name: '{name}'")]
    DuplicateConditionName { name: String },

    #[error("condition '{condition}' references unknown condition '{reference}'")]
    UnknownConditionReference { condition: String, reference: String },

    #[error("condition reference cycle through '{name}'")]
    ConditionCycle { name: String },

    #[error("page '{page}' transition guarded by unknown condition '{condition}'")]
    UnknownTransitionCondition { page: String, condition: String },

    #[error("component '{component}' bound to unknown list '{list}'")]
    UnknownList { component: String, list: String },

    #[error("list '{list}' item gated by unknown condition '{condition}'")]
    UnknownItemCondition { list: String, condition: String },

    #[error("start page '{path}' not found")]
    UnknownStartPage { path: String },
}

/// Fatal errors during a walk. Validation failures are never raised this
/// way -- they are data collected into the context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JourneyError {
    /// The state snapshot lacks a non-empty reference number string.
    #[error("state is missing a non-empty 'referenceNumber' string")]
    MissingReferenceNumber,

    /// The state snapshot is not a JSON object.
    #[error("state must be a JSON object")]
    InvalidState,

    /// The walk revisited pages beyond the page count, which can only
    /// happen with a transition cycle in the definition.
    #[error("walk exceeded {steps} steps at '{path}': transition cycle")]
    WalkLoop { path: String, steps: usize },
}

// ──────────────────────────────────────────────
// Validation errors (data, not exceptions)
// ──────────────────────────────────────────────

/// A single surfaced validation failure, in the shape consumed by
/// error-summary rendering layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// State key path the error applies to.
    pub path: String,
    /// Anchor href for error-summary links.
    pub href: String,
    /// Field name.
    pub name: String,
    /// User-facing message. ISO dates are reformatted for humans.
    pub text: String,
    /// Optional machine-readable context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl ValidationError {
    /// Build an error keyed to a field, humanizing any ISO dates the
    /// message carries.
    pub fn field(key: &str, text: impl Into<String>) -> ValidationError {
        ValidationError {
            path: key.to_string(),
            href: format!("#{}", key),
            name: key.to_string(),
            text: datefn::humanize_dates_in(&text.into()),
            context: None,
        }
    }
}

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// Condition-evaluable runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Pre-seeded placeholder for a not-yet-answered field.
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Text(String),
    /// ISO 8601 calendar date (YYYY-MM-DD).
    Date(String),
    List(Vec<Value>),
}

impl Value {
    /// Human-readable type name for failure messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Decimal(_) => "Decimal",
            Value::Text(_) => "Text",
            Value::Date(_) => "Date",
            Value::List(_) => "List",
        }
    }

    /// Numeric view of the value, if it has one. Numeric strings count:
    /// raw answers arrive as form-encoded text.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            Value::Text(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// String view for Text and Date values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Date(s) => Some(s),
            _ => None,
        }
    }
}

/// Convert a raw stored JSON answer into a condition-evaluable value.
///
/// Strings shaped like ISO dates become `Date`; integral numbers become
/// `Int`; other numbers become `Decimal`. Objects have no evaluable
/// projection and fold to `Null`.
pub fn json_to_value(raw: &serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Decimal::from_str(&n.to_string())
                    .map(Value::Decimal)
                    .unwrap_or(Value::Null)
            }
        }
        serde_json::Value::String(s) => {
            if datefn::is_iso_date(s) {
                Value::Date(s.clone())
            } else {
                Value::Text(s.clone())
            }
        }
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(_) => Value::Null,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalars_convert() {
        assert_eq!(json_to_value(&serde_json::json!(true)), Value::Bool(true));
        assert_eq!(json_to_value(&serde_json::json!(42)), Value::Int(42));
        assert_eq!(
            json_to_value(&serde_json::json!("hello")),
            Value::Text("hello".to_string())
        );
        assert_eq!(json_to_value(&serde_json::Value::Null), Value::Null);
    }

    #[test]
    fn iso_date_strings_become_dates() {
        assert_eq!(
            json_to_value(&serde_json::json!("2024-02-29")),
            Value::Date("2024-02-29".to_string())
        );
        // Shaped like a date but not a real one -- stays text
        assert_eq!(
            json_to_value(&serde_json::json!("2024-13-99")),
            Value::Text("2024-13-99".to_string())
        );
    }

    #[test]
    fn arrays_convert_elementwise() {
        assert_eq!(
            json_to_value(&serde_json::json!(["a", 1])),
            Value::List(vec![Value::Text("a".to_string()), Value::Int(1)])
        );
    }

    #[test]
    fn numeric_strings_have_decimal_view() {
        assert_eq!(
            Value::Text("17".to_string()).as_decimal(),
            Some(Decimal::from(17))
        );
        assert_eq!(Value::Bool(true).as_decimal(), None);
    }

    #[test]
    fn field_error_shape() {
        let err = ValidationError::field("age", "Age is required");
        assert_eq!(err.path, "age");
        assert_eq!(err.href, "#age");
        assert_eq!(err.name, "age");
        assert_eq!(err.text, "Age is required");
        assert!(err.context.is_none());
    }
}
