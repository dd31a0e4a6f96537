//! Per-component and cross-page state validation.
//!
//! A page's schema is its component list; the cross-page schema is the
//! concatenation over every relevant page except the one being
//! answered. Validation strips unknown keys by construction: only keys
//! owned by a supplied page are ever inspected, so stale answers from
//! removed pages can never fail a walk. Failures are data
//! ([`ValidationError`]), never `Err`.

use formwalk_definition::ComponentKind;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::datefn;
use crate::page::{Component, Page};
use crate::types::{FormState, ValidationError};

/// Validate the accumulated relevant state against the concatenated
/// schemas of the supplied pages.
pub fn validate_pages(pages: &[&Page], state: &FormState) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for page in pages {
        // Repeater pages store per-item arrays; their controller owns
        // per-item validation
        if page.is_repeater {
            continue;
        }
        for component in &page.components {
            if let Some(err) = validate_component(component, state.get(&component.key)) {
                errors.push(err);
            }
        }
    }
    errors
}

/// Validate a submitted payload against the current page's schema and
/// return the sanitized subset to merge into working state: only keys
/// the page owns, with empty-string answers dropped rather than stored.
pub fn validate_payload(page: &Page, payload: &FormState) -> (FormState, Vec<ValidationError>) {
    let mut sanitized = FormState::new();
    let mut errors = Vec::new();

    for component in &page.components {
        let raw = payload.get(&component.key);
        if let Some(err) = validate_component(component, raw) {
            errors.push(err);
        }
        match raw {
            Some(serde_json::Value::String(s)) if s.is_empty() => {}
            Some(value) => {
                sanitized.insert(component.key.clone(), value.clone());
            }
            None => {}
        }
    }

    (sanitized, errors)
}

/// Validate one component against its (possibly absent) raw answer.
fn validate_component(
    component: &Component,
    raw: Option<&serde_json::Value>,
) -> Option<ValidationError> {
    let raw = match raw {
        None | Some(serde_json::Value::Null) => {
            if component.required && validates(&component.kind) {
                return Some(ValidationError::field(
                    &component.key,
                    format!("{} is required", component.title),
                ));
            }
            return None;
        }
        Some(serde_json::Value::String(s)) if s.is_empty() => {
            if component.required && validates(&component.kind) {
                return Some(ValidationError::field(
                    &component.key,
                    format!("{} is required", component.title),
                ));
            }
            return None;
        }
        Some(value) => value,
    };

    match &component.kind {
        ComponentKind::Text | ComponentKind::MultilineText => {
            let s = match raw.as_str() {
                Some(s) => s,
                None => {
                    return Some(ValidationError::field(
                        &component.key,
                        format!("{} must be text", component.title),
                    ));
                }
            };
            if let Some(max) = component.max_length {
                if s.chars().count() > max {
                    return Some(ValidationError::field(
                        &component.key,
                        format!("{} must be {} characters or fewer", component.title, max),
                    ));
                }
            }
            None
        }

        ComponentKind::Number => {
            let ok = match raw {
                serde_json::Value::Number(_) => true,
                serde_json::Value::String(s) => Decimal::from_str(s.trim()).is_ok(),
                _ => false,
            };
            if ok {
                None
            } else {
                Some(ValidationError::field(
                    &component.key,
                    format!("{} must be a number", component.title),
                ))
            }
        }

        ComponentKind::Date => {
            let ok = raw.as_str().is_some_and(datefn::is_iso_date);
            if ok {
                None
            } else {
                Some(ValidationError::field(
                    &component.key,
                    format!("{} must be a real date", component.title),
                ))
            }
        }

        ComponentKind::YesNo => {
            let ok = matches!(raw, serde_json::Value::Bool(_))
                || matches!(raw.as_str(), Some("true") | Some("false"));
            if ok {
                None
            } else {
                Some(ValidationError::field(
                    &component.key,
                    format!("{} must be yes or no", component.title),
                ))
            }
        }

        ComponentKind::Select => {
            if raw.is_array() || raw.is_object() {
                Some(ValidationError::field(
                    &component.key,
                    format!("{} must be a single value", component.title),
                ))
            } else {
                None
            }
        }

        ComponentKind::Checkboxes => {
            if raw.is_array() {
                None
            } else {
                Some(ValidationError::field(
                    &component.key,
                    format!("{} must be a list of values", component.title),
                ))
            }
        }

        // Unknown widget kinds pass through unvalidated
        ComponentKind::Other(_) => None,
    }
}

/// Whether a component kind participates in validation at all.
fn validates(kind: &ComponentKind) -> bool {
    !matches!(kind, ComponentKind::Other(_))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
