//! List-item validity index.
//!
//! After an upstream answer changes, a previously-stored list selection
//! may no longer be among a list's currently-valid items. This check
//! recomputes the valid value set per list-bound field and flags stored
//! values that fell outside it. A field with no stored value cannot be
//! invalid: there is nothing to invalidate.

use crate::model::FormModel;
use crate::page::{valid_values, Page};
use crate::types::{EvaluationState, FormState, ValidationError};

/// Message surfaced when a stored selection is no longer a valid option.
pub const OPTION_INVALIDATED_TEXT: &str =
    "This answer is no longer valid because a previous answer has changed the available options";

/// Check every conditionally-listed field on a page against the current
/// state. Returns the first invalidation found; the walker halts on it.
pub fn check_page_lists(
    page: &Page,
    state: &FormState,
    evaluation_state: &EvaluationState,
    model: &FormModel,
) -> Option<ValidationError> {
    // Repeater pages store per-item arrays, not scalar selections
    if page.is_repeater {
        return None;
    }
    for component in &page.components {
        if !component.has_list_binding() {
            continue;
        }
        let list = match component.list.as_deref().and_then(|name| model.lists.get(name)) {
            Some(list) => list,
            None => continue,
        };

        // Only lists with at least one conditional item can invalidate
        if list.items.iter().all(|item| item.condition.is_none()) {
            continue;
        }

        let stored = match state.get(&component.key) {
            Some(value) => value,
            None => continue,
        };

        let valid = valid_values(&list.items, evaluation_state, &model.registry);

        let invalid = match stored {
            serde_json::Value::Array(selected) => {
                selected.iter().any(|v| !valid.contains(&v))
            }
            scalar => !valid.contains(&scalar),
        };

        if invalid {
            return Some(ValidationError::field(
                &component.key,
                OPTION_INVALIDATED_TEXT,
            ));
        }
    }
    None
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FormModel;
    use crate::types::{json_to_value, Value};
    use formwalk_definition::from_definition;

    fn activities_model() -> FormModel {
        let def = serde_json::json!({
            "name": "Form",
            "pages": [
                {
                    "path": "/activity",
                    "title": "Activity",
                    "components": [
                        { "type": "CheckboxesField", "name": "activities", "title": "Activities", "list": "activities" }
                    ],
                    "next": []
                }
            ],
            "lists": [
                {
                    "name": "activities",
                    "items": [
                        { "text": "Walk", "value": "walk" },
                        { "text": "Drive", "value": "drive", "condition": "isAdult" }
                    ]
                }
            ],
            "conditions": [
                {
                    "name": "isAdult",
                    "displayName": "Is adult",
                    "value": {
                        "conditions": [
                            {
                                "field": { "name": "age", "type": "NumberField", "display": "Age" },
                                "operator": "is at least",
                                "value": { "type": "Value", "value": "18", "display": "18" }
                            }
                        ]
                    }
                }
            ]
        });
        FormModel::new(&from_definition(&def).unwrap()).unwrap()
    }

    fn eval_state(age: i64) -> EvaluationState {
        let mut state = EvaluationState::new();
        state.insert("age".to_string(), json_to_value(&serde_json::json!(age)));
        state
    }

    #[test]
    fn no_stored_value_cannot_be_invalid() {
        let model = activities_model();
        let page = model.get_page("/activity").unwrap();
        let result = check_page_lists(page, &FormState::new(), &eval_state(15), &model);
        assert!(result.is_none());
    }

    #[test]
    fn stored_value_excluded_by_condition_is_invalid() {
        let model = activities_model();
        let page = model.get_page("/activity").unwrap();
        let mut state = FormState::new();
        state.insert(
            "activities".to_string(),
            serde_json::json!(["walk", "drive"]),
        );

        let result = check_page_lists(page, &state, &eval_state(15), &model);
        let err = result.expect("drive should be invalid for a 15 year old");
        assert_eq!(err.path, "activities");
        assert_eq!(err.text, OPTION_INVALIDATED_TEXT);
    }

    #[test]
    fn stored_value_still_valid_passes() {
        let model = activities_model();
        let page = model.get_page("/activity").unwrap();
        let mut state = FormState::new();
        state.insert(
            "activities".to_string(),
            serde_json::json!(["walk", "drive"]),
        );

        assert!(check_page_lists(page, &state, &eval_state(30), &model).is_none());

        // Value::Null placeholder evaluation also fails closed: the
        // conditional item simply drops out
        let mut null_state = EvaluationState::new();
        null_state.insert("age".to_string(), Value::Null);
        let mut walk_only = FormState::new();
        walk_only.insert("activities".to_string(), serde_json::json!(["walk"]));
        assert!(check_page_lists(page, &walk_only, &null_state, &model).is_none());
    }
}
