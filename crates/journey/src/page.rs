//! Runtime pages, components, and lists.
//!
//! Pages carry the ordered guarded transitions the walker routes on,
//! the components that own state keys, and the capability tags the
//! engine dispatches on (`has_list_binding`, `is_multi`, `is_repeater`)
//! -- fixed at construction, never probed via runtime type tests.

use std::collections::BTreeMap;

use formwalk_definition::{
    ComponentDef, ComponentKind, ListDef, ListItemDef, NextDef, PageDef, YES_NO_LIST,
};

use crate::registry::ConditionRegistry;
use crate::types::{json_to_value, EvaluationState, FormState, Value};

/// Controller tag marking a repeater page: its per-item values are not
/// flattened into scalar evaluation state.
pub const REPEAT_CONTROLLER: &str = "RepeatPageController";

/// A guarded outgoing transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target_path: String,
    /// Registered condition name; a transition without one always matches.
    pub condition: Option<String>,
}

/// A runtime component (field) owned by a page.
#[derive(Debug, Clone)]
pub struct Component {
    pub key: String,
    pub kind: ComponentKind,
    pub title: String,
    pub required: bool,
    pub list: Option<String>,
    pub max_length: Option<usize>,
}

impl Component {
    pub fn from_def(def: &ComponentDef) -> Component {
        Component {
            key: def.key.clone(),
            kind: def.kind.clone(),
            title: def.title.clone(),
            required: def.required,
            list: def.list.clone(),
            max_length: def.max_length,
        }
    }

    /// Whether this component selects from a bound list. The fixed
    /// yes/no list does not count: it can never be conditional.
    pub fn has_list_binding(&self) -> bool {
        self.kind.has_list_binding()
            && self.list.as_deref().is_some_and(|l| l != YES_NO_LIST)
    }

    /// Whether this component stores multiple values.
    pub fn is_multi(&self) -> bool {
        self.kind.is_multi()
    }
}

/// A runtime page in the graph.
#[derive(Debug, Clone)]
pub struct Page {
    pub path: String,
    pub title: String,
    pub components: Vec<Component>,
    pub transitions: Vec<Transition>,
    pub is_repeater: bool,
}

impl Page {
    pub fn from_def(def: &PageDef) -> Page {
        Page {
            path: def.path.clone(),
            title: def.title.clone(),
            components: def.components.iter().map(Component::from_def).collect(),
            transitions: def
                .next
                .iter()
                .map(|NextDef { path, condition }| Transition {
                    target_path: path.clone(),
                    condition: condition.clone(),
                })
                .collect(),
            is_repeater: def.controller.as_deref() == Some(REPEAT_CONTROLLER),
        }
    }

    /// State keys owned by this page.
    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.key.as_str())
    }

    pub fn owns_field(&self, key: &str) -> bool {
        self.components.iter().any(|c| c.key == key)
    }

    /// Project this page's raw answers into condition-evaluable form.
    /// List selections already store the item's underlying value, so the
    /// projection is the JSON-to-value conversion per component key.
    pub fn context_values(&self, state: &FormState) -> Vec<(String, Value)> {
        self.components
            .iter()
            .filter_map(|c| {
                state
                    .get(&c.key)
                    .map(|raw| (c.key.clone(), json_to_value(raw)))
            })
            .collect()
    }

    /// Resolve the next page path: first transition whose condition
    /// evaluates true wins; an unguarded transition always matches. A
    /// guard naming an unregistered condition never matches.
    pub fn next_path(
        &self,
        state: &EvaluationState,
        registry: &ConditionRegistry,
    ) -> Option<&str> {
        for transition in &self.transitions {
            match &transition.condition {
                None => return Some(&transition.target_path),
                Some(name) => {
                    if let Some(cond) = registry.resolve(name) {
                        if cond.predicate(state, registry) {
                            return Some(&transition.target_path);
                        }
                    }
                }
            }
        }
        None
    }
}

// ── Lists ───────────────────────────────────────────────────────────

/// Static list table: definition lists plus the fixed yes/no list,
/// keyed by name. Loaded once at model construction.
#[derive(Debug, Clone, Default)]
pub struct ListTable {
    lists: BTreeMap<String, ListDef>,
}

impl ListTable {
    pub fn build(defs: &[ListDef]) -> ListTable {
        let mut lists = BTreeMap::new();
        let yes_no = ListDef::yes_no();
        lists.insert(yes_no.name.clone(), yes_no);
        for def in defs {
            lists.insert(def.name.clone(), def.clone());
        }
        ListTable { lists }
    }

    pub fn get(&self, name: &str) -> Option<&ListDef> {
        self.lists.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListDef> {
        self.lists.values()
    }
}

/// The subset of a list's item values whose conditions currently hold.
pub fn valid_values<'a>(
    items: &'a [ListItemDef],
    state: &EvaluationState,
    registry: &ConditionRegistry,
) -> Vec<&'a serde_json::Value> {
    items
        .iter()
        .filter(|item| match &item.condition {
            None => true,
            Some(name) => registry
                .resolve(name)
                .is_some_and(|c| c.predicate(state, registry)),
        })
        .map(|item| &item.value)
        .collect()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use formwalk_definition::{BooleanExpr, ConditionDef, Operand, Operator};

    fn page_with_transitions(transitions: Vec<Transition>) -> Page {
        Page {
            path: "/here".to_string(),
            title: "Here".to_string(),
            components: vec![],
            transitions,
            is_repeater: false,
        }
    }

    fn flag_registry() -> ConditionRegistry {
        ConditionRegistry::build(&[ConditionDef {
            name: "flagSet".to_string(),
            display_name: "Flag set".to_string(),
            expression: BooleanExpr::Comparison {
                field: "flag".to_string(),
                operator: Operator::Is,
                operand: Operand::Literal(serde_json::json!(true)),
            },
        }])
        .unwrap()
    }

    #[test]
    fn first_matching_transition_wins() {
        let page = page_with_transitions(vec![
            Transition {
                target_path: "/guarded".to_string(),
                condition: Some("flagSet".to_string()),
            },
            Transition {
                target_path: "/fallback".to_string(),
                condition: None,
            },
        ]);
        let registry = flag_registry();

        let mut state = EvaluationState::new();
        state.insert("flag".to_string(), Value::Bool(true));
        assert_eq!(page.next_path(&state, &registry), Some("/guarded"));

        state.insert("flag".to_string(), Value::Bool(false));
        assert_eq!(page.next_path(&state, &registry), Some("/fallback"));
    }

    #[test]
    fn no_transition_matches() {
        let page = page_with_transitions(vec![Transition {
            target_path: "/guarded".to_string(),
            condition: Some("flagSet".to_string()),
        }]);
        let registry = flag_registry();
        let state = EvaluationState::new();
        assert_eq!(page.next_path(&state, &registry), None);
    }

    #[test]
    fn unknown_guard_never_matches() {
        let page = page_with_transitions(vec![Transition {
            target_path: "/guarded".to_string(),
            condition: Some("ghost".to_string()),
        }]);
        let registry = ConditionRegistry::build(&[]).unwrap();
        let state = EvaluationState::new();
        assert_eq!(page.next_path(&state, &registry), None);
    }

    #[test]
    fn yes_no_binding_is_not_conditional() {
        let component = Component {
            key: "consent".to_string(),
            kind: ComponentKind::Select,
            title: "Consent".to_string(),
            required: true,
            list: Some(YES_NO_LIST.to_string()),
            max_length: None,
        };
        assert!(!component.has_list_binding());
    }

    #[test]
    fn context_values_are_sparse() {
        let page = Page {
            path: "/p".to_string(),
            title: "P".to_string(),
            components: vec![
                Component {
                    key: "answered".to_string(),
                    kind: ComponentKind::Number,
                    title: "Answered".to_string(),
                    required: true,
                    list: None,
                    max_length: None,
                },
                Component {
                    key: "unanswered".to_string(),
                    kind: ComponentKind::Text,
                    title: "Unanswered".to_string(),
                    required: false,
                    list: None,
                    max_length: None,
                },
            ],
            transitions: vec![],
            is_repeater: false,
        };

        let mut state = FormState::new();
        state.insert("answered".to_string(), serde_json::json!(7));
        let values = page.context_values(&state);
        assert_eq!(values, vec![("answered".to_string(), Value::Int(7))]);
    }

    #[test]
    fn valid_values_filters_on_condition() {
        let items = vec![
            ListItemDef {
                text: "Walk".to_string(),
                value: serde_json::json!("walk"),
                condition: None,
            },
            ListItemDef {
                text: "Drive".to_string(),
                value: serde_json::json!("drive"),
                condition: Some("flagSet".to_string()),
            },
        ];
        let registry = flag_registry();

        let mut state = EvaluationState::new();
        state.insert("flag".to_string(), Value::Bool(false));
        let values = valid_values(&items, &state, &registry);
        assert_eq!(values, vec![&serde_json::json!("walk")]);

        state.insert("flag".to_string(), Value::Bool(true));
        let values = valid_values(&items, &state, &registry);
        assert_eq!(values.len(), 2);
    }
}
