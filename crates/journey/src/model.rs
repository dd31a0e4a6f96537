//! Compiled form model.
//!
//! Built once from a [`FormDefinition`] and immutable afterwards, so a
//! single model can serve arbitrarily many concurrent walks without
//! locking. Structural defects (duplicate paths, unknown condition or
//! list references, cycles) surface here rather than mid-walk.

use std::collections::BTreeMap;

use formwalk_definition::{FormDefinition, SchemaGeneration};

use crate::page::{ListTable, Page};
use crate::registry::ConditionRegistry;
use crate::types::ModelError;

/// An immutable compiled form: page graph, condition registry, list
/// table, and start path.
#[derive(Debug, Clone)]
pub struct FormModel {
    pub name: String,
    pub pages: Vec<Page>,
    pub start_path: String,
    pub registry: ConditionRegistry,
    pub lists: ListTable,
    pub schema_generation: SchemaGeneration,
    page_index: BTreeMap<String, usize>,
}

impl FormModel {
    pub fn new(def: &FormDefinition) -> Result<FormModel, ModelError> {
        if def.pages.is_empty() {
            return Err(ModelError::NoPages);
        }

        let registry = ConditionRegistry::build(&def.conditions)?;
        let lists = ListTable::build(&def.lists);

        let pages: Vec<Page> = def.pages.iter().map(Page::from_def).collect();
        let mut page_index = BTreeMap::new();
        for (i, page) in pages.iter().enumerate() {
            if page_index.insert(page.path.clone(), i).is_some() {
                return Err(ModelError::DuplicatePagePath {
                    path: page.path.clone(),
                });
            }
        }

        // Transition guards must name registered conditions
        for page in &pages {
            for transition in &page.transitions {
                if let Some(name) = &transition.condition {
                    if !registry.knows(name) {
                        return Err(ModelError::UnknownTransitionCondition {
                            page: page.path.clone(),
                            condition: name.clone(),
                        });
                    }
                }
            }
            // List bindings must name known lists
            for component in &page.components {
                if let Some(list_name) = &component.list {
                    if lists.get(list_name).is_none() {
                        return Err(ModelError::UnknownList {
                            component: component.key.clone(),
                            list: list_name.clone(),
                        });
                    }
                }
            }
        }

        // Item conditions must name registered conditions
        for list in lists.iter() {
            for item in &list.items {
                if let Some(name) = &item.condition {
                    if !registry.knows(name) {
                        return Err(ModelError::UnknownItemCondition {
                            list: list.name.clone(),
                            condition: name.clone(),
                        });
                    }
                }
            }
        }

        let start_path = match &def.start_path {
            Some(path) => {
                if !page_index.contains_key(path) {
                    return Err(ModelError::UnknownStartPage { path: path.clone() });
                }
                path.clone()
            }
            None => pages[0].path.clone(),
        };

        Ok(FormModel {
            name: def.name.clone(),
            pages,
            start_path,
            registry,
            lists,
            schema_generation: def.schema_generation,
            page_index,
        })
    }

    /// Look up a page by path.
    pub fn get_page(&self, path: &str) -> Option<&Page> {
        self.page_index.get(path).map(|&i| &self.pages[i])
    }

    /// Every field key across every page, in page order. Used to
    /// pre-seed strict-mode evaluation state.
    pub fn all_field_keys(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.field_keys())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
