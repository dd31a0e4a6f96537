//! Name-keyed registry of compiled conditions.
//!
//! Built once per form model in declaration order and read-only after
//! that. Lookups happen at predicate call time, so a condition may
//! reference one declared after it. Reference cycles and unknown
//! references are rejected here, at build time; the evaluator's
//! in-flight guard is the runtime backstop for hand-built registries.

use std::collections::{BTreeMap, BTreeSet};

use formwalk_definition::{BooleanExpr, ConditionDef};

use crate::condition::Condition;
use crate::types::ModelError;

/// Immutable collection of compiled conditions, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ConditionRegistry {
    conditions: BTreeMap<String, Condition>,
}

impl ConditionRegistry {
    /// Compile every condition in declaration order, rejecting duplicate
    /// names, unknown references, and reference cycles.
    pub fn build(defs: &[ConditionDef]) -> Result<ConditionRegistry, ModelError> {
        let mut conditions = BTreeMap::new();
        for def in defs {
            let compiled = Condition::compile(def);
            if conditions.insert(def.name.clone(), compiled).is_some() {
                return Err(ModelError::DuplicateConditionName {
                    name: def.name.clone(),
                });
            }
        }

        let registry = ConditionRegistry { conditions };
        registry.check_references(defs)?;
        Ok(registry)
    }

    /// Build from already-compiled conditions, skipping reference
    /// checks. Test hook for exercising the runtime cycle guard.
    #[cfg(test)]
    pub(crate) fn from_compiled(conditions: Vec<Condition>) -> ConditionRegistry {
        ConditionRegistry {
            conditions: conditions
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
        }
    }

    /// Look up a compiled condition by name.
    pub fn resolve(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    /// Whether a name is registered. Used by model construction to
    /// validate transition guards and list item conditions.
    pub fn knows(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    /// Number of registered conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// DFS over condition-reference edges: every reference must resolve
    /// and no chain may revisit a condition.
    fn check_references(&self, defs: &[ConditionDef]) -> Result<(), ModelError> {
        let mut done: BTreeSet<&str> = BTreeSet::new();
        for def in defs {
            let mut stack: BTreeSet<&str> = BTreeSet::new();
            stack.insert(&def.name);
            self.visit(&def.name, &def.expression, &mut stack, &mut done)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        owner: &str,
        expr: &'a BooleanExpr,
        stack: &mut BTreeSet<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> Result<(), ModelError> {
        match expr {
            BooleanExpr::Comparison { .. } => Ok(()),
            BooleanExpr::All(items) | BooleanExpr::Any(items) => {
                for item in items {
                    self.visit(owner, item, stack, done)?;
                }
                Ok(())
            }
            BooleanExpr::Not(inner) => self.visit(owner, inner, stack, done),
            BooleanExpr::ConditionRef(name) => {
                let referenced = self.conditions.get(name).ok_or_else(|| {
                    ModelError::UnknownConditionReference {
                        condition: owner.to_string(),
                        reference: name.clone(),
                    }
                })?;
                if done.contains(name.as_str()) {
                    return Ok(());
                }
                if !stack.insert(name) {
                    return Err(ModelError::ConditionCycle { name: name.clone() });
                }
                self.visit(name, &referenced.expr, stack, done)?;
                stack.remove(name.as_str());
                done.insert(name);
                Ok(())
            }
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
