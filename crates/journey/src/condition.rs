//! Compiled conditions and expression evaluation.
//!
//! A [`Condition`] is the executable form of a definition's expression
//! tree. Its predicate evaluates against an [`EvaluationState`] and a
//! [`ConditionRegistry`] and ALWAYS returns a boolean: any evaluation
//! failure (absent field, type mismatch, unparsable date, unknown or
//! cyclic reference) folds to `false`. A condition must never crash a
//! walk, only fail closed.
//!
//! The expression tree is a recursive structure. And/Or nodes
//! short-circuit; condition references resolve lazily by name against
//! the SAME evaluation state, so named conditions compose.

use std::collections::BTreeSet;

use formwalk_definition::{BooleanExpr, ConditionDef, Operand, Operator};

use crate::datefn;
use crate::registry::ConditionRegistry;
use crate::types::{EvaluationState, Value};

/// Why an expression could not be evaluated. Never surfaced to callers:
/// every failure folds the predicate to `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EvalFailure {
    /// The referenced field has no entry in the evaluation state.
    UnknownField(String),
    /// Operand and field value have no common comparison.
    TypeMismatch(String),
    /// A referenced condition is not in the registry.
    UnknownCondition(String),
    /// A condition reference chain came back to itself.
    ConditionCycle(String),
}

/// An executable named condition. Owned exclusively by the registry and
/// immutable after compilation.
#[derive(Debug, Clone)]
pub struct Condition {
    pub name: String,
    pub display_name: String,
    pub(crate) expr: BooleanExpr,
}

impl Condition {
    /// Compile a condition definition. The expression tree was already
    /// structurally validated at deserialization; compilation fixes the
    /// executable form the registry owns.
    pub fn compile(def: &ConditionDef) -> Condition {
        Condition {
            name: def.name.clone(),
            display_name: def.display_name.clone(),
            expr: def.expression.clone(),
        }
    }

    /// Evaluate this condition against a state snapshot. Never fails:
    /// evaluation errors are treated as `false`.
    pub fn predicate(&self, state: &EvaluationState, registry: &ConditionRegistry) -> bool {
        let mut in_flight = BTreeSet::new();
        in_flight.insert(self.name.clone());
        eval_expr(&self.expr, state, registry, &mut in_flight).unwrap_or(false)
    }
}

/// Evaluate an expression node. `in_flight` carries the names of
/// conditions currently being resolved, so a reference cycle fails
/// explicitly instead of recursing without bound.
pub(crate) fn eval_expr(
    expr: &BooleanExpr,
    state: &EvaluationState,
    registry: &ConditionRegistry,
    in_flight: &mut BTreeSet<String>,
) -> Result<bool, EvalFailure> {
    match expr {
        BooleanExpr::Comparison {
            field,
            operator,
            operand,
        } => {
            let left = state
                .get(field)
                .ok_or_else(|| EvalFailure::UnknownField(field.clone()))?;
            let right = resolve_operand(operand);
            compare(left, *operator, &right)
        }

        BooleanExpr::All(items) => {
            for item in items {
                if !eval_expr(item, state, registry, in_flight)? {
                    // Short-circuit: one false decides the conjunction
                    return Ok(false);
                }
            }
            Ok(true)
        }

        BooleanExpr::Any(items) => {
            for item in items {
                if eval_expr(item, state, registry, in_flight)? {
                    // Short-circuit: one true decides the disjunction
                    return Ok(true);
                }
            }
            Ok(false)
        }

        BooleanExpr::Not(inner) => Ok(!eval_expr(inner, state, registry, in_flight)?),

        BooleanExpr::ConditionRef(name) => {
            if !in_flight.insert(name.clone()) {
                return Err(EvalFailure::ConditionCycle(name.clone()));
            }
            let referenced = registry
                .resolve(name)
                .ok_or_else(|| EvalFailure::UnknownCondition(name.clone()))?;
            let result = eval_expr(&referenced.expr, state, registry, in_flight);
            in_flight.remove(name);
            result
        }
    }
}

/// Resolve a comparison operand to a runtime value. Relative dates
/// resolve against today's UTC date at evaluation time.
fn resolve_operand(operand: &Operand) -> Value {
    match operand {
        Operand::Literal(raw) => crate::types::json_to_value(raw),
        Operand::RelativeDate { offset, unit } => {
            Value::Date(datefn::format_iso(datefn::date_for_comparison(*offset, *unit)))
        }
    }
}

/// Apply a comparison operator to a field value and a resolved operand.
fn compare(left: &Value, op: Operator, right: &Value) -> Result<bool, EvalFailure> {
    match op {
        Operator::Is => Ok(loose_eq(left, right)),
        Operator::IsNot => Ok(!loose_eq(left, right)),

        Operator::Contains => contains(left, right),
        Operator::DoesNotContain => contains(left, right).map(|b| !b),

        Operator::IsAtLeast
        | Operator::IsAtMost
        | Operator::IsMoreThan
        | Operator::IsLessThan => ordered(left, op, right),

        Operator::IsLongerThan | Operator::IsShorterThan | Operator::HasLength => {
            length_check(left, op, right)
        }
    }
}

/// Loose equality across the coercions raw form answers need: numeric
/// strings compare as numbers, "true"/"false" strings compare as
/// booleans, dates compare as dates. Mismatched types are unequal, not
/// an error.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Bool(l), Value::Text(s)) | (Value::Text(s), Value::Bool(l)) => {
            matches!((l, s.as_str()), (true, "true") | (false, "false"))
        }
        (Value::Date(l), Value::Date(r)) => l == r,
        (Value::List(l), Value::List(r)) => {
            l.len() == r.len() && l.iter().zip(r.iter()).all(|(a, b)| loose_eq(a, b))
        }
        _ => {
            if let (Some(l), Some(r)) = (left.as_decimal(), right.as_decimal()) {
                return l == r;
            }
            match (left.as_str(), right.as_str()) {
                (Some(l), Some(r)) => l == r,
                _ => false,
            }
        }
    }
}

/// Membership for list answers, substring for text answers.
fn contains(left: &Value, right: &Value) -> Result<bool, EvalFailure> {
    match left {
        Value::List(items) => Ok(items.iter().any(|item| loose_eq(item, right))),
        Value::Text(s) => {
            let needle = right.as_str().ok_or_else(|| {
                EvalFailure::TypeMismatch(format!(
                    "'contains' on Text needs a Text operand, got {}",
                    right.type_name()
                ))
            })?;
            Ok(s.contains(needle))
        }
        other => Err(EvalFailure::TypeMismatch(format!(
            "'contains' needs a List or Text field, got {}",
            other.type_name()
        ))),
    }
}

/// Ordering comparison: dates when either side is a date, decimal
/// otherwise.
fn ordered(left: &Value, op: Operator, right: &Value) -> Result<bool, EvalFailure> {
    if matches!(left, Value::Date(_)) || matches!(right, Value::Date(_)) {
        let l = left
            .as_str()
            .and_then(datefn::parse_iso_date)
            .ok_or_else(|| {
                EvalFailure::TypeMismatch(format!(
                    "date comparison needs a Date field, got {}",
                    left.type_name()
                ))
            })?;
        let r = right
            .as_str()
            .and_then(datefn::parse_iso_date)
            .ok_or_else(|| {
                EvalFailure::TypeMismatch(format!(
                    "date comparison needs a Date operand, got {}",
                    right.type_name()
                ))
            })?;
        return Ok(apply_ordering(l.cmp(&r), op));
    }

    let l = left.as_decimal().ok_or_else(|| {
        EvalFailure::TypeMismatch(format!(
            "numeric comparison needs a numeric field, got {}",
            left.type_name()
        ))
    })?;
    let r = right.as_decimal().ok_or_else(|| {
        EvalFailure::TypeMismatch(format!(
            "numeric comparison needs a numeric operand, got {}",
            right.type_name()
        ))
    })?;
    Ok(apply_ordering(l.cmp(&r), op))
}

fn apply_ordering(ord: std::cmp::Ordering, op: Operator) -> bool {
    use std::cmp::Ordering::*;
    match op {
        Operator::IsAtLeast => matches!(ord, Greater | Equal),
        Operator::IsAtMost => matches!(ord, Less | Equal),
        Operator::IsMoreThan => matches!(ord, Greater),
        Operator::IsLessThan => matches!(ord, Less),
        // Callers only route ordering operators here
        _ => false,
    }
}

/// String-length operators over text answers.
fn length_check(left: &Value, op: Operator, right: &Value) -> Result<bool, EvalFailure> {
    let text = match left {
        Value::Text(s) => s,
        other => {
            return Err(EvalFailure::TypeMismatch(format!(
                "length operator needs a Text field, got {}",
                other.type_name()
            )));
        }
    };
    use rust_decimal::prelude::ToPrimitive;
    let n = right
        .as_decimal()
        .and_then(|d| d.to_u64())
        .ok_or_else(|| {
            EvalFailure::TypeMismatch(format!(
                "length operator needs a numeric operand, got {}",
                right.type_name()
            ))
        })? as usize;

    let len = text.chars().count();
    Ok(match op {
        Operator::IsLongerThan => len > n,
        Operator::IsShorterThan => len < n,
        Operator::HasLength => len == n,
        _ => false,
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
