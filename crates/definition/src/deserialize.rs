//! Deserialization from definition JSON into typed structs.
//!
//! The main entry point is [`from_definition`], which takes a
//! `&serde_json::Value` and produces a [`FormDefinition`].
//!
//! Deserialization is hand-walked field by field so that structural
//! errors can name the construct and field precisely, instead of
//! surfacing as opaque serde paths.

use crate::types::*;

/// Errors during definition JSON deserialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// The definition is missing a required top-level field.
    #[error("definition missing required field: '{field}'")]
    MissingField { field: String },

    /// A construct is missing a required field or carries a malformed one.
    #[error("{kind} '{id}': {message}")]
    ConstructError {
        kind: String,
        id: String,
        message: String,
    },

    /// The definition structure is invalid.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),
}

/// Deserialize a definition JSON document into typed structs.
///
/// Unknown component types are kept as [`ComponentKind::Other`] so that
/// widget catalogues can grow without breaking the engine; they own
/// their state key but contribute no validation.
pub fn from_definition(def: &serde_json::Value) -> Result<FormDefinition, DefinitionError> {
    let name = def
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DefinitionError::MissingField {
            field: "name".to_string(),
        })?
        .to_string();

    let schema_generation = match def.get("schema").and_then(|v| v.as_u64()) {
        None | Some(1) => SchemaGeneration::V1,
        Some(2) => SchemaGeneration::V2,
        Some(other) => {
            return Err(DefinitionError::InvalidDefinition(format!(
                "unsupported schema generation: {}",
                other
            )));
        }
    };

    let start_path = def
        .get("startPage")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let pages_arr = def
        .get("pages")
        .and_then(|p| p.as_array())
        .ok_or_else(|| DefinitionError::MissingField {
            field: "pages".to_string(),
        })?;

    let mut pages = Vec::with_capacity(pages_arr.len());
    for obj in pages_arr {
        pages.push(parse_page(obj)?);
    }

    let mut lists = Vec::new();
    if let Some(lists_arr) = def.get("lists").and_then(|l| l.as_array()) {
        for obj in lists_arr {
            lists.push(parse_list(obj)?);
        }
    }

    let mut conditions = Vec::new();
    if let Some(conds_arr) = def.get("conditions").and_then(|c| c.as_array()) {
        for obj in conds_arr {
            conditions.push(parse_condition(obj, schema_generation)?);
        }
    }

    Ok(FormDefinition {
        name,
        start_path,
        pages,
        lists,
        conditions,
        schema_generation,
    })
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn required_str(obj: &serde_json::Value, field: &str) -> Result<String, DefinitionError> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| DefinitionError::InvalidDefinition(format!("missing '{}' field", field)))
}

fn construct_err(kind: &str, id: &str, message: impl Into<String>) -> DefinitionError {
    DefinitionError::ConstructError {
        kind: kind.to_string(),
        id: id.to_string(),
        message: message.into(),
    }
}

// ── Pages ───────────────────────────────────────────────────────────

fn parse_page(obj: &serde_json::Value) -> Result<PageDef, DefinitionError> {
    let path = required_str(obj, "path")?;
    let title = obj
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let controller = obj
        .get("controller")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let mut components = Vec::new();
    if let Some(comps) = obj.get("components").and_then(|c| c.as_array()) {
        for comp in comps {
            components.push(parse_component(comp, &path)?);
        }
    }

    let mut next = Vec::new();
    if let Some(nexts) = obj.get("next").and_then(|n| n.as_array()) {
        for n in nexts {
            let target =
                required_str(n, "path").map_err(|_| construct_err("Page", &path, "transition missing 'path'"))?;
            let condition = n
                .get("condition")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            next.push(NextDef {
                path: target,
                condition,
            });
        }
    }

    Ok(PageDef {
        path,
        title,
        controller,
        components,
        next,
    })
}

fn parse_component(obj: &serde_json::Value, page_path: &str) -> Result<ComponentDef, DefinitionError> {
    let key = required_str(obj, "name")
        .map_err(|_| construct_err("Page", page_path, "component missing 'name'"))?;
    let kind_str = obj.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let kind = component_kind(kind_str);

    let title = obj
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or(&key)
        .to_string();

    // Components are required unless options.required is explicitly false
    let required = obj
        .get("options")
        .and_then(|o| o.get("required"))
        .and_then(|r| r.as_bool())
        .unwrap_or(true);

    let list = obj
        .get("list")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    if kind.has_list_binding() && list.is_none() {
        return Err(construct_err(
            "Component",
            &key,
            format!("{} component requires a 'list' binding", kind_str),
        ));
    }

    let max_length = obj
        .get("schema")
        .and_then(|s| s.get("max"))
        .and_then(|m| m.as_u64())
        .map(|m| m as usize);

    let options = obj.get("options").cloned();

    Ok(ComponentDef {
        key,
        kind,
        title,
        required,
        list,
        max_length,
        options,
    })
}

fn component_kind(type_name: &str) -> ComponentKind {
    match type_name {
        "TextField" | "EmailAddressField" | "TelephoneNumberField" => ComponentKind::Text,
        "MultilineTextField" => ComponentKind::MultilineText,
        "NumberField" => ComponentKind::Number,
        "DateField" | "DatePartsField" => ComponentKind::Date,
        "YesNoField" => ComponentKind::YesNo,
        "SelectField" | "RadiosField" | "AutocompleteField" => ComponentKind::Select,
        "CheckboxesField" => ComponentKind::Checkboxes,
        other => ComponentKind::Other(other.to_string()),
    }
}

// ── Lists ───────────────────────────────────────────────────────────

fn parse_list(obj: &serde_json::Value) -> Result<ListDef, DefinitionError> {
    let name = required_str(obj, "name")?;

    let items_arr = obj
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| construct_err("List", &name, "missing 'items' array"))?;

    let mut items = Vec::with_capacity(items_arr.len());
    for item in items_arr {
        let text = required_str(item, "text")
            .map_err(|_| construct_err("List", &name, "item missing 'text'"))?;
        let value = item
            .get("value")
            .cloned()
            .unwrap_or_else(|| serde_json::Value::String(text.clone()));
        let condition = item
            .get("condition")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        items.push(ListItemDef {
            text,
            value,
            condition,
        });
    }

    Ok(ListDef { name, items })
}

// ── Conditions ──────────────────────────────────────────────────────

fn parse_condition(
    obj: &serde_json::Value,
    generation: SchemaGeneration,
) -> Result<ConditionDef, DefinitionError> {
    let name = required_str(obj, "name")?;
    let display_name = obj
        .get("displayName")
        .and_then(|v| v.as_str())
        .unwrap_or(&name)
        .to_string();

    let expression = match generation {
        SchemaGeneration::V1 => {
            let value = obj
                .get("value")
                .ok_or_else(|| construct_err("Condition", &name, "missing 'value'"))?;
            parse_legacy_expression(value, &name)?
        }
        SchemaGeneration::V2 => {
            let expr = obj
                .get("expression")
                .ok_or_else(|| construct_err("Condition", &name, "missing 'expression'"))?;
            parse_expression(expr, &name)?
        }
    };

    Ok(ConditionDef {
        name,
        display_name,
        expression,
    })
}

/// Parse the canonical (generation 2) recursive expression tree.
fn parse_expression(
    expr: &serde_json::Value,
    cond_name: &str,
) -> Result<BooleanExpr, DefinitionError> {
    if let Some(items) = expr.get("all").and_then(|v| v.as_array()) {
        let parsed = items
            .iter()
            .map(|e| parse_expression(e, cond_name))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(BooleanExpr::All(parsed));
    }
    if let Some(items) = expr.get("any").and_then(|v| v.as_array()) {
        let parsed = items
            .iter()
            .map(|e| parse_expression(e, cond_name))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(BooleanExpr::Any(parsed));
    }
    if let Some(inner) = expr.get("not") {
        return Ok(BooleanExpr::Not(Box::new(parse_expression(
            inner, cond_name,
        )?)));
    }
    if let Some(reference) = expr.get("condition").and_then(|v| v.as_str()) {
        return Ok(BooleanExpr::ConditionRef(reference.to_string()));
    }
    if let Some(field) = expr.get("field").and_then(|v| v.as_str()) {
        let op_str = expr
            .get("operator")
            .and_then(|v| v.as_str())
            .ok_or_else(|| construct_err("Condition", cond_name, "comparison missing 'operator'"))?;
        let operator = Operator::parse(op_str).ok_or_else(|| {
            construct_err(
                "Condition",
                cond_name,
                format!("unknown operator: '{}'", op_str),
            )
        })?;
        let operand = parse_operand(expr, cond_name)?;
        return Ok(BooleanExpr::Comparison {
            field: field.to_string(),
            operator,
            operand,
        });
    }
    Err(construct_err(
        "Condition",
        cond_name,
        "expression node must be one of all/any/not/condition/field",
    ))
}

fn parse_operand(
    expr: &serde_json::Value,
    cond_name: &str,
) -> Result<Operand, DefinitionError> {
    if let Some(rel) = expr.get("relativeDate") {
        let offset = rel
            .get("offset")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| construct_err("Condition", cond_name, "relativeDate missing 'offset'"))?;
        let unit_str = rel
            .get("unit")
            .and_then(|v| v.as_str())
            .ok_or_else(|| construct_err("Condition", cond_name, "relativeDate missing 'unit'"))?;
        let unit = DateUnit::parse(unit_str).ok_or_else(|| {
            construct_err(
                "Condition",
                cond_name,
                format!("unknown relativeDate unit: '{}'", unit_str),
            )
        })?;
        return Ok(Operand::RelativeDate { offset, unit });
    }
    let value = expr
        .get("value")
        .cloned()
        .ok_or_else(|| construct_err("Condition", cond_name, "comparison missing 'value'"))?;
    Ok(Operand::Literal(value))
}

/// Parse a legacy (generation 1) condition value: a flat item list with
/// per-item `and`/`or` coordinators, folded left-associatively into the
/// canonical tree.
fn parse_legacy_expression(
    value: &serde_json::Value,
    cond_name: &str,
) -> Result<BooleanExpr, DefinitionError> {
    let items = value
        .get("conditions")
        .and_then(|c| c.as_array())
        .ok_or_else(|| construct_err("Condition", cond_name, "missing 'conditions' array"))?;

    let mut iter = items.iter();
    let first = iter
        .next()
        .ok_or_else(|| construct_err("Condition", cond_name, "empty 'conditions' array"))?;
    let mut expr = parse_legacy_item(first, cond_name)?;

    for item in iter {
        let node = parse_legacy_item(item, cond_name)?;
        let coordinator = item
            .get("coordinator")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                construct_err(
                    "Condition",
                    cond_name,
                    "item after the first missing 'coordinator'",
                )
            })?;
        expr = match coordinator {
            "and" => BooleanExpr::All(vec![expr, node]),
            "or" => BooleanExpr::Any(vec![expr, node]),
            other => {
                return Err(construct_err(
                    "Condition",
                    cond_name,
                    format!("unknown coordinator: '{}'", other),
                ));
            }
        };
    }

    Ok(expr)
}

fn parse_legacy_item(
    item: &serde_json::Value,
    cond_name: &str,
) -> Result<BooleanExpr, DefinitionError> {
    if let Some(reference) = item.get("conditionName").and_then(|v| v.as_str()) {
        return Ok(BooleanExpr::ConditionRef(reference.to_string()));
    }

    let field = item
        .get("field")
        .and_then(|f| f.get("name"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| construct_err("Condition", cond_name, "item missing 'field.name'"))?;
    let op_str = item
        .get("operator")
        .and_then(|v| v.as_str())
        .ok_or_else(|| construct_err("Condition", cond_name, "item missing 'operator'"))?;
    let operator = Operator::parse(op_str).ok_or_else(|| {
        construct_err(
            "Condition",
            cond_name,
            format!("unknown operator: '{}'", op_str),
        )
    })?;

    let value_obj = item
        .get("value")
        .ok_or_else(|| construct_err("Condition", cond_name, "item missing 'value'"))?;
    let operand = match value_obj.get("type").and_then(|v| v.as_str()) {
        Some("RelativeDate") => {
            let offset = value_obj
                .get("offset")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| {
                    construct_err("Condition", cond_name, "RelativeDate value missing 'offset'")
                })?;
            let unit_str = value_obj
                .get("unit")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    construct_err("Condition", cond_name, "RelativeDate value missing 'unit'")
                })?;
            let unit = DateUnit::parse(unit_str).ok_or_else(|| {
                construct_err(
                    "Condition",
                    cond_name,
                    format!("unknown relativeDate unit: '{}'", unit_str),
                )
            })?;
            Operand::RelativeDate { offset, unit }
        }
        _ => {
            let value = value_obj
                .get("value")
                .cloned()
                .ok_or_else(|| construct_err("Condition", cond_name, "item value missing 'value'"))?;
            Operand::Literal(value)
        }
    };

    Ok(BooleanExpr::Comparison {
        field: field.to_string(),
        operator,
        operand,
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
