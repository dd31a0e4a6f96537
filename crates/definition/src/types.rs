//! Typed structs representing a declarative form definition.
//!
//! These types cover the fields the journey engine consumes: pages and
//! their guarded transitions, components and their list bindings, lists
//! with optionally conditional items, and named conditions. Widget-level
//! presentation options are kept as `serde_json::Value` — the engine
//! never interprets them, an external rendering layer does.

use serde::{Deserialize, Serialize};

/// Condition schema generation carried by a definition.
///
/// Generation 1 is the legacy flat item list with per-item coordinators.
/// Generation 2 is the canonical recursive expression tree and also
/// switches the walker into strict mode (every field key pre-seeded to
/// null before condition evaluation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaGeneration {
    V1,
    V2,
}

/// Top-level form definition containing all constructs.
#[derive(Debug, Clone)]
pub struct FormDefinition {
    /// Human-readable form name.
    pub name: String,
    /// Explicit start page path. When absent the first declared page is
    /// the start page.
    pub start_path: Option<String>,
    pub pages: Vec<PageDef>,
    pub lists: Vec<ListDef>,
    pub conditions: Vec<ConditionDef>,
    pub schema_generation: SchemaGeneration,
}

// ── Pages ───────────────────────────────────────────────────────────

/// A guarded outgoing transition from a page.
///
/// The first transition whose condition evaluates true (or that has no
/// condition) determines the next page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextDef {
    pub path: String,
    /// Name of a registered condition guarding this transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A page construct from definition JSON.
#[derive(Debug, Clone)]
pub struct PageDef {
    pub path: String,
    pub title: String,
    /// Controller tag (e.g. a repeater controller). The engine only
    /// inspects this for the repeater capability; routing layers use it
    /// for dispatch.
    pub controller: Option<String>,
    pub components: Vec<ComponentDef>,
    pub next: Vec<NextDef>,
}

// ── Components ──────────────────────────────────────────────────────

/// Component kind, dispatched from the definition's `type` field.
///
/// This is a capability tag, not a widget catalogue: the engine only
/// needs to know how a component's raw value types, whether it binds a
/// list, and its cardinality. Unknown kinds deserialize as `Other` and
/// contribute a key but no validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    Text,
    MultilineText,
    Number,
    Date,
    YesNo,
    /// Single selection from a bound list.
    Select,
    /// Multiple selection from a bound list.
    Checkboxes,
    /// Unrecognized widget type; passes through unvalidated.
    Other(String),
}

impl ComponentKind {
    /// Whether this kind selects from a bound list.
    pub fn has_list_binding(&self) -> bool {
        matches!(self, ComponentKind::Select | ComponentKind::Checkboxes)
    }

    /// Whether this kind stores multiple values.
    pub fn is_multi(&self) -> bool {
        matches!(self, ComponentKind::Checkboxes)
    }
}

/// A component (field) construct from definition JSON.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    /// State key owned by this component.
    pub key: String,
    pub kind: ComponentKind,
    pub title: String,
    pub required: bool,
    /// Name of the bound list for Select/Checkboxes kinds.
    pub list: Option<String>,
    /// Maximum text length, when declared.
    pub max_length: Option<usize>,
    /// Widget presentation options, uninterpreted by the engine.
    pub options: Option<serde_json::Value>,
}

// ── Lists ───────────────────────────────────────────────────────────

/// A selectable item within a list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItemDef {
    /// Display text for the option.
    pub text: String,
    /// Underlying value stored in state when selected.
    pub value: serde_json::Value,
    /// Name of a condition gating this item's availability.
    pub condition: Option<String>,
}

/// A list construct from definition JSON.
#[derive(Debug, Clone)]
pub struct ListDef {
    pub name: String,
    pub items: Vec<ListItemDef>,
}

/// Reserved name of the fixed yes/no boolean list. Its two items can
/// never be conditional, so it is exempt from list invalidation checks.
pub const YES_NO_LIST: &str = "__yesNo";

impl ListDef {
    /// The fixed yes/no list available to every form.
    pub fn yes_no() -> ListDef {
        ListDef {
            name: YES_NO_LIST.to_string(),
            items: vec![
                ListItemDef {
                    text: "Yes".to_string(),
                    value: serde_json::Value::Bool(true),
                    condition: None,
                },
                ListItemDef {
                    text: "No".to_string(),
                    value: serde_json::Value::Bool(false),
                    condition: None,
                },
            ],
        }
    }
}

// ── Conditions ──────────────────────────────────────────────────────

/// Comparison operator inside a condition expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    IsAtLeast,
    IsAtMost,
    IsMoreThan,
    IsLessThan,
    IsLongerThan,
    IsShorterThan,
    HasLength,
}

impl Operator {
    /// Parse the textual operator form used in definition JSON.
    pub fn parse(s: &str) -> Option<Operator> {
        match s {
            "is" => Some(Operator::Is),
            "is not" => Some(Operator::IsNot),
            "contains" => Some(Operator::Contains),
            "does not contain" => Some(Operator::DoesNotContain),
            "is at least" => Some(Operator::IsAtLeast),
            "is at most" => Some(Operator::IsAtMost),
            "is more than" => Some(Operator::IsMoreThan),
            "is less than" => Some(Operator::IsLessThan),
            "is longer than" => Some(Operator::IsLongerThan),
            "is shorter than" => Some(Operator::IsShorterThan),
            "has length" => Some(Operator::HasLength),
            _ => None,
        }
    }

    /// The textual form, for error messages and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does not contain",
            Operator::IsAtLeast => "is at least",
            Operator::IsAtMost => "is at most",
            Operator::IsMoreThan => "is more than",
            Operator::IsLessThan => "is less than",
            Operator::IsLongerThan => "is longer than",
            Operator::IsShorterThan => "is shorter than",
            Operator::HasLength => "has length",
        }
    }
}

/// Unit for relative-date operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl DateUnit {
    pub fn parse(s: &str) -> Option<DateUnit> {
        match s {
            "days" => Some(DateUnit::Days),
            "weeks" => Some(DateUnit::Weeks),
            "months" => Some(DateUnit::Months),
            "years" => Some(DateUnit::Years),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateUnit::Days => "days",
            DateUnit::Weeks => "weeks",
            DateUnit::Months => "months",
            DateUnit::Years => "years",
        }
    }
}

/// Right-hand operand of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A literal value, kept as raw JSON; coerced against the left-hand
    /// field value at evaluation time.
    Literal(serde_json::Value),
    /// Today's UTC date shifted by `offset` units, as an ISO date.
    /// Supports "more than N days before/after today" conditions.
    RelativeDate { offset: i64, unit: DateUnit },
}

/// Canonical boolean expression tree over field values and other
/// conditions. Both schema generations deserialize into this form.
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanExpr {
    Comparison {
        field: String,
        operator: Operator,
        operand: Operand,
    },
    All(Vec<BooleanExpr>),
    Any(Vec<BooleanExpr>),
    Not(Box<BooleanExpr>),
    /// Reference to another named condition, resolved lazily at
    /// evaluation time against the same state.
    ConditionRef(String),
}

/// A named condition construct from definition JSON.
#[derive(Debug, Clone)]
pub struct ConditionDef {
    pub name: String,
    pub display_name: String,
    pub expression: BooleanExpr,
}
