//! formwalk-journey: condition evaluation and page graph traversal.
//!
//! The engine splits into an immutable compiled [`FormModel`] (condition
//! registry, page graph, list table) and a pure per-request [`walk`]
//! that derives a [`FormContext`] from a state snapshot. Condition
//! evaluation fails closed: any failure to evaluate yields `false`,
//! never a crash. Validation failures are data on the context; only a
//! missing reference number or a transition cycle is a hard error.

pub mod condition;
pub mod datefn;
pub mod listcheck;
pub mod model;
pub mod page;
pub mod registry;
pub mod schema;
pub mod types;
pub mod walker;

pub use condition::Condition;
pub use listcheck::OPTION_INVALIDATED_TEXT;
pub use model::FormModel;
pub use page::{Component, ListTable, Page, Transition, REPEAT_CONTROLLER};
pub use registry::ConditionRegistry;
pub use types::{
    json_to_value, EvaluationState, FormState, JourneyError, ModelError, ValidationError, Value,
    REFERENCE_NUMBER_KEY,
};
pub use walker::{walk, FormContext};

use formwalk_definition::{from_definition, DefinitionError};

/// Any failure on the definition-to-context path, for callers that load
/// raw JSON and walk in one step.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Journey(#[from] JourneyError),
}

/// Owned walk result for callers that do not hold the model.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WalkReport {
    pub form_name: String,
    pub paths: Vec<String>,
    pub relevant_state: FormState,
    pub errors: Vec<ValidationError>,
    pub reference_number: String,
}

/// Compile a raw JSON definition and walk it in one step.
///
/// Convenience for one-shot callers; services should compile the model
/// once with [`FormModel::new`] and call [`walk`] per request.
pub fn walk_definition(
    definition: &serde_json::Value,
    current_path: &str,
    state: &FormState,
    payload: Option<&FormState>,
) -> Result<WalkReport, EngineError> {
    let def = from_definition(definition)?;
    let model = FormModel::new(&def)?;
    let context = walk(&model, current_path, state, payload)?;
    Ok(WalkReport {
        form_name: model.name.clone(),
        paths: context.paths,
        relevant_state: context.relevant_state,
        errors: context.errors,
        reference_number: context.reference_number,
    })
}
