//! Journey walker: page graph traversal under current state.
//!
//! A walk is a single forward-only automaton over page paths. It starts
//! at the model's start page, accumulates relevant pages/state/context,
//! and terminates when the target page is reached, a stored list
//! selection turns out to be invalidated, or no outgoing transition
//! matches. There is no backtracking, and nothing here performs I/O:
//! the walk is recomputed from scratch on every request against the
//! immutable model.

use formwalk_definition::SchemaGeneration;

use crate::listcheck::check_page_lists;
use crate::model::FormModel;
use crate::page::Page;
use crate::schema;
use crate::types::{
    EvaluationState, FormState, JourneyError, ValidationError, Value, REFERENCE_NUMBER_KEY,
};

/// Per-request derived context, owned by the caller.
///
/// `relevant_pages` is always a contiguous prefix of one walk from the
/// start page; `relevant_state` contains only keys owned by those
/// pages.
#[derive(Debug, Clone)]
pub struct FormContext<'m> {
    pub relevant_pages: Vec<&'m Page>,
    pub relevant_state: FormState,
    pub evaluation_state: EvaluationState,
    /// Page paths for breadcrumb/step display, truncated at (and
    /// including) the first page owning an errored field.
    pub paths: Vec<String>,
    pub errors: Vec<ValidationError>,
    /// The sanitized submission payload, when one was supplied.
    pub payload: Option<FormState>,
    pub reference_number: String,
}

/// Walk the page graph from the start page toward `current_path`.
///
/// When `payload` is supplied, the request is a submission for the
/// current page: the payload is validated against that page's schema
/// and its sanitized subset merged into a working copy of `state`
/// before traversal. Submission failures are recorded but do not stop
/// the walk -- they apply to the current page only.
///
/// A target that is never reached simply leaves `relevant_pages`
/// stopping short; callers treat that as "redirect back to the last
/// relevant page", not as an error.
pub fn walk<'m>(
    model: &'m FormModel,
    current_path: &str,
    state: &FormState,
    payload: Option<&FormState>,
) -> Result<FormContext<'m>, JourneyError> {
    let reference_number = state
        .get(REFERENCE_NUMBER_KEY)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(JourneyError::MissingReferenceNumber)?
        .to_string();

    let mut errors: Vec<ValidationError> = Vec::new();
    let mut working = state.clone();
    let mut sanitized_payload = None;

    if let Some(payload) = payload {
        if let Some(page) = model.get_page(current_path) {
            let (sanitized, payload_errors) = schema::validate_payload(page, payload);
            errors.extend(payload_errors);
            working.extend(sanitized.clone());
            sanitized_payload = Some(sanitized);
        }
    }

    // Strict mode pre-seeds every field key so condition evaluation
    // never fails merely because a key is absent
    let mut evaluation_state = EvaluationState::new();
    if model.schema_generation == SchemaGeneration::V2 {
        for key in model.all_field_keys() {
            evaluation_state.insert(key.to_string(), Value::Null);
        }
    }

    let mut relevant_pages: Vec<&Page> = Vec::new();
    let mut relevant_state = FormState::new();

    // Forward-only: more iterations than pages means a transition cycle
    let max_steps = model.pages.len();
    let mut steps = 0;
    let mut path = model.start_path.clone();

    while let Some(page) = model.get_page(&path) {
        steps += 1;
        if steps > max_steps {
            return Err(JourneyError::WalkLoop {
                path: path.clone(),
                steps: max_steps,
            });
        }

        relevant_pages.push(page);

        // Repeater pages keep per-item values out of scalar evaluation state
        if !page.is_repeater {
            for (key, value) in page.context_values(&working) {
                evaluation_state.insert(key, value);
            }
        }

        // Sparse copy: unanswered fields stay absent, not null
        for key in page.field_keys() {
            if let Some(value) = working.get(key) {
                relevant_state.insert(key.to_string(), value.clone());
            }
        }

        if let Some(invalidated) = check_page_lists(page, &working, &evaluation_state, model) {
            errors.push(invalidated);
            break;
        }

        if page.path == current_path {
            break;
        }

        match page.next_path(&evaluation_state, &model.registry) {
            Some(next) => path = next.to_string(),
            None => break,
        }
    }

    // Cross-page validation covers every relevant page except the one
    // being answered
    let earlier_pages: Vec<&Page> = relevant_pages
        .iter()
        .copied()
        .filter(|p| p.path != current_path)
        .collect();
    errors.extend(schema::validate_pages(&earlier_pages, &relevant_state));

    let paths = breadcrumb_paths(&relevant_pages, &errors);

    Ok(FormContext {
        relevant_pages,
        relevant_state,
        evaluation_state,
        paths,
        errors,
        payload: sanitized_payload,
        reference_number,
    })
}

/// Ordered page paths, truncated at (and including) the first page
/// whose key set intersects any error's field path.
fn breadcrumb_paths(relevant_pages: &[&Page], errors: &[ValidationError]) -> Vec<String> {
    let mut paths = Vec::with_capacity(relevant_pages.len());
    for page in relevant_pages {
        paths.push(page.path.clone());
        if errors.iter().any(|err| page.owns_field(&err.path)) {
            break;
        }
    }
    paths
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
