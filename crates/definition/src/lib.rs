//! formwalk-definition: Typed form definition constructs and deserialization.
//!
//! Provides typed structs for every construct a declarative form
//! definition carries (pages, components, lists, conditions) and a
//! single `from_definition()` entry point that deserializes a
//! `serde_json::Value` definition into a [`FormDefinition`].
//!
//! Conditions arrive in either of two schema generations: a legacy
//! flat item list with per-item coordinators, or the canonical
//! recursive expression tree. Both are canonicalized to [`BooleanExpr`]
//! here, so downstream crates only ever see one form.

pub mod deserialize;
pub mod types;

pub use deserialize::{from_definition, DefinitionError};
pub use types::*;
