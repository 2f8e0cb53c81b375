//! Policy model and per-call input documents
//!
//! A [`PolicyDocument`] is the immutable in-memory form of a
//! `ValidatingAdmissionPolicy` manifest: ordered variables, match conditions,
//! validations and audit annotations, each carrying CEL source text. Nothing
//! here checks expression syntax; that is left to the expression engine.
//!
//! [`InputValues`] holds the root documents an evaluation run sees (`object`,
//! `oldObject`, `params`, `request`, `namespaceObject`). Absent roots are
//! presented to expressions as empty documents.

mod document;
mod input;

pub use document::{AuditAnnotation, MatchCondition, PolicyDocument, Validation, Variable};
pub use input::{InputSources, InputValues, ROOT_NAMES, VARIABLES_ROOT};
