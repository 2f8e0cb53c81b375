//! Expression engine seam and its CEL implementation
//!
//! The evaluation engine only needs three operations from an expression
//! engine, captured by the [`ExpressionEngine`] trait:
//!
//! 1. **declare** every name any expression may reference (input roots plus
//!    `variables.<name>` for each policy variable), once, before compiling
//! 2. **compile** one expression into a program
//! 3. **evaluate** a program against the current [`BindingEnvironment`]
//!
//! Compile and evaluation failures are reported as [`ExpressionError`] values;
//! only a failed declaration is fatal to a run.
//!
//! # Implementation Model
//!
//! [`CelEngine`] uses `cel-interpreter`. Parsing happens at compile time, name
//! resolution at evaluation time, so the declare step is enforced by a lexical
//! scan of each expression for `variables.<name>` and `variables["<name>"]`
//! references (literals, comments and fields named `variables` excluded),
//! rejecting names that were never declared. Failed variables are left out of
//! the evaluation context; when an expression that references one fails, the
//! failure is reported as that variable's, which is how a broken variable's
//! blast radius becomes visible in the report.

mod bindings;
mod cel;
mod convert;
mod engine;
mod outcome;
mod references;

pub use bindings::BindingEnvironment;
pub use cel::{CelEngine, CelProgram, DEFAULT_MAX_EXPRESSION_LENGTH};
pub use cel_interpreter::Value;
pub use convert::{cel_to_json, json_to_cel};
pub use engine::{ExpressionEngine, ExpressionError};
pub use outcome::Outcome;
