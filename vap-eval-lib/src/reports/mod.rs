//! Report rendering for evaluation results
//!
//! Two generators are provided, each accessed through a `generate` function:
//! - **JSON**: the wire form of an [`EvaluationReport`](crate::eval::EvaluationReport),
//!   compact or pretty-printed
//! - **Console**: a human-readable summary with optional ANSI colors
//!
//! Both write to any `core::fmt::Write`, so callers can render into a `String`
//! and decide where it goes.

mod console;
mod json;

pub use console::generate as generate_console;
pub use json::generate as generate_json;
