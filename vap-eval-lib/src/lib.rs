#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for vap-eval
//!
//! This library evaluates a validating admission policy (variables, match
//! conditions, validations and audit annotations written in CEL) against a
//! candidate resource and produces a structured report.
//!
//! # Module Organization
//!
//! - [`policy`]: Policy model and input documents
//! - [`expr`]: Expression engine seam and its CEL implementation
//! - [`eval`]: Phase-ordered policy evaluation and result aggregation
//! - [`reports`]: Report rendering
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod eval;
pub mod expr;
pub mod policy;
pub mod reports;

pub use crate::commands::{Host, run};
pub use crate::eval::{EvaluationReport, evaluate_policy};
