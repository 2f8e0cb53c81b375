//! Phase-ordered policy evaluation and result aggregation
//!
//! This module drives one policy through the expression engine and assembles
//! the outcome into an [`EvaluationReport`].
//!
//! # Implementation Model
//!
//! Setup declares every input root and every `variables.<name>` to the engine
//! and compiles every expression once. A failed declaration is fatal and
//! becomes the report's only content. Compile errors are kept per expression
//! and surface as that item's failure when it is evaluated.
//!
//! A run then proceeds in four phases, in document order within each:
//!
//! 1. **Variables**: each result is bound as `variables.<name>`, failures included
//! 2. **Match conditions**: all are evaluated; the policy applies only if every
//!    one yields boolean `true`
//! 3. **Validations**: only when the policy applies. Non-passing results carry
//!    the static message, or else the value of the message expression when that
//!    evaluates cleanly. Broken validation expressions get no message.
//! 4. **Audit annotations**: only when every validation passed
//!
//! Expression failures never abort a run; they are recorded as data on the item
//! that failed and observed by everything that depends on it.
//!
//! The aggregator flattens engine values and failures into plain JSON values and
//! error strings. A value JSON cannot represent is reported as an error of the
//! whole call, distinct from any expression failure.

mod eval_result;
mod evaluator;
mod report;

pub use eval_result::{EvalResult, Evaluation};
pub use evaluator::{EvaluationOptions, Evaluator};
pub use report::{EvaluationReport, ExpressionWarning, ReportEntry, TypeChecking};

use crate::Result;
use crate::expr::CelEngine;
use crate::policy::{InputSources, InputValues, PolicyDocument};

const LOG_TARGET: &str = "      eval";

/// Evaluate a parsed policy against parsed inputs using the CEL engine
///
/// Setup failures produce a report holding only the top-level error.
///
/// # Errors
///
/// Returns an error if the results cannot be represented in the report
pub fn evaluate_document(policy: &PolicyDocument, inputs: &InputValues, options: &EvaluationOptions) -> Result<EvaluationReport> {
    let engine = CelEngine::new(options.max_expression_length);

    match Evaluator::new(policy, engine, options) {
        Ok(evaluator) => EvaluationReport::aggregate(evaluator.evaluate(inputs)),
        Err(e) => {
            log::info!(target: LOG_TARGET, "Unable to set up policy '{}': {e}", policy.display_name());
            Ok(EvaluationReport::from_error(&e))
        }
    }
}

/// Parse a policy and its input documents, then evaluate
///
/// Parse failures produce a report holding only the top-level error.
///
/// # Errors
///
/// Returns an error if the results cannot be represented in the report
pub fn evaluate_policy(policy: &str, sources: &InputSources<'_>, options: &EvaluationOptions) -> Result<EvaluationReport> {
    let parsed = PolicyDocument::parse(policy).and_then(|document| sources.parse().map(|inputs| (document, inputs)));

    match parsed {
        Ok((document, inputs)) => evaluate_document(&document, &inputs, options),
        Err(e) => {
            log::info!(target: LOG_TARGET, "Unable to parse inputs: {e}");
            Ok(EvaluationReport::from_error(&e))
        }
    }
}
