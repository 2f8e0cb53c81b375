use super::ExpressionWarning;
use crate::expr::{Outcome, Value};

/// The outcome of one policy item
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    pub name: String,
    pub outcome: Outcome,

    /// Failure message, set only on validations that did not pass
    pub message: Option<Value>,

    /// Failure reason copied from the policy, set only on validations that did not pass
    pub reason: Option<String>,
}

impl EvalResult {
    #[must_use]
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            message: None,
            reason: None,
        }
    }
}

/// Raw results of one run, before aggregation
///
/// `validations` and `audit_annotations` are `None` when their phase was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub variables: Vec<EvalResult>,
    pub match_conditions: Vec<EvalResult>,
    pub validations: Option<Vec<EvalResult>>,
    pub audit_annotations: Option<Vec<EvalResult>>,
    pub warnings: Vec<ExpressionWarning>,
}

impl Evaluation {
    /// Whether every match condition yielded boolean `true`.
    #[must_use]
    pub fn matched(&self) -> bool {
        all_true(&self.match_conditions)
    }

    /// Whether the policy applied and every validation yielded boolean `true`.
    #[must_use]
    pub fn admitted(&self) -> bool {
        self.validations.as_deref().is_some_and(all_true)
    }
}

pub(super) fn all_true(results: &[EvalResult]) -> bool {
    results.iter().all(|r| r.outcome.is_true())
}
