use super::{EvalResult, Evaluation};
use crate::Result;
use crate::expr::{Outcome, cel_to_json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One item of the report, with engine values flattened to JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReportEntry {
    /// Whether this entry evaluated to boolean `true`.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result == Some(JsonValue::Bool(true))
    }

    fn from_result(result: EvalResult) -> Result<Self> {
        let (value, error) = match result.outcome {
            Outcome::Value(value) => (Some(cel_to_json(&value)?), None),
            Outcome::Failed(cause) => (None, Some(cause.to_string())),
        };

        Ok(Self {
            name: result.name,
            result: value,
            error,
            message: result.message.as_ref().map(cel_to_json).transpose()?,
            reason: result.reason,
        })
    }
}

/// A failed match condition or validation, keyed by its location in the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionWarning {
    pub field_ref: String,
    pub warning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeChecking {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expression_warnings: Vec<ExpressionWarning>,
}

/// The structured outcome of one evaluation call
///
/// Either `error` alone is set (setup failed), or the phase sequences are set as
/// far as evaluation proceeded. A skipped phase is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<ReportEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_conditions: Option<Vec<ReportEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Vec<ReportEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_annotations: Option<Vec<ReportEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_checking: Option<TypeChecking>,
}

impl EvaluationReport {
    /// A report carrying only a setup failure
    #[must_use]
    pub fn from_error(err: &ohno::AppError) -> Self {
        let text = err.to_string();
        let message = text.split("\nBacktrace:").next().unwrap_or(&text).trim();

        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Flatten raw phase results into a report, preserving order within each phase
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be represented as JSON
    pub fn aggregate(evaluation: Evaluation) -> Result<Self> {
        let type_checking = (!evaluation.warnings.is_empty()).then(|| TypeChecking {
            expression_warnings: evaluation.warnings,
        });

        Ok(Self {
            error: None,
            variables: Some(entries(evaluation.variables)?),
            match_conditions: Some(entries(evaluation.match_conditions)?),
            validations: evaluation.validations.map(entries).transpose()?,
            audit_annotations: evaluation.audit_annotations.map(entries).transpose()?,
            type_checking,
        })
    }

    /// Whether the policy applied to the input and at least one validation did not pass.
    #[must_use]
    pub fn denied(&self) -> bool {
        self.validations.as_ref().is_some_and(|v| !v.iter().all(ReportEntry::passed))
    }
}

fn entries(results: Vec<EvalResult>) -> Result<Vec<ReportEntry>> {
    results.into_iter().map(ReportEntry::from_result).collect()
}
