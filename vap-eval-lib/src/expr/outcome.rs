use super::{ExpressionError, Value};
use std::sync::Arc;

/// The result of evaluating one expression
///
/// A failure is carried as data so that it can be bound like any other value and
/// observed by every later expression that depends on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    Failed(Arc<str>),
}

impl Outcome {
    #[must_use]
    pub fn failed(description: impl Into<Arc<str>>) -> Self {
        Self::Failed(description.into())
    }

    /// Whether this is exactly the boolean `true`.
    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Value(Value::Bool(true)))
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Value(_) => None,
            Self::Failed(description) => Some(&**description),
        }
    }
}

impl From<Result<Value, ExpressionError>> for Outcome {
    fn from(result: Result<Value, ExpressionError>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}
