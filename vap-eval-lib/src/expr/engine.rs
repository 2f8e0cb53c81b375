use super::{BindingEnvironment, Value};
use crate::Result;
use thiserror::Error;

/// Why a single expression could not produce a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The expression text could not be parsed
    #[error("compile error: {0}")]
    Compile(String),

    /// The expression refers to a name that was never declared
    #[error("undeclared reference to '{0}'")]
    UndeclaredReference(String),

    /// The expression text is longer than the engine accepts
    #[error("expression is {length} characters long, exceeding the limit of {limit}")]
    TooLong { length: usize, limit: usize },

    /// The expression refers to a variable whose own evaluation failed
    #[error("variable '{name}' failed to evaluate: {cause}")]
    FailedReference { name: String, cause: String },

    /// Runtime fault such as a missing field or a type mismatch
    #[error("{0}")]
    Evaluate(String),
}

/// The operations the policy evaluator needs from an expression engine
pub trait ExpressionEngine {
    type Program;

    /// Declare every name expressions may reference
    ///
    /// Plain names are input roots; `variables.<name>` entries are policy variables.
    /// Must be called once before any expression is compiled.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be constructed from these names
    fn declare(&mut self, names: &[String]) -> Result<()>;

    /// Compile one expression.
    fn compile(&self, expression: &str) -> Result<Self::Program, ExpressionError>;

    /// Evaluate a compiled program against the current bindings.
    fn evaluate(&self, program: &Self::Program, bindings: &BindingEnvironment) -> Result<Value, ExpressionError>;
}
