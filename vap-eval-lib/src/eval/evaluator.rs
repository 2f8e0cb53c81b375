use super::eval_result::all_true;
use super::{EvalResult, Evaluation, ExpressionWarning, LOG_TARGET};
use crate::Result;
use crate::expr::{BindingEnvironment, DEFAULT_MAX_EXPRESSION_LENGTH, ExpressionEngine, ExpressionError, Outcome, Value};
use crate::policy::{InputValues, PolicyDocument, ROOT_NAMES, VARIABLES_ROOT};
use std::sync::Arc;

/// Knobs that shape a run without changing its phase semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Record failed match conditions and validations as expression warnings
    pub expression_warnings: bool,

    /// Longest expression the engine will compile
    pub max_expression_length: usize,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            expression_warnings: true,
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
        }
    }
}

type Compiled<P> = Result<P, ExpressionError>;

struct CompiledValidation<P> {
    expression: Compiled<P>,
    message_expression: Option<Compiled<P>>,
}

/// A policy compiled against one expression engine
///
/// Compilation happens once in [`Evaluator::new`]; [`Evaluator::evaluate`] only
/// reads from `self`, so one evaluator can serve any number of runs.
pub struct Evaluator<'a, E: ExpressionEngine> {
    policy: &'a PolicyDocument,
    engine: E,
    expression_warnings: bool,
    variables: Vec<Compiled<E::Program>>,
    match_conditions: Vec<Compiled<E::Program>>,
    validations: Vec<CompiledValidation<E::Program>>,
    audit_annotations: Vec<Compiled<E::Program>>,
}

impl<E: ExpressionEngine> core::fmt::Debug for Evaluator<'_, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Evaluator")
            .field("policy", &self.policy.display_name())
            .field("expression_warnings", &self.expression_warnings)
            .finish_non_exhaustive()
    }
}

impl<'a, E: ExpressionEngine> Evaluator<'a, E> {
    /// Declare the policy's names to the engine and compile every expression
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the declared names
    pub fn new(policy: &'a PolicyDocument, mut engine: E, options: &EvaluationOptions) -> Result<Self> {
        let names: Vec<String> = ROOT_NAMES
            .iter()
            .map(ToString::to_string)
            .chain(policy.variables.iter().map(|v| format!("{VARIABLES_ROOT}.{}", v.name)))
            .collect();

        engine.declare(&names)?;

        let variables = policy.variables.iter().map(|v| engine.compile(&v.expression)).collect();
        let match_conditions = policy.match_conditions.iter().map(|c| engine.compile(&c.expression)).collect();
        let validations = policy
            .validations
            .iter()
            .map(|v| CompiledValidation {
                expression: engine.compile(&v.expression),
                message_expression: v.message_expression().map(|m| engine.compile(m)),
            })
            .collect();
        let audit_annotations = policy
            .audit_annotations
            .iter()
            .map(|a| engine.compile(&a.value_expression))
            .collect();

        Ok(Self {
            policy,
            engine,
            expression_warnings: options.expression_warnings,
            variables,
            match_conditions,
            validations,
            audit_annotations,
        })
    }

    /// Run every phase against one set of inputs
    #[must_use]
    pub fn evaluate(&self, inputs: &InputValues) -> Evaluation {
        log::info!(target: LOG_TARGET, "Evaluating policy '{}'", self.policy.display_name());

        let mut bindings = BindingEnvironment::seed(inputs);
        let mut evaluation = Evaluation::default();

        for (variable, program) in self.policy.variables.iter().zip(&self.variables) {
            let outcome = self.run(program, &bindings, &variable.name);
            bindings.bind_variable(&variable.name, outcome.clone());
            evaluation.variables.push(EvalResult::new(variable.name.as_str(), outcome));
        }

        for (condition, program) in self.policy.match_conditions.iter().zip(&self.match_conditions) {
            let outcome = self.run(program, &bindings, &condition.name);
            if let Outcome::Failed(cause) = &outcome {
                self.warn(&mut evaluation, format!("spec.matchConditions[{}].expression", condition.name), cause);
            }
            evaluation.match_conditions.push(EvalResult::new(condition.name.as_str(), outcome));
        }

        if !evaluation.matched() {
            log::debug!(target: LOG_TARGET, "Match conditions not met, skipping validations and audit annotations");
            return evaluation;
        }

        let mut validations = Vec::with_capacity(self.validations.len());
        for (idx, (validation, compiled)) in self.policy.validations.iter().zip(&self.validations).enumerate() {
            let name = format!("spec.validations[{idx}].expression");
            let outcome = self.run(&compiled.expression, &bindings, &name);
            let mut result = EvalResult::new(name.as_str(), outcome);

            match &result.outcome {
                Outcome::Failed(cause) => self.warn(&mut evaluation, name, cause),
                outcome if outcome.is_true() => {}
                Outcome::Value(_) => {
                    result.message = validation.static_message().map_or_else(
                        || {
                            compiled
                                .message_expression
                                .as_ref()
                                .and_then(|program| self.run(program, &bindings, &format!("{name} message")).value().cloned())
                        },
                        |message| Some(Value::String(Arc::new(message.to_string()))),
                    );
                    result.reason.clone_from(&validation.reason);
                }
            }

            validations.push(result);
        }

        let admitted = all_true(&validations);
        evaluation.validations = Some(validations);

        if !admitted {
            log::debug!(target: LOG_TARGET, "Validations did not all pass, skipping audit annotations");
            return evaluation;
        }

        let audit_annotations = self
            .policy
            .audit_annotations
            .iter()
            .zip(&self.audit_annotations)
            .map(|(annotation, program)| EvalResult::new(annotation.key.as_str(), self.run(program, &bindings, &annotation.key)))
            .collect();
        evaluation.audit_annotations = Some(audit_annotations);

        evaluation
    }

    /// Every expression that failed to compile, keyed by its location in the policy
    #[must_use]
    pub fn compile_errors(&self) -> Vec<ExpressionWarning> {
        fn collect<P>(errors: &mut Vec<ExpressionWarning>, field_ref: String, program: &Compiled<P>) {
            if let Err(e) = program {
                errors.push(ExpressionWarning {
                    field_ref,
                    warning: e.to_string(),
                });
            }
        }

        let mut errors = Vec::new();

        for (variable, program) in self.policy.variables.iter().zip(&self.variables) {
            collect(&mut errors, format!("spec.variables[{}].expression", variable.name), program);
        }

        for (condition, program) in self.policy.match_conditions.iter().zip(&self.match_conditions) {
            collect(&mut errors, format!("spec.matchConditions[{}].expression", condition.name), program);
        }

        for (idx, compiled) in self.validations.iter().enumerate() {
            collect(&mut errors, format!("spec.validations[{idx}].expression"), &compiled.expression);
            if let Some(program) = &compiled.message_expression {
                collect(&mut errors, format!("spec.validations[{idx}].messageExpression"), program);
            }
        }

        for (annotation, program) in self.policy.audit_annotations.iter().zip(&self.audit_annotations) {
            collect(&mut errors, format!("spec.auditAnnotations[{}].valueExpression", annotation.key), program);
        }

        errors
    }

    fn run(&self, program: &Compiled<E::Program>, bindings: &BindingEnvironment, name: &str) -> Outcome {
        let result = match program {
            Ok(program) => self.engine.evaluate(program, bindings),
            Err(e) => Err(e.clone()),
        };

        if let Err(e) = &result {
            log::debug!(target: LOG_TARGET, "Expression '{name}' failed: {e}");
        }

        Outcome::from(result)
    }

    fn warn(&self, evaluation: &mut Evaluation, field_ref: String, cause: &str) {
        if self.expression_warnings {
            evaluation.warnings.push(ExpressionWarning {
                field_ref,
                warning: cause.to_string(),
            });
        }
    }
}
