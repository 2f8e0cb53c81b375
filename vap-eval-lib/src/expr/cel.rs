use super::references::variable_references;
use super::{BindingEnvironment, ExpressionEngine, ExpressionError, Outcome, Value};
use crate::Result;
use crate::policy::{ROOT_NAMES, VARIABLES_ROOT};
use cel_interpreter::objects::Map;
use cel_interpreter::{Context, Program};
use ohno::app_err;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Longest expression accepted unless configured otherwise
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 10_000;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern should be valid"));


/// A parsed CEL expression together with the policy variables it references
#[derive(Debug)]
pub struct CelProgram {
    program: Program,
    variable_refs: Vec<String>,
}

impl CelProgram {
    /// Names of the policy variables this program reads, without the `variables.` prefix.
    #[must_use]
    pub fn variable_refs(&self) -> &[String] {
        &self.variable_refs
    }
}

/// Expression engine backed by `cel-interpreter`
#[derive(Debug, Clone)]
pub struct CelEngine {
    roots: Vec<String>,
    variables: HashSet<String>,
    max_expression_length: usize,
}

impl Default for CelEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXPRESSION_LENGTH)
    }
}

impl CelEngine {
    #[must_use]
    pub fn new(max_expression_length: usize) -> Self {
        Self {
            roots: Vec::new(),
            variables: HashSet::new(),
            max_expression_length,
        }
    }

    fn is_reserved(name: &str) -> bool {
        name == VARIABLES_ROOT || ROOT_NAMES.contains(&name)
    }

    /// Materialize the bindings as a CEL context
    ///
    /// Declared roots become top-level variables. Successful `variables.<name>`
    /// entries are folded into a single `variables` map, later entries shadowing
    /// earlier ones. Failed and undeclared entries are left out.
    fn build_context(&self, bindings: &BindingEnvironment) -> Context<'_> {
        let mut context = Context::default();
        let mut variables: HashMap<String, Value> = HashMap::new();

        for (name, outcome) in bindings.iter() {
            let Outcome::Value(value) = outcome else {
                continue;
            };

            match name.split_once('.') {
                Some((VARIABLES_ROOT, variable)) => {
                    let _ = variables.insert(variable.to_string(), value.clone());
                }
                Some(_) => {}
                None => {
                    if self.roots.iter().any(|root| root == name) {
                        context.add_variable_from_value(name, value.clone());
                    }
                }
            }
        }

        context.add_variable_from_value(VARIABLES_ROOT, Value::Map(Map::from(variables)));
        context
    }
}

impl ExpressionEngine for CelEngine {
    type Program = CelProgram;

    fn declare(&mut self, names: &[String]) -> Result<()> {
        let prefix = format!("{VARIABLES_ROOT}.");

        for name in names {
            if let Some(variable) = name.strip_prefix(&prefix) {
                if !IDENTIFIER.is_match(variable) {
                    return Err(app_err!("failed to create CEL env: variable name '{variable}' is not a valid identifier"));
                }

                if Self::is_reserved(variable) {
                    return Err(app_err!("failed to create CEL env: variable name '{variable}' collides with a reserved name"));
                }

                let _ = self.variables.insert(variable.to_string());
            } else {
                if !IDENTIFIER.is_match(name) {
                    return Err(app_err!("failed to create CEL env: '{name}' is not a valid identifier"));
                }

                if name == VARIABLES_ROOT {
                    return Err(app_err!("failed to create CEL env: '{VARIABLES_ROOT}' cannot be declared as an input"));
                }

                if !self.roots.contains(name) {
                    self.roots.push(name.clone());
                }
            }
        }

        Ok(())
    }

    fn compile(&self, expression: &str) -> Result<CelProgram, ExpressionError> {
        let length = expression.chars().count();
        if length > self.max_expression_length {
            return Err(ExpressionError::TooLong {
                length,
                limit: self.max_expression_length,
            });
        }

        let program = Program::compile(expression).map_err(|e| ExpressionError::Compile(e.to_string()))?;

        let variable_refs = variable_references(expression);
        if let Some(name) = variable_refs.iter().find(|name| !self.variables.contains(*name)) {
            return Err(ExpressionError::UndeclaredReference(format!("{VARIABLES_ROOT}.{name}")));
        }

        Ok(CelProgram { program, variable_refs })
    }

    fn evaluate(&self, program: &CelProgram, bindings: &BindingEnvironment) -> Result<Value, ExpressionError> {
        let context = self.build_context(bindings);

        // failed variables are absent from the context, so a failure that reads one is attributed to it
        program.program.execute(&context).map_err(|e| {
            program
                .variable_refs
                .iter()
                .find_map(|name| match bindings.variable(name) {
                    Some(Outcome::Failed(cause)) => Some(ExpressionError::FailedReference {
                        name: name.clone(),
                        cause: cause.to_string(),
                    }),
                    _ => None,
                })
                .unwrap_or_else(|| ExpressionError::Evaluate(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::InputValues;
    use serde_json::json;

    fn declared(variables: &[&str]) -> CelEngine {
        let mut names: Vec<String> = ROOT_NAMES.iter().map(ToString::to_string).collect();
        names.extend(variables.iter().map(|v| format!("variables.{v}")));

        let mut engine = CelEngine::default();
        engine.declare(&names).unwrap();
        engine
    }

    fn eval(engine: &CelEngine, expression: &str, bindings: &BindingEnvironment) -> Result<Value, ExpressionError> {
        let program = engine.compile(expression)?;
        engine.evaluate(&program, bindings)
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_object_fields_are_visible() {
        let engine = declared(&[]);
        let env = BindingEnvironment::seed(&InputValues::new().with_object(json!({"spec": {"replicas": 3}})));

        assert_eq!(eval(&engine, "object.spec.replicas == 3", &env), Ok(Value::Bool(true)));
        assert_eq!(eval(&engine, "object.spec.replicas + 1", &env), Ok(Value::Int(4)));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_absent_roots_are_empty_maps() {
        let engine = declared(&[]);
        let env = BindingEnvironment::seed(&InputValues::new());

        assert_eq!(eval(&engine, "size(params) == 0", &env), Ok(Value::Bool(true)));
        assert_eq!(eval(&engine, "size(oldObject) == 0", &env), Ok(Value::Bool(true)));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_variables_are_reachable_through_namespace() {
        let engine = declared(&["limit"]);
        let mut env = BindingEnvironment::seed(&InputValues::new().with_object(json!({"replicas": 4})));
        env.bind_variable("limit", Outcome::Value(Value::Int(5)));

        assert_eq!(eval(&engine, "object.replicas <= variables.limit", &env), Ok(Value::Bool(true)));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_undeclared_variable_is_compile_error() {
        let engine = declared(&["limit"]);
        let err = engine.compile("variables.missing > 1").unwrap_err();
        assert_eq!(err, ExpressionError::UndeclaredReference("variables.missing".to_string()));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_compile_before_declare_rejects_variable_references() {
        let engine = CelEngine::default();
        let _ = engine.compile("variables.limit").unwrap_err();
        let _ = engine.compile("object.spec").unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_syntax_error_is_compile_error() {
        let engine = declared(&[]);
        assert!(matches!(engine.compile("(object.a > 5"), Err(ExpressionError::Compile(_))));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_expression_length_limit() {
        let mut engine = CelEngine::new(8);
        engine.declare(&["object".to_string()]).unwrap();

        let _ = engine.compile("1 + 2").unwrap();
        let err = engine.compile("object.spec.replicas").unwrap_err();
        assert_eq!(err, ExpressionError::TooLong { length: 20, limit: 8 });
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_missing_field_is_evaluation_error() {
        let engine = declared(&[]);
        let env = BindingEnvironment::seed(&InputValues::new().with_object(json!({"spec": {}})));

        assert!(matches!(
            eval(&engine, "object.spec.replicas > 1", &env),
            Err(ExpressionError::Evaluate(_))
        ));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_reference_to_failed_variable_fails() {
        let engine = declared(&["broken", "fine"]);
        let mut env = BindingEnvironment::seed(&InputValues::new());
        env.bind_variable("broken", Outcome::failed("no such key: nope"));
        env.bind_variable("fine", Outcome::Value(Value::Bool(true)));

        let err = eval(&engine, "variables.fine && variables.broken", &env).unwrap_err();
        assert_eq!(
            err.to_string(),
            "variable 'broken' failed to evaluate: no such key: nope"
        );

        assert_eq!(eval(&engine, "variables.fine", &env), Ok(Value::Bool(true)));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_undeclared_roots_are_not_visible() {
        let mut engine = CelEngine::default();
        engine.declare(&["object".to_string()]).unwrap();
        let env = BindingEnvironment::seed(&InputValues::new());

        assert_eq!(eval(&engine, "size(object) == 0", &env), Ok(Value::Bool(true)));
        assert!(matches!(eval(&engine, "size(params) == 0", &env), Err(ExpressionError::Evaluate(_))));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_field_named_variables_is_plain_data() {
        let engine = declared(&[]);
        let env = BindingEnvironment::seed(&InputValues::new().with_object(json!({"spec": {"variables": {"count": 1}}})));

        assert_eq!(eval(&engine, "object.spec.variables.count == 1", &env), Ok(Value::Bool(true)));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_string_literal_mentioning_undeclared_variable() {
        let engine = declared(&["limit"]);
        let env = BindingEnvironment::seed(&InputValues::new());

        assert_eq!(
            eval(&engine, "'set variables.missing first'", &env),
            Ok(Value::String(std::sync::Arc::new("set variables.missing first".to_string())))
        );
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_index_syntax_reaches_variables() {
        let engine = declared(&["limit"]);
        let mut env = BindingEnvironment::seed(&InputValues::new());
        env.bind_variable("limit", Outcome::Value(Value::Int(5)));

        assert_eq!(eval(&engine, "variables[\"limit\"] == 5", &env), Ok(Value::Bool(true)));
        assert_eq!(
            engine.compile("variables['missing']").unwrap_err(),
            ExpressionError::UndeclaredReference("variables.missing".to_string())
        );
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_unread_failed_variable_does_not_fail() {
        let engine = declared(&["broken"]);
        let mut env = BindingEnvironment::seed(&InputValues::new());
        env.bind_variable("broken", Outcome::failed("no such key: nope"));

        assert_eq!(eval(&engine, "true || variables.broken", &env), Ok(Value::Bool(true)));
        assert!(matches!(
            eval(&engine, "false || variables.broken", &env),
            Err(ExpressionError::FailedReference { .. })
        ));
    }

    #[test]
    fn test_variable_refs_are_deduplicated() {
        let engine = declared(&["a", "b"]);
        let program = engine.compile("variables.a + variables.b + variables.a").unwrap();
        assert_eq!(program.variable_refs(), ["a", "b"]);
    }

    #[test]
    fn test_declare_rejects_reserved_variable_names() {
        let mut engine = CelEngine::default();
        let err = engine.declare(&["object".to_string(), "variables.object".to_string()]).unwrap_err();
        assert!(err.to_string().contains("collides with a reserved name"));

        let mut engine = CelEngine::default();
        let _ = engine.declare(&["variables.variables".to_string()]).unwrap_err();
    }

    #[test]
    fn test_declare_rejects_invalid_identifiers() {
        let mut engine = CelEngine::default();
        let err = engine.declare(&["variables.my-var".to_string()]).unwrap_err();
        assert!(err.to_string().contains("not a valid identifier"));

        let mut engine = CelEngine::default();
        let _ = engine.declare(&["1object".to_string()]).unwrap_err();

        let mut engine = CelEngine::default();
        let _ = engine.declare(&["variables".to_string()]).unwrap_err();
    }

    #[test]
    fn test_declare_accepts_duplicate_variables() {
        let mut engine = CelEngine::default();
        engine
            .declare(&["variables.x".to_string(), "variables.x".to_string()])
            .unwrap();
        let _ = engine.compile("variables.x").unwrap();
    }
}
