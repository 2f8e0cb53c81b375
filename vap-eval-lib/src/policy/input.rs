use crate::Result;
use ohno::app_err;
use serde_json::{Map, Value};

/// Root names every expression can reference, in declaration order
pub const ROOT_NAMES: [&str; 5] = ["object", "oldObject", "params", "request", "namespaceObject"];

/// Root under which policy variables are exposed as `variables.<name>`
pub const VARIABLES_ROOT: &str = "variables";

/// The root documents supplied to one evaluation run
///
/// Each document is a generic structured value. A root that was not supplied is
/// exposed to expressions as an empty map, never as an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputValues {
    pub object: Option<Value>,
    pub old_object: Option<Value>,
    pub params: Option<Value>,
    pub request: Option<Value>,
    pub namespace_object: Option<Value>,
}

impl InputValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_object(mut self, object: Value) -> Self {
        self.object = Some(object);
        self
    }

    #[must_use]
    pub fn with_old_object(mut self, old_object: Value) -> Self {
        self.old_object = Some(old_object);
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn with_request(mut self, request: Value) -> Self {
        self.request = Some(request);
        self
    }

    #[must_use]
    pub fn with_namespace_object(mut self, namespace_object: Value) -> Self {
        self.namespace_object = Some(namespace_object);
        self
    }

    /// Every root paired with its document, absent roots replaced by an empty map.
    pub fn roots(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        let docs = [
            &self.object,
            &self.old_object,
            &self.params,
            &self.request,
            &self.namespace_object,
        ];

        ROOT_NAMES
            .into_iter()
            .zip(docs)
            .map(|(name, doc)| (name, doc.clone().unwrap_or_else(|| Value::Object(Map::new()))))
    }

    /// Parse one root document from YAML or JSON text
    ///
    /// Empty text and an explicit `null` both yield an empty map. `what` names the
    /// root in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or its top level is not a mapping
    pub fn parse_document(what: &str, text: &str) -> Result<Value> {
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        let value: Value = serde_yaml::from_str(text).map_err(|e| app_err!("failed to parse {what} YAML: {e}"))?;
        match value {
            Value::Null => Ok(Value::Object(Map::new())),
            Value::Object(_) => Ok(value),
            other => Err(app_err!(
                "failed to parse {what} YAML: expected a mapping at the top level, found {}",
                json_kind(&other)
            )),
        }
    }
}

/// Unparsed root documents as supplied by the caller
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSources<'a> {
    pub object: Option<&'a str>,
    pub old_object: Option<&'a str>,
    pub params: Option<&'a str>,
    pub request: Option<&'a str>,
    pub namespace_object: Option<&'a str>,
}

impl InputSources<'_> {
    /// Parse every supplied document
    ///
    /// # Errors
    ///
    /// Returns an error naming the first document that fails to parse
    pub fn parse(&self) -> Result<InputValues> {
        let parse = |what: &str, text: Option<&str>| text.map(|t| InputValues::parse_document(what, t)).transpose();

        Ok(InputValues {
            object: parse("object", self.object)?,
            old_object: parse("oldObject", self.old_object)?,
            params: parse("params", self.params)?,
            request: parse("request", self.request)?,
            namespace_object: parse("namespaceObject", self.namespace_object)?,
        })
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
