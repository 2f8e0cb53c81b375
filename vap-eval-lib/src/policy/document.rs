use crate::Result;
use ohno::app_err;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "    policy";
const POLICY_KIND: &str = "ValidatingAdmissionPolicy";

/// A named value computed once per run and visible to later expressions as `variables.<name>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    pub expression: String,
}

/// A gating condition; the policy applies only when every condition yields `true`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCondition {
    pub name: String,
    pub expression: String,
}

/// A rule that must yield `true` for the request to be admitted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub expression: String,

    /// Static failure message, preferred over `message_expression`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_expression: Option<String>,

    /// Machine-readable failure reason, e.g. `Forbidden` or `Invalid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validation {
    /// The static message, if one was given and is not empty.
    #[must_use]
    pub fn static_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }

    /// The message expression, if one was given and is not empty.
    #[must_use]
    pub fn message_expression(&self) -> Option<&str> {
        self.message_expression.as_deref().filter(|m| !m.is_empty())
    }
}

/// A key/value pair recorded for requests that fully satisfy the policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditAnnotation {
    pub key: String,
    pub value_expression: String,
}

/// The evaluable content of a policy, in authoring order
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    /// Policy name taken from `metadata.name`, used only for diagnostics
    #[serde(skip)]
    pub name: Option<String>,

    #[serde(default)]
    pub variables: Vec<Variable>,

    #[serde(default)]
    pub match_conditions: Vec<MatchCondition>,

    #[serde(default)]
    pub validations: Vec<Validation>,

    #[serde(default)]
    pub audit_annotations: Vec<AuditAnnotation>,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    kind: Option<String>,

    #[serde(default)]
    metadata: Metadata,

    #[serde(default)]
    spec: PolicyDocument,
}

impl PolicyDocument {
    /// Parse a `ValidatingAdmissionPolicy` manifest written in YAML or JSON
    ///
    /// Only `metadata.name` and the evaluable parts of `spec` are retained;
    /// binding-related fields such as `matchConstraints` or `paramKind` are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty or is not a well-formed policy manifest
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(app_err!("failed to parse policy YAML: document is empty"));
        }

        let manifest: Manifest = serde_yaml::from_str(text).map_err(|e| app_err!("failed to parse policy YAML: {e}"))?;

        if let Some(kind) = manifest.kind.as_deref()
            && kind != POLICY_KIND
        {
            log::warn!(target: LOG_TARGET, "Expected a {POLICY_KIND}, found kind '{kind}'; evaluating its spec anyway");
        }

        let mut document = manifest.spec;
        document.name = manifest.metadata.name;
        Ok(document)
    }

    /// Name used in diagnostics.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = r#"
apiVersion: admissionregistration.k8s.io/v1
kind: ValidatingAdmissionPolicy
metadata:
  name: demo-policy.example.com
spec:
  failurePolicy: Fail
  matchConstraints:
    resourceRules:
    - apiGroups: ["apps"]
      apiVersions: ["v1"]
      operations: ["CREATE", "UPDATE"]
      resources: ["deployments"]
  variables:
  - name: replicas
    expression: "object.spec.replicas"
  - name: isProd
    expression: "object.metadata.namespace == 'prod'"
  matchConditions:
  - name: prod-only
    expression: "variables.isProd"
  validations:
  - expression: "variables.replicas <= 5"
    message: "too many replicas"
    reason: Invalid
  - expression: "object.metadata.name.startsWith('app-')"
    messageExpression: "'bad name: ' + object.metadata.name"
  auditAnnotations:
  - key: replicas
    valueExpression: "string(variables.replicas)"
"#;

    #[test]
    fn test_parse_preserves_authoring_order() {
        let doc = PolicyDocument::parse(POLICY).unwrap();

        assert_eq!(doc.name.as_deref(), Some("demo-policy.example.com"));
        assert_eq!(
            doc.variables.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["replicas", "isProd"]
        );
        assert_eq!(doc.match_conditions.len(), 1);
        assert_eq!(doc.match_conditions[0].name, "prod-only");
        assert_eq!(doc.validations.len(), 2);
        assert_eq!(doc.validations[0].static_message(), Some("too many replicas"));
        assert_eq!(doc.validations[0].reason.as_deref(), Some("Invalid"));
        assert_eq!(doc.validations[1].static_message(), None);
        assert_eq!(
            doc.validations[1].message_expression(),
            Some("'bad name: ' + object.metadata.name")
        );
        assert_eq!(doc.audit_annotations[0].key, "replicas");
        assert_eq!(doc.audit_annotations[0].value_expression, "string(variables.replicas)");
    }

    #[test]
    fn test_parse_json_manifest() {
        let json = r#"{"kind":"ValidatingAdmissionPolicy","spec":{"validations":[{"expression":"true"}]}}"#;
        let doc = PolicyDocument::parse(json).unwrap();
        assert!(doc.name.is_none());
        assert_eq!(doc.display_name(), "<unnamed>");
        assert_eq!(doc.validations.len(), 1);
        assert!(doc.variables.is_empty());
    }

    #[test]
    fn test_parse_missing_spec_is_empty_policy() {
        let doc = PolicyDocument::parse("kind: ValidatingAdmissionPolicy\nmetadata:\n  name: empty\n").unwrap();
        assert_eq!(doc.display_name(), "empty");
        assert!(doc.match_conditions.is_empty());
        assert!(doc.validations.is_empty());
        assert!(doc.audit_annotations.is_empty());
    }

    #[test]
    fn test_empty_message_is_ignored() {
        let validation = Validation {
            expression: "false".to_string(),
            message: Some(String::new()),
            message_expression: Some(String::new()),
            reason: None,
        };
        assert!(validation.static_message().is_none());
        assert!(validation.message_expression().is_none());
    }

    #[test]
    fn test_parse_empty_text_fails() {
        let err = PolicyDocument::parse("  \n").unwrap_err();
        assert!(err.to_string().contains("document is empty"));
    }

    #[test]
    fn test_parse_malformed_yaml_fails() {
        let err = PolicyDocument::parse("spec:\n  variables: [\n").unwrap_err();
        assert!(err.to_string().contains("failed to parse policy YAML"));
    }

    #[test]
    fn test_parse_wrong_shape_fails() {
        let err = PolicyDocument::parse("spec:\n  variables: \"not a list\"\n").unwrap_err();
        assert!(err.to_string().contains("failed to parse policy YAML"));
    }

    #[test]
    fn test_variable_without_expression_fails() {
        let _ = PolicyDocument::parse("spec:\n  variables:\n  - name: x\n").unwrap_err();
    }
}
