//! End-to-end evaluation of policies through the public library entry point.

use serde_json::{Value, json};
use vap_eval_lib::eval::EvaluationOptions;
use vap_eval_lib::evaluate_policy;
use vap_eval_lib::policy::InputSources;

fn evaluate(policy: &str, object: &str) -> Value {
    let sources = InputSources {
        object: Some(object),
        ..InputSources::default()
    };

    let report = evaluate_policy(policy, &sources, &EvaluationOptions::default()).expect("report should aggregate");
    serde_json::to_value(&report).expect("report should serialize")
}

const PROD_POLICY: &str = r#"
apiVersion: admissionregistration.k8s.io/v1
kind: ValidatingAdmissionPolicy
metadata:
  name: prod-only
spec:
  variables:
  - name: isProd
    expression: object.env == "prod"
  matchConditions:
  - name: isProd-condition
    expression: variables.isProd
  validations:
  - expression: "has(object.owner)"
    message: an owner is required
  auditAnnotations:
  - key: environment
    valueExpression: "'prod'"
"#;

#[test]
#[cfg_attr(miri, ignore)]
fn test_matching_object_runs_every_phase() {
    let report = evaluate(PROD_POLICY, "env: prod\nowner: team-a\n");

    assert_eq!(
        report,
        json!({
            "variables": [{"name": "isProd", "result": true}],
            "matchConditions": [{"name": "isProd-condition", "result": true}],
            "validations": [{"name": "spec.validations[0].expression", "result": true}],
            "auditAnnotations": [{"name": "environment", "result": "prod"}],
        })
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_non_matching_object_skips_validations_and_annotations() {
    let report = evaluate(PROD_POLICY, "env: dev\n");

    assert_eq!(report["matchConditions"], json!([{"name": "isProd-condition", "result": false}]));
    assert!(report.get("validations").is_none());
    assert!(report.get("auditAnnotations").is_none());
    assert!(report.get("error").is_none());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_failed_validation_carries_static_message() {
    let policy = r"
spec:
  validations:
  - expression: object.replicas <= 5
    message: too many replicas
    reason: Invalid
  auditAnnotations:
  - key: replicas
    valueExpression: string(object.replicas)
";

    let report = evaluate(policy, "replicas: 10\n");

    assert_eq!(
        report["validations"],
        json!([{
            "name": "spec.validations[0].expression",
            "result": false,
            "message": "too many replicas",
            "reason": "Invalid",
        }])
    );
    assert!(report.get("auditAnnotations").is_none());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_failed_variable_is_contained() {
    let policy = r"
spec:
  variables:
  - name: team
    expression: object.metadata.labels.team
  matchConditions:
  - name: has-team
    expression: variables.team == 'payments'
  validations:
  - expression: 'true'
";

    let report = evaluate(policy, "metadata:\n  name: web\n");

    assert!(report.get("error").is_none());
    assert!(report["variables"][0]["error"].is_string());
    assert!(report["variables"][0].get("result").is_none());

    let condition = &report["matchConditions"][0];
    assert_eq!(condition["name"], "has-team");
    assert!(condition["error"].as_str().unwrap().contains("variable 'team' failed to evaluate"));
    assert!(report.get("validations").is_none());

    let warnings = &report["typeChecking"]["expressionWarnings"];
    assert_eq!(warnings[0]["fieldRef"], "spec.matchConditions[has-team].expression");
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_malformed_policy_reports_only_the_error() {
    let report = evaluate("spec:\n  variables: {name: [\n", "env: prod\n");

    let object = report.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert!(report["error"].as_str().unwrap().starts_with("failed to parse policy YAML"));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_message_expression_and_every_root() {
    let policy = r"
spec:
  variables:
  - name: limit
    expression: params.maxReplicas
  validations:
  - expression: object.spec.replicas <= variables.limit
    messageExpression: >-
      'replicas for ' + request.userInfo.username + ' in ' + namespaceObject.metadata.name
      + ' limited to ' + string(variables.limit) + ', was ' + string(oldObject.spec.replicas)
";

    let sources = InputSources {
        object: Some("spec:\n  replicas: 7\n"),
        old_object: Some("spec:\n  replicas: 3\n"),
        params: Some(r#"{"maxReplicas": 4}"#),
        request: Some("userInfo:\n  username: alice\n"),
        namespace_object: Some("metadata:\n  name: staging\n"),
    };

    let report = evaluate_policy(policy, &sources, &EvaluationOptions::default()).unwrap();
    assert!(report.denied());

    let validation = &report.validations.as_ref().unwrap()[0];
    assert_eq!(validation.result, Some(json!(false)));
    assert_eq!(
        validation.message,
        Some(json!("replicas for alice in staging limited to 4, was 3"))
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_absent_roots_are_empty_maps() {
    let policy = r"
spec:
  variables:
  - name: hasOld
    expression: has(oldObject.spec)
  - name: paramCount
    expression: size(params)
";

    let report = evaluate(policy, "");

    assert_eq!(
        report["variables"],
        json!([
            {"name": "hasOld", "result": false},
            {"name": "paramCount", "result": 0},
        ])
    );
}
