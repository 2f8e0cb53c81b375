use super::Host;
use super::common::{LogLevel, read_document};
use super::config::Config;
use crate::Result;
use crate::eval::{Evaluator, ExpressionWarning};
use crate::expr::CelEngine;
use crate::policy::PolicyDocument;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::app_err;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Policy document (YAML or JSON)
    #[arg(long, short = 'p', value_name = "PATH")]
    pub policy: Utf8PathBuf,

    /// Path to configuration file (default is `vap-eval.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Parses the policy and compiles every expression it holds
///
/// # Errors
///
/// Returns an error if the configuration or policy cannot be loaded, or if the
/// policy's variable names cannot be declared
fn validate_policy_inner(args: &ValidateArgs) -> Result<(PolicyDocument, Vec<ExpressionWarning>)> {
    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let text = read_document("policy", &args.policy)?;
    let policy = PolicyDocument::parse(&text)?;

    let options = config.evaluation_options();
    let errors = Evaluator::new(&policy, CelEngine::new(options.max_expression_length), &options)?.compile_errors();

    Ok((policy, errors))
}

pub fn validate_policy<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    args.log_level.init_logging();

    match validate_policy_inner(args) {
        Ok((policy, errors)) if errors.is_empty() => {
            let _ = writeln!(host.output(), "Policy '{}' is valid", policy.display_name());
            let _ = writeln!(
                host.output(),
                "{} variables, {} match conditions, {} validations, {} audit annotations",
                policy.variables.len(),
                policy.match_conditions.len(),
                policy.validations.len(),
                policy.audit_annotations.len()
            );
            Ok(())
        }
        Ok((policy, errors)) => {
            for error in &errors {
                let _ = writeln!(host.error(), "❌ {}: {}", error.field_ref, error.warning);
            }
            host.exit(1);
            Err(app_err!("{} expression(s) in policy '{}' failed to compile", errors.len(), policy.display_name()))
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Policy validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}
