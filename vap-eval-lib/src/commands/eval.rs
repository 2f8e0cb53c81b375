use super::Host;
use super::common::{CommonArgs, OutputFormat, read_document, read_optional_document};
use super::config::Config;
use crate::Result;
use crate::eval::evaluate_policy;
use crate::policy::InputSources;
use crate::reports::{generate_console, generate_json};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::{IntoAppError, app_err};
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "   command";

#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// Policy document (YAML or JSON)
    #[arg(long, short = 'p', value_name = "PATH")]
    pub policy: Utf8PathBuf,

    /// Object under admission, exposed as `object`
    #[arg(long, value_name = "PATH")]
    pub object: Option<Utf8PathBuf>,

    /// Prior version of the object, exposed as `oldObject`
    #[arg(long, value_name = "PATH")]
    pub old_object: Option<Utf8PathBuf>,

    /// Parameter resource, exposed as `params`
    #[arg(long, value_name = "PATH")]
    pub params: Option<Utf8PathBuf>,

    /// Admission request attributes, exposed as `request`
    #[arg(long, value_name = "PATH")]
    pub request: Option<Utf8PathBuf>,

    /// Namespace of the object, exposed as `namespaceObject`
    #[arg(long, value_name = "PATH")]
    pub namespace: Option<Utf8PathBuf>,

    /// Report format
    #[arg(long, value_name = "FORMAT", default_value = "json", help_heading = "Report Output")]
    pub format: OutputFormat,

    /// Write the report to a file instead of to the terminal
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub output: Option<Utf8PathBuf>,

    /// Exit with status code 1 if the policy denies the request
    #[arg(long)]
    pub error_if_denied: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl EvalArgs {
    /// Arguments evaluating `policy` with every other option at its default
    #[must_use]
    pub fn new(policy: impl Into<Utf8PathBuf>) -> Self {
        Self {
            policy: policy.into(),
            object: None,
            old_object: None,
            params: None,
            request: None,
            namespace: None,
            format: OutputFormat::Json,
            output: None,
            error_if_denied: false,
            common: CommonArgs::default(),
        }
    }
}

/// Evaluate a policy file against the supplied input files and emit the report
///
/// The report is always emitted, even when it carries a top-level error.
///
/// # Errors
///
/// Returns an error if an input file cannot be read, the report cannot be written,
/// the report carries a top-level error, or `--error-if-denied` is set and the
/// policy denied the request
pub fn eval_policy<H: Host>(host: &mut H, args: &EvalArgs) -> Result<()> {
    args.common.log_level.init_logging();

    let config = Config::load(Utf8Path::new("."), args.common.config.as_ref())?;

    let policy = read_document("policy", &args.policy)?;
    let object = read_optional_document("object", args.object.as_ref())?;
    let old_object = read_optional_document("old object", args.old_object.as_ref())?;
    let params = read_optional_document("params", args.params.as_ref())?;
    let request = read_optional_document("request", args.request.as_ref())?;
    let namespace = read_optional_document("namespace", args.namespace.as_ref())?;

    let sources = InputSources {
        object: object.as_deref(),
        old_object: old_object.as_deref(),
        params: params.as_deref(),
        request: request.as_deref(),
        namespace_object: namespace.as_deref(),
    };

    log::info!(target: LOG_TARGET, "Evaluating '{}'", args.policy);
    let report = evaluate_policy(&policy, &sources, &config.evaluation_options())?;

    let mut text = String::new();
    match args.format {
        OutputFormat::Json => generate_json(&report, config.pretty_json, &mut text)?,
        OutputFormat::Console => generate_console(&report, args.common.color.use_colors(args.output.is_some()), &mut text)?,
    }

    if let Some(path) = &args.output {
        fs::write(path, &text).into_app_err_with(|| format!("writing report to '{path}'"))?;
        log::info!(target: LOG_TARGET, "Wrote report to '{path}'");
    } else {
        host.output()
            .write_all(text.as_bytes())
            .into_app_err("writing report to the terminal")?;
    }

    if let Some(error) = &report.error {
        return Err(app_err!("policy could not be evaluated: {error}"));
    }

    if args.error_if_denied && report.denied() {
        return Err(ohno::AppError::new("the policy denied the request"));
    }

    Ok(())
}
