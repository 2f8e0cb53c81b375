use super::Host;
use super::config::{CONFIG_FILE_NAME, Config};
use crate::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::{IntoAppError, app_err};
use std::fs;
use std::io::Write;

const SAMPLE_POLICY: &str = include_str!("../../samples/policy.yaml");
const SAMPLE_OBJECT: &str = include_str!("../../samples/deployment.yaml");

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Directory to write the sample files into (default is the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<Utf8PathBuf>,

    /// Overwrite files that already exist
    #[arg(long)]
    pub force: bool,
}

/// Write a sample policy, a matching deployment and the default configuration
///
/// # Errors
///
/// Returns an error if a target file already exists (without `--force`) or cannot be written
pub fn init_samples<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    let dir = args.dir.clone().unwrap_or_else(|| Utf8PathBuf::from("."));
    fs::create_dir_all(&dir).into_app_err_with(|| format!("creating directory '{dir}'"))?;

    let policy = dir.join("policy.yaml");
    let object = dir.join("object.yaml");
    let config = dir.join(CONFIG_FILE_NAME);

    if !args.force
        && let Some(existing) = [&policy, &object, &config].into_iter().find(|p| p.exists())
    {
        return Err(app_err!("'{existing}' already exists, use --force to overwrite it"));
    }

    fs::write(&policy, SAMPLE_POLICY).into_app_err_with(|| format!("writing sample policy to {policy}"))?;
    fs::write(&object, SAMPLE_OBJECT).into_app_err_with(|| format!("writing sample object to {object}"))?;
    Config::save_default(&config)?;

    let _ = writeln!(host.output(), "Generated sample policy: {policy}");
    let _ = writeln!(host.output(), "Generated sample object: {object}");
    let _ = writeln!(host.output(), "Generated default configuration file: {config}");
    let _ = writeln!(host.output(), "Try: vap-eval eval --policy {policy} --object {object} --format console");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::eval::{EvalArgs, eval_policy};
    use crate::commands::host::TestHost;

    fn temp_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from(dir.path().to_string_lossy().to_string())
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_samples_are_written() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_root(&temp_dir).join("demo");

        let mut host = TestHost::new();
        init_samples(&mut host, &InitArgs { dir: Some(root.clone()), force: false }).unwrap();

        assert!(root.join("policy.yaml").exists());
        assert!(root.join("object.yaml").exists());
        assert_eq!(fs::read_to_string(root.join(CONFIG_FILE_NAME)).unwrap(), crate::commands::DEFAULT_CONFIG_TOML);
        assert!(host.output_str().contains("Generated sample policy"));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_existing_files_are_kept_without_force() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_root(&temp_dir);
        fs::write(root.join("object.yaml"), "mine").unwrap();

        let mut host = TestHost::new();
        let err = init_samples(&mut host, &InitArgs { dir: Some(root.clone()), force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(root.join("object.yaml")).unwrap(), "mine");

        init_samples(&mut host, &InitArgs { dir: Some(root.clone()), force: true }).unwrap();
        assert_ne!(fs::read_to_string(root.join("object.yaml")).unwrap(), "mine");
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_samples_are_admitted() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_root(&temp_dir);

        let mut host = TestHost::new();
        init_samples(&mut host, &InitArgs { dir: Some(root.clone()), force: false }).unwrap();

        let mut args = EvalArgs::new(root.join("policy.yaml"));
        args.object = Some(root.join("object.yaml"));
        args.common.config = Some(root.join(CONFIG_FILE_NAME));
        args.error_if_denied = true;

        let mut host = TestHost::new();
        eval_policy(&mut host, &args).unwrap();

        let report: serde_json::Value = serde_json::from_str(&host.output_str()).unwrap();
        assert_eq!(report["auditAnnotations"][0]["result"], "Deployment spec.replicas set to 1");
        assert!(report.get("typeChecking").is_none());
    }
}
