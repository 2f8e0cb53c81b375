use crate::Result;
use crate::eval::EvaluationOptions;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

const LOG_TARGET: &str = "    config";

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "vap-eval.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pretty-print JSON reports
    #[serde(default = "default_pretty_json")]
    pub pretty_json: bool,

    /// Record failed match conditions and validations as expression warnings
    #[serde(default = "default_expression_warnings")]
    pub expression_warnings: bool,

    /// Expressions longer than this many characters fail to compile
    #[serde(default = "default_max_expression_length")]
    pub max_expression_length: usize,
}

const fn default_pretty_json() -> bool {
    true
}

const fn default_expression_warnings() -> bool {
    true
}

const fn default_max_expression_length() -> usize {
    crate::expr::DEFAULT_MAX_EXPRESSION_LENGTH
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading vap-eval configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading vap-eval configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        log::debug!(target: LOG_TARGET, "Loaded configuration from '{final_path}'");
        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.max_expression_length == 0 {
            return Err(app_err!("max_expression_length must be greater than 0"));
        }

        Ok(())
    }

    /// The evaluation knobs this configuration selects
    #[must_use]
    pub const fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            expression_warnings: self.expression_warnings,
            max_expression_length: self.max_expression_length,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pretty_json: default_pretty_json(),
            expression_warnings: default_expression_warnings(),
            max_expression_length: default_max_expression_length(),
        }
    }
}
