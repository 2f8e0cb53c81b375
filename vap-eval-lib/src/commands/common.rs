//! Argument types and helpers shared between commands.

use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use ohno::IntoAppError;
use std::fs;

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    /// Resolve the mode for a report going to stdout or to a file
    #[must_use]
    pub fn use_colors(self, to_file: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => {
                use std::io::{IsTerminal, stdout};
                !to_file && stdout().is_terminal()
            }
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

impl LogLevel {
    pub(super) fn init_logging(self) {
        let level = match self {
            Self::None => return,
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };

        let env = env_logger::Env::default().filter_or("RUST_LOG", level);

        // a logger may already be installed when commands run more than once in a process
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(matches!(self, Self::Debug | Self::Trace))
            .try_init();
    }
}

/// Report format for the eval command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The JSON evaluation report
    Json,

    /// A human-readable summary
    Console,
}

/// Arguments shared by every command that evaluates or checks a policy
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to configuration file (default is `vap-eval.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

impl Default for CommonArgs {
    fn default() -> Self {
        Self {
            config: None,
            color: ColorMode::Auto,
            log_level: LogLevel::None,
        }
    }
}

/// Read one input document
pub(super) fn read_document(what: &str, path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).into_app_err_with(|| format!("reading {what} file '{path}'"))
}

/// Read an input document that may not have been supplied
pub(super) fn read_optional_document(what: &str, path: Option<&Utf8PathBuf>) -> Result<Option<String>> {
    path.map(|p| read_document(what, p)).transpose()
}
