//! Command-line interface and orchestration for vap-eval
//!
//! # Commands
//!
//! - **eval**: Evaluate a policy against an object (and optionally its old
//!   version, params, request and namespace) and print the report
//! - **validate**: Check that a policy parses and every expression compiles
//! - **init**: Write a sample policy, a sample deployment and the default
//!   configuration file
//!
//! The `run` function parses command-line arguments using clap and routes
//! to the appropriate command handler. Output goes through a [`Host`] so the
//! commands can be exercised in tests without touching the real process.
//!
//! Configuration is a small TOML file (`vap-eval.toml`) controlling report
//! formatting and engine limits.

mod common;
mod config;
mod eval;
mod host;
mod init;
mod run;
mod validate;

pub use common::{ColorMode, CommonArgs, LogLevel, OutputFormat};
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
pub use eval::{EvalArgs, eval_policy};
pub use host::Host;
pub use init::{InitArgs, init_samples};
pub use run::run;
pub use validate::{ValidateArgs, validate_policy};
