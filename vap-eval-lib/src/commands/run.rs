//! Command dispatch logic for vap-eval

use super::{EvalArgs, InitArgs, ValidateArgs, eval_policy, init_samples, validate_policy};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "vap-eval", version, author, long_about = None)]
#[command(about = "Evaluate Kubernetes validating admission policies against sample resources")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a policy against an object and report the outcome
    Eval(Box<EvalArgs>),
    /// Check that a policy parses and all of its expressions compile
    Validate(ValidateArgs),
    /// Write a sample policy, object and default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Eval(eval_args) => eval_policy(host, eval_args),
        Command::Validate(validate_args) => validate_policy(host, validate_args),
        Command::Init(init_args) => init_samples(host, init_args),
    }
}
