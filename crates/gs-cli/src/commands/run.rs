//! Run command implementation.

use crate::commands::{is_go_file, output_name, rewrite_package};
use crate::{config::CliConfig, CliError, Result, TOOLING_FAILURE};
use clap::Args;
use gs_core::ast::AstSerializer;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Arguments for the run command
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// The `go` binary to run the rewritten program with
    #[arg(long)]
    pub go: Option<PathBuf>,

    /// Keep the directory holding the rewritten sources
    #[arg(long)]
    pub keep_temp_dir: bool,

    /// Go files of one package, then arguments for the program
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "FILES.go... [--] ARGS"
    )]
    pub args: Vec<String>,
}

/// Split the positional arguments into source files and program arguments.
///
/// Sources run up to the first argument not ending in `.go`; a `--` right
/// after them is dropped.
pub fn split_args(args: &[String]) -> (Vec<PathBuf>, Vec<String>) {
    let split = args
        .iter()
        .position(|arg| !is_go_file(Path::new(arg)))
        .unwrap_or(args.len());
    let files = args[..split].iter().map(PathBuf::from).collect();
    let mut rest = &args[split..];
    if rest.first().is_some_and(|arg| arg == "--") {
        rest = &rest[1..];
    }
    (files, rest.to_vec())
}

pub async fn run_command(args: RunArgs, config: &CliConfig) -> Result<i32> {
    let (files, program_args) = split_args(&args.args);
    let package = rewrite_package(&files)?;

    let dir = tempfile::Builder::new()
        .prefix(&config.run.temp_prefix)
        .tempdir()?;
    let serializer = &package.serializer;
    let mut sources = Vec::with_capacity(package.files.len());
    for file in &package.files {
        let target = dir.path().join(output_name(file)?);
        std::fs::write(&target, serializer.serialize_file(file)?)?;
        sources.push(target);
    }
    debug!(dir = %dir.path().display(), files = sources.len(), "rewritten sources written");

    let go = args.go.as_ref().unwrap_or(&config.toolchain.go);
    info!(go = %go.display(), "running rewritten program");
    let status = tokio::process::Command::new(go)
        .arg("run")
        .args(&sources)
        .args(&program_args)
        .status()
        .await
        .map_err(|e| CliError::Toolchain(format!("failed to start {}: {}", go.display(), e)))?;

    if args.keep_temp_dir || config.run.keep_temp_dir {
        let kept = dir.keep();
        info!(dir = %kept.display(), "keeping rewritten sources");
    }

    match status.code() {
        Some(code) => Ok(code),
        None => {
            warn!(%status, "program terminated without an exit code");
            Ok(TOOLING_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn program_arguments_start_after_the_sources() {
        let (files, rest) = split_args(&strings(&["main.go", "util.go", "-n", "3"]));
        assert_eq!(files, [PathBuf::from("main.go"), PathBuf::from("util.go")]);
        assert_eq!(rest, ["-n", "3"]);
    }

    #[test]
    fn leading_separator_is_dropped() {
        let (files, rest) = split_args(&strings(&["main.go", "--", "--", "x.go"]));
        assert_eq!(files, [PathBuf::from("main.go")]);
        assert_eq!(rest, ["--", "x.go"]);
    }

    #[test]
    fn no_sources_leaves_everything_to_the_program() {
        let (files, rest) = split_args(&strings(&["input.txt"]));
        assert!(files.is_empty());
        assert_eq!(rest, ["input.txt"]);
    }
}
