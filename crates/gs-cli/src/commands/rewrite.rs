//! Rewrite command implementation.

use crate::commands::{output_name, rewrite_package};
use crate::{config::CliConfig, Result};
use clap::Args;
use gs_core::ast::AstSerializer;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the rewrite command
#[derive(Debug, Clone, Args)]
pub struct RewriteArgs {
    /// Go files of one package
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the rewritten files here instead of printing them
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Write a JSON summary of the rewrite to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

pub async fn rewrite_command(args: RewriteArgs, _config: &CliConfig) -> Result<i32> {
    let package = rewrite_package(&args.files)?;
    let serializer = &package.serializer;

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
        for file in &package.files {
            let target = dir.join(output_name(file)?);
            std::fs::write(&target, serializer.serialize_file(file)?)?;
            info!(path = %target.display(), "wrote rewritten source");
        }
    } else {
        let mut stdout = std::io::stdout().lock();
        let several = package.files.len() > 1;
        for file in &package.files {
            if several {
                writeln!(stdout, "// {}", file.path.display())?;
            }
            stdout.write_all(serializer.serialize_file(file)?.as_bytes())?;
        }
        stdout.flush()?;
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&package.report).map_err(|e| {
            crate::CliError::Config(format!("Failed to serialize report: {}", e))
        })?;
        std::fs::write(path, json)?;
    }

    Ok(0)
}
