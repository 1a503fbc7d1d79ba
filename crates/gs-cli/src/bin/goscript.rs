//! goscript CLI Binary
//!
//! Runs Go programs with every silently discarded error checked: each
//! dropped `error` result is bound to a variable and panics when non-nil.
//!
//! # Usage
//!
//! ```bash
//! # Run a program, passing `-n 3` to it
//! goscript run main.go util.go -- -n 3
//!
//! # Print the rewritten sources
//! goscript rewrite main.go
//!
//! # Write them to a directory with a JSON summary
//! goscript rewrite main.go --output-dir out --report out/report.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use gs_cli::{
    commands::{self, rewrite::RewriteArgs, run::RunArgs},
    config::CliConfig,
    diagnostics::{render_cli_error, setup_error_reporting},
    CliError, Result,
};
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(
    name = "goscript",
    version = env!("CARGO_PKG_VERSION"),
    about = "goscript: run Go programs with every discarded error turned into a panic",
    long_about = r#"
goscript rewrites a Go package so that no error result is silently dropped.
Calls whose error results are discarded get them bound to fresh variables
followed by `if errN != nil { panic(errN) }`.

EXAMPLES:
    goscript run main.go                  # Run the rewritten program
    goscript run main.go -- input.txt     # Pass arguments to the program
    goscript rewrite main.go              # Print the rewritten source
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite and run a Go program with `go run`
    Run(RunArgs),

    /// Print or write the rewritten sources without running them
    Rewrite(RewriteArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let code = match execute(cli).await {
        Ok(code) => {
            debug!(code, "command finished");
            code
        }
        Err(e) => {
            let code = e.exit_code();
            if let Some(e) = render_cli_error(e) {
                error!("{}", e);
                if verbose > 0 {
                    error!(?e, "detailed error context");
                }
            }
            code
        }
    };
    std::process::exit(code);
}

async fn execute(cli: Cli) -> Result<i32> {
    setup_error_reporting()?;
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(CliError::Io)?;
    }

    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run_command(args, &config).await,
        Commands::Rewrite(args) => commands::rewrite_command(args, &config).await,
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout belongs to the program being run and to `rewrite` output.
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    let installed = match log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(formatter)
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(formatter.json())
            .with(filter)
            .try_init(),
    };
    installed.map_err(|e| CliError::Config(format!("Failed to setup logging: {}", e)))
}
