//! goscript command-line interface
//!
//! Runs Go programs after turning every silently discarded error into a
//! checked one, or prints the rewritten sources.

pub mod commands;
pub mod config;
pub mod diagnostics;

pub mod error {
    use thiserror::Error;

    use crate::diagnostics::GoscriptDiagnostic;

    /// Exit code for failures of goscript itself, as opposed to the program.
    pub const TOOLING_FAILURE: i32 = 2;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error(transparent)]
        Core(#[from] gs_core::error::Error),

        #[error(transparent)]
        Diagnostic(Box<GoscriptDiagnostic>),

        #[error("Toolchain error: {0}")]
        Toolchain(String),

        #[error("Invalid arguments: {0}")]
        InvalidArgs(String),
    }

    impl CliError {
        pub fn exit_code(&self) -> i32 {
            TOOLING_FAILURE
        }
    }

    impl From<GoscriptDiagnostic> for CliError {
        fn from(diagnostic: GoscriptDiagnostic) -> Self {
            CliError::Diagnostic(Box::new(diagnostic))
        }
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result, TOOLING_FAILURE};
