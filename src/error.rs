//! Error types for the command line tool.
//!
//! This module wraps compiler errors with CLI failures and derives
//! actionable recovery suggestions from them.

use crate::bundler::Error as CompileError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compiler errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Refusing to overwrite an existing file
    #[error("{} already exists (use --force to overwrite)", path.display())]
    AlreadyExists {
        /// Existing file
        path: PathBuf,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Bundler(CompileError::MissingCapabilities {
                remediation: Some(remediation),
                ..
            }) => {
                let mut steps = vec![remediation.summary.clone()];
                steps.extend(
                    remediation
                        .steps
                        .iter()
                        .enumerate()
                        .map(|(i, step)| format!("{}. {}", i + 1, step)),
                );
                steps
            }
            BundlerError::Bundler(CompileError::MissingCapabilities { .. }) => vec![
                "Remove the extensions from \"extensions\" and \"ini\"".to_string(),
                "Or point \"targets[].stub\" at a custom runtime stub".to_string(),
            ],
            BundlerError::Bundler(CompileError::UnsupportedArchitecture { supported, .. }) => {
                vec![format!("Use one of: {}", supported.join(", "))]
            }
            BundlerError::Bundler(CompileError::ToolNotFound { hint, .. }) => vec![hint.clone()],
            BundlerError::Bundler(
                CompileError::InvalidTargetOutput { .. } | CompileError::DuplicateTargetOutput { .. },
            ) => vec![
                "Give each target its own relative \"output\" below the output directory".to_string(),
            ],
            BundlerError::Bundler(CompileError::Download { .. }) => vec![
                "Check your network connection".to_string(),
                "Or place the file in the project's stubs/ directory".to_string(),
            ],
            BundlerError::Bundler(e) if e.is_configuration_error() => {
                vec!["Fix the build configuration file and run again".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Exit code for this error: 2 for configuration problems, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Bundler(e) if e.is_configuration_error() => 2,
            BundlerError::Cli(CliError::InvalidArguments { .. }) => 2,
            _ => 1,
        }
    }
}
