//! Error types for configuration, target resolution, and build tasks.

use std::{io, path::PathBuf};
use thiserror::Error as DeriveError;

use crate::bundler::settings::ValidationReport;

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Manual steps that resolve a missing runtime capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    /// One-line description of the remediation path.
    pub summary: String,
    /// Ordered steps the user has to perform.
    pub steps: Vec<String>,
}

/// Errors returned by the compiler.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// The configuration file exists but is not valid JSON.
    #[error("failed to parse configuration file {}: {source}", path.display())]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_json::Error,
    },

    /// The configuration file does not satisfy the configuration schema.
    #[error("invalid configuration file {}:\n{report}", path.display())]
    ConfigValidation {
        /// Path of the configuration file.
        path: PathBuf,
        /// Violations grouped by JSON path.
        report: ValidationReport,
    },

    /// No factory in the chain accepts the target type.
    #[error("unknown target type \"{kind}\"")]
    UnknownTargetType {
        /// Requested target type.
        kind: String,
    },

    /// The architecture is not available for the requested platform.
    #[error(
        "architecture \"{arch}\" is not supported by the {platform} target, expected one of: {}",
        supported.join(", ")
    )]
    UnsupportedArchitecture {
        /// Platform type tag.
        platform: String,
        /// Requested architecture.
        arch: String,
        /// Architectures the platform supports.
        supported: Vec<String>,
    },

    /// A registered user-defined factory could not be constructed.
    #[error("failed to instantiate target factory \"{kind}\": {reason:#}")]
    UserFactoryInstantiation {
        /// Target type the factory is registered under.
        kind: String,
        /// Construction failure.
        reason: anyhow::Error,
    },

    /// No runtime edition provides every required capability.
    #[error(
        "no {platform}/{arch} runtime edition provides the required extensions: {}",
        missing.join(", ")
    )]
    MissingCapabilities {
        /// Platform type tag.
        platform: String,
        /// Target architecture.
        arch: String,
        /// Capabilities no edition provides.
        missing: Vec<String>,
        /// Manual remediation path, when one exists for the platform.
        remediation: Option<Remediation>,
    },

    /// Two targets resolve to the same or nested output directories.
    #[error("targets \"{first}\" and \"{second}\" have overlapping outputs at {}", path.display())]
    DuplicateTargetOutput {
        /// Colliding output subpath.
        path: PathBuf,
        /// Type of the first target.
        first: String,
        /// Type of the second target.
        second: String,
    },

    /// A target's output subpath does not stay inside the output directory.
    #[error(
        "target \"{label}\" has output {}, expected a relative path below the output directory",
        path.display()
    )]
    InvalidTargetOutput {
        /// Label of the offending target.
        label: String,
        /// Output subpath as configured.
        path: PathBuf,
    },

    /// The external bundler tool exited unsuccessfully.
    #[error("bundler tool failed ({}):\n{output}", status.map_or_else(|| "terminated".to_string(), |code| format!("exit code {code}")))]
    BundleToolFailed {
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        /// Captured stdout and stderr.
        output: String,
    },

    /// A required external tool could not be located.
    #[error("{tool} not found: {hint}")]
    ToolNotFound {
        /// Tool name.
        tool: String,
        /// How to make the tool available.
        hint: String,
    },

    /// A download failed after all retry attempts.
    #[error("failed to download {uri}: {reason}")]
    Download {
        /// Requested URI.
        uri: String,
        /// Failure description.
        reason: String,
    },

    /// Filesystem failure with the offending path.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// What was being done.
        context: &'static str,
        /// Offending path.
        path: PathBuf,
        /// Underlying IO error.
        error: io::Error,
    },

    /// Bare IO error.
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Invalid URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

impl Error {
    /// Returns true for errors raised while loading configuration or
    /// resolving targets, before any task executes.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. }
                | Self::ConfigValidation { .. }
                | Self::UnknownTargetType { .. }
                | Self::UnsupportedArchitecture { .. }
                | Self::UserFactoryInstantiation { .. }
                | Self::MissingCapabilities { .. }
                | Self::DuplicateTargetOutput { .. }
                | Self::InvalidTargetOutput { .. }
        )
    }
}

/// Attaches a path and description to IO failures.
pub trait ErrorExt<T> {
    /// Wraps the IO error into [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Returns early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError($msg.into()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
