//! Compiler and packager for PHP applications
//!
//! This library turns a PHP application into:
//! - Self-contained native executables per OS/arch (runtime stub + archive)
//! - A single portable PHAR archive with its companion libraries
//!
//! Build workflows run as coroutines that stream progress steps to any
//! presenter. It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
