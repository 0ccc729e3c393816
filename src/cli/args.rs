//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with environment
//! variable fallbacks for the options CI pipelines usually set.

use crate::bundler::settings::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Native executable and archive compiler for PHP applications
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_compile",
    version,
    about = "Compiles PHP applications into native executables",
    long_about = "Packs a PHP application into a PHAR archive and assembles it with prebuilt runtime stubs into standalone executables for each configured OS/arch.

Usage:
  kodegen_bundler_compile init
  kodegen_bundler_compile pack
  kodegen_bundler_compile compile
  kodegen_bundler_compile --root ./app compile --no-pack

Exit code 0 = every configured target was built."
)]
pub struct Args {
    /// Build configuration file, relative to the project root
    #[arg(
        short,
        long,
        global = true,
        env = "KODEGEN_CONFIG",
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Project root (defaults to the current directory)
    #[arg(short, long, global = true, env = "KODEGEN_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Base URL runtime stubs are downloaded from
    #[arg(long, global = true, env = "KODEGEN_STUB_BASE_URL", value_name = "URL")]
    pub stub_base_url: Option<String>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show detail steps such as cache hits
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Build native executables for every configured target
    Compile {
        /// Reuse the existing archive instead of packing first
        #[arg(long)]
        no_pack: bool,
    },
    /// Build the portable archive only
    Pack,
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(url) = &self.stub_base_url {
            let parsed = url::Url::parse(url)
                .map_err(|e| format!("Invalid stub base URL {}: {}", url, e))?;
            if !matches!(parsed.scheme(), "http" | "https" | "file") {
                return Err(format!(
                    "Invalid stub base URL {}: scheme must be http, https, or file",
                    url
                ));
            }
        }

        if self.config.as_os_str().is_empty() {
            return Err("Configuration file path cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}
