//! Command execution functions.
//!
//! Each subcommand loads the configuration, drives the matching workflow,
//! and hands every step to the [`OutputManager`](super::OutputManager).

mod build;
mod init;

pub use build::{compile, load_configuration, pack};
pub use init::{init, starter_configuration};
