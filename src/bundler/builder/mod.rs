//! Compile orchestration and coordination.
//!
//! This module provides the main [`Compiler`] orchestrator that resolves
//! targets and runs the build workflows.
//!
//! # Overview
//!
//! The compiler:
//! 1. Reads the [`Configuration`](crate::bundler::Configuration)
//! 2. Resolves targets through the factory chain and checks them
//! 3. Packs the application archive when requested
//! 4. Builds each target in sequence
//! 5. Returns [`Artifact`](crate::bundler::Artifact) results with checksums
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum calculation for artifacts
//! - [`orchestrator`] - Main [`Compiler`] struct
//! - [`tool_detection`] - Host interpreter lookup
//! - [`workflow`] - Prepare, pack, and per-target recipes

pub mod checksum;
mod orchestrator;
pub mod tool_detection;
pub mod workflow;

pub use orchestrator::{CompileOptions, Compiler};
