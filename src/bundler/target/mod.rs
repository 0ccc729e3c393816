//! Build targets and the factory chain that resolves them.
//!
//! A [`TargetDescriptor`] is the declarative form of a target. The
//! [`TargetFactoryChain`] turns each descriptor into a [`Target`] by asking
//! its factories in order; the first one that recognizes the type wins.
//!
//! # Module Organization
//!
//! - [`descriptor`] - declarative target descriptions
//! - [`factory`] - factory trait and resolution chain
//! - [`native`] - native executables for windows, linux, and macos
//! - [`archive`] - archive-only targets
//! - [`user`] - registry of user-defined factories

pub mod archive;
pub mod descriptor;
pub mod factory;
pub mod native;
pub mod user;

pub use archive::{ArchiveFactory, ArchiveTarget};
pub use descriptor::TargetDescriptor;
pub use factory::{TargetFactory, TargetFactoryChain};
pub use native::{NativeFactory, NativeTarget};
pub use user::{FactoryConstructor, UserFactories};

use crate::bundler::{
    coroutine::Co,
    error::Result,
    settings::Configuration,
    task::BuildContext,
};
use async_trait::async_trait;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Target types that produce a single output regardless of architecture.
pub const ARCH_INDEPENDENT_KINDS: &[&str] = &["archive", "bundle"];

/// A resolved, buildable target.
///
/// Targets are created once per run by the factory chain and compiled at
/// most once.
#[async_trait(?Send)]
pub trait Target: fmt::Debug {
    /// Type tag the target was resolved from.
    fn kind(&self) -> &str;

    /// Output subpath, relative to the configured output directory.
    fn output(&self) -> &Path;

    /// Label for progress reporting, `<type>` or `<type>/<arch>`.
    fn label(&self) -> String {
        self.kind().to_string()
    }

    /// Checks everything that can fail before any file is written.
    ///
    /// Called for every target before the first one compiles.
    fn check(&self, _config: &Configuration) -> Result<()> {
        Ok(())
    }

    /// Builds the target into `<output>/<self.output()>`.
    ///
    /// The directory exists and is empty when this is called.
    async fn compile(&self, ctx: &BuildContext<'_>, co: &Co) -> Result<Vec<Artifact>>;
}

/// A file produced by a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Type of the target that produced it.
    pub kind: String,
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the contents.
    pub sha256: String,
}
