//! Idempotent units of build work.
//!
//! Each task is a plain value describing one operation. Running it reports
//! `ready → running → completed` steps through the coroutine handle and
//! returns the task's result. Tasks hold no state between runs; build a new
//! value at every call site.
//!
//! # Module Organization
//!
//! - [`fs`] - directory and file copy tasks
//! - [`download`] - cached downloads
//! - [`permissions`] - executable bits on POSIX targets
//! - [`assemble`] - stub + archive concatenation
//! - [`manifest`] - bundler tool manifest
//! - [`loader_stub`] - loader script generation
//! - [`bundle_tool`] - bundler tool invocation

pub mod assemble;
pub mod bundle_tool;
pub mod download;
pub mod fs;
pub mod loader_stub;
pub mod manifest;
pub mod permissions;

pub use assemble::AssembleTarget;
pub use bundle_tool::InvokeBundler;
pub use download::Download;
pub use fs::{ClearDirectory, CopyFile, CopyFiles, CreateDirectory};
pub use loader_stub::WriteLoaderStub;
pub use manifest::WriteManifest;
pub use permissions::ApplyPermissions;

use crate::bundler::{
    coroutine::Co, error::Result, settings::Configuration, utils::http::Fetch,
};

/// Everything a task may read while running.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    /// Build configuration snapshot.
    pub config: &'a Configuration,
    /// Download source.
    pub fetcher: &'a dyn Fetch,
}

impl std::fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A unit of build work driven inside a coroutine.
#[allow(async_fn_in_trait)]
pub trait Task {
    /// Value produced on success.
    type Output;

    /// Runs the task, reporting progress through `co`.
    async fn run(self, ctx: &BuildContext<'_>, co: &Co) -> Result<Self::Output>;
}
