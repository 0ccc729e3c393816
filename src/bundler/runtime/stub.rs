//! Runtime stub resolution.

use super::Edition;
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::{ErrorExt, Result},
    settings::{Arch, Os},
    task::{BuildContext, Download, Task},
    utils::fs,
};
use std::path::PathBuf;

/// Stub file name, `<os>-<arch>.<edition>.stub`.
pub fn stub_filename(os: Os, arch: Arch, edition: Edition) -> String {
    format!("{}-{}.{}.stub", os, arch, edition)
}

/// How the stub for a target is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubSource {
    /// User-supplied stub, used unchanged.
    Custom(PathBuf),
    /// Prebuilt stub of the given edition.
    Edition(Edition),
}

/// Finds the runtime stub for one target and returns its local path.
///
/// Prebuilt stubs are looked up in `<root>/stubs`, then in the user cache.
/// A miss in both downloads the stub into the user cache, so later builds
/// for the same OS, arch, and edition reuse it.
#[derive(Debug, Clone)]
pub struct ResolveStub {
    pub os: Os,
    pub arch: Arch,
    pub source: StubSource,
}

impl Task for ResolveStub {
    type Output = PathBuf;

    async fn run(self, ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
        let target = format!("{}/{}", self.os, self.arch);
        co.notify(
            Step::new(TaskKind::ResolveStub, Phase::Ready, format!("Ready to resolve {target} stub"))
                .arg("os", self.os)
                .arg("arch", self.arch),
        )
        .await;

        let path = match self.source {
            StubSource::Custom(path) => {
                co.info(
                    Step::new(
                        TaskKind::ResolveStub,
                        Phase::Running,
                        format!("Using custom stub {}", path.display()),
                    )
                    .arg("path", path.display())
                    .arg("custom", true),
                )
                .await;
                tokio::fs::metadata(&path)
                    .await
                    .fs_context("reading custom stub", &path)?;
                path
            }
            StubSource::Edition(edition) => {
                let filename = stub_filename(self.os, self.arch, edition);
                let local = ctx.config.local_stub_directory().join(&filename);

                if fs::is_non_empty_file(&local).await {
                    co.info(
                        Step::new(
                            TaskKind::ResolveStub,
                            Phase::Running,
                            format!("Using local stub {}", local.display()),
                        )
                        .arg("path", local.display())
                        .arg("edition", edition),
                    )
                    .await;
                    local
                } else {
                    co.progress(
                        Step::new(
                            TaskKind::ResolveStub,
                            Phase::Running,
                            format!("Fetching {filename}"),
                        )
                        .arg("edition", edition),
                    )
                    .await;
                    let uri = format!("{}/{}", ctx.config.stub_base_uri(), filename);
                    let cached = ctx.config.stub_cache_directory().join(&filename);
                    Download::new(uri, cached).run(ctx, co).await?
                }
            }
        };

        co.notify(
            Step::new(TaskKind::ResolveStub, Phase::Completed, format!("Resolved {target} stub"))
                .arg("path", path.display()),
        )
        .await;
        Ok(path)
    }
}
