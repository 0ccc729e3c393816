//! Archive-only targets: the packed archive plus companion libraries.

use super::{Artifact, Target, TargetDescriptor, TargetFactory};
use crate::bundler::{
    builder::checksum,
    coroutine::Co,
    error::Result,
    runtime,
    settings::Configuration,
    task::{BuildContext, CopyFile, CopyFiles, Task},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Matches `archive` and `bundle` descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveFactory;

impl TargetFactory for ArchiveFactory {
    fn create(
        &self,
        descriptor: &TargetDescriptor,
        _config: &Configuration,
    ) -> Result<Option<Box<dyn Target>>> {
        if !super::ARCH_INDEPENDENT_KINDS.contains(&descriptor.kind.as_str()) {
            return Ok(None);
        }
        if let Some(arch) = &descriptor.arch {
            log::debug!("Ignoring arch {} for {} target", arch, descriptor.kind);
        }

        let output = descriptor
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&descriptor.kind));

        Ok(Some(Box::new(ArchiveTarget {
            kind: descriptor.kind.clone(),
            output,
        })))
    }
}

/// Copies the already packed archive and every companion library.
///
/// The archive runs on any host with a PHP interpreter, so the libraries
/// for all platforms travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTarget {
    pub kind: String,
    pub output: PathBuf,
}

#[async_trait(?Send)]
impl Target for ArchiveTarget {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn output(&self) -> &Path {
        &self.output
    }

    async fn compile(&self, ctx: &BuildContext<'_>, co: &Co) -> Result<Vec<Artifact>> {
        let config = ctx.config;
        let directory = config.output().join(&self.output);

        let archive = CopyFile::new(
            config.archive_path(),
            directory.join(config.archive_filename()),
        )
        .run(ctx, co)
        .await?;

        let libraries = runtime::all_libraries(&config.libraries_directory())?;
        if !libraries.is_empty() {
            CopyFiles::new(libraries, &directory).run(ctx, co).await?;
        }

        Ok(vec![checksum::describe_artifact(&self.kind, archive).await?])
    }
}
