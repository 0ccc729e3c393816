//! Native executables for windows, linux, and macos.

use super::{Artifact, Target, TargetDescriptor, TargetFactory};
use crate::bundler::{
    builder::checksum,
    coroutine::Co,
    error::{Error, Result},
    runtime::{self, ResolveStub, StubSource},
    settings::{Arch, Configuration, Os},
    task::{AssembleTarget, BuildContext, CopyFiles, Task},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Architecture used when a native descriptor names none.
pub const DEFAULT_ARCH: Arch = Arch::Amd64;

/// Matches `windows`, `linux`, and `macos` descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFactory;

impl TargetFactory for NativeFactory {
    fn create(
        &self,
        descriptor: &TargetDescriptor,
        config: &Configuration,
    ) -> Result<Option<Box<dyn Target>>> {
        let Some(os) = Os::parse(&descriptor.kind) else {
            return Ok(None);
        };

        let arch = match descriptor.arch.as_deref() {
            None => DEFAULT_ARCH,
            Some(name) => Arch::parse(name)
                .filter(|arch| os.supports(*arch))
                .ok_or_else(|| Error::UnsupportedArchitecture {
                    platform: os.to_string(),
                    arch: name.to_string(),
                    supported: os
                        .supported_archs()
                        .iter()
                        .map(|arch| arch.to_string())
                        .collect(),
                })?,
        };

        let output = descriptor
            .output
            .clone()
            .unwrap_or_else(|| Path::new(os.as_str()).join(arch.as_str()));
        let stub = descriptor.stub.as_ref().map(|stub| config.root().join(stub));

        Ok(Some(Box::new(NativeTarget {
            os,
            arch,
            output,
            stub,
        })))
    }
}

/// Self-contained executable for one OS/arch pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTarget {
    pub os: Os,
    pub arch: Arch,
    pub output: PathBuf,
    /// Custom stub; skips edition selection when set.
    pub stub: Option<PathBuf>,
}

impl NativeTarget {
    /// Where the stub comes from for this build.
    pub fn stub_source(&self, config: &Configuration) -> Result<StubSource> {
        match &self.stub {
            Some(path) => Ok(StubSource::Custom(path.clone())),
            None => {
                let required = runtime::required_extensions(config);
                runtime::select_edition(self.os, self.arch, &required).map(StubSource::Edition)
            }
        }
    }
}

#[async_trait(?Send)]
impl Target for NativeTarget {
    fn kind(&self) -> &str {
        self.os.as_str()
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn label(&self) -> String {
        format!("{}/{}", self.os, self.arch)
    }

    fn check(&self, config: &Configuration) -> Result<()> {
        self.stub_source(config).map(|_| ())
    }

    async fn compile(&self, ctx: &BuildContext<'_>, co: &Co) -> Result<Vec<Artifact>> {
        let config = ctx.config;
        let directory = config.output().join(&self.output);

        let libraries = runtime::libraries_for(&config.libraries_directory(), self.os, self.arch)?;
        if !libraries.is_empty() {
            CopyFiles::new(libraries, &directory).run(ctx, co).await?;
        }

        let source = self.stub_source(config)?;
        let stub = ResolveStub {
            os: self.os,
            arch: self.arch,
            source,
        }
        .run(ctx, co)
        .await?;

        let executable = AssembleTarget {
            os: self.os,
            stub,
            archive: config.archive_path(),
            ini: config.ini().clone(),
            directory,
            name: config.name().to_string(),
        }
        .run(ctx, co)
        .await?;

        Ok(vec![checksum::describe_artifact(self.kind(), executable).await?])
    }
}
