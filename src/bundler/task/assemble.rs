//! Final executable assembly: `stub ‖ [ini block] ‖ archive`.

use super::{ApplyPermissions, BuildContext, Task};
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::{Error, ErrorExt, Result},
    settings::Os,
    utils::fs,
};
use std::{collections::BTreeMap, path::PathBuf};
use tokio::io::AsyncWriteExt;

/// Magic bytes opening the embedded interpreter settings block.
pub const INI_MAGIC: [u8; 4] = [0xFD, 0xF6, 0x69, 0xE6];

/// Encodes interpreter settings as the block the runtime stub reads at start.
///
/// Returns an empty vector when there are no settings.
pub fn ini_block(ini: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    if ini.is_empty() {
        return Ok(Vec::new());
    }

    let text: String = ini
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect();
    let length = u32::try_from(text.len())
        .map_err(|_| Error::GenericError("interpreter settings exceed 4 GiB".into()))?;

    let mut block = Vec::with_capacity(INI_MAGIC.len() + 4 + text.len());
    block.extend_from_slice(&INI_MAGIC);
    block.extend_from_slice(&length.to_be_bytes());
    block.extend_from_slice(text.as_bytes());
    Ok(block)
}

/// Builds the native executable for one target.
///
/// The executable is `<directory>/<name>` plus the OS suffix (`.exe` on
/// Windows). POSIX targets are marked executable afterwards.
#[derive(Debug, Clone)]
pub struct AssembleTarget {
    pub os: Os,
    pub stub: PathBuf,
    pub archive: PathBuf,
    pub ini: BTreeMap<String, String>,
    pub directory: PathBuf,
    pub name: String,
}

impl AssembleTarget {
    /// Path of the executable this task writes.
    pub fn destination(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.name, self.os.executable_suffix()))
    }
}

impl Task for AssembleTarget {
    type Output = PathBuf;

    async fn run(self, ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
        let destination = self.destination();
        let shown = destination.display().to_string();
        co.notify(
            Step::new(TaskKind::AssembleTarget, Phase::Ready, format!("Ready to assemble {shown}"))
                .arg("stub", self.stub.display())
                .arg("archive", self.archive.display())
                .arg("path", &shown),
        )
        .await;

        co.progress(
            Step::new(TaskKind::AssembleTarget, Phase::Running, format!("Assembling {shown}"))
                .arg("path", &shown),
        )
        .await;

        let stub = fs::read_file(&self.stub).await?;
        let ini = ini_block(&self.ini)?;
        let archive = fs::read_file(&self.archive).await?;

        fs::create_dir_all(&self.directory).await?;
        let mut file = tokio::fs::File::create(&destination)
            .await
            .fs_context("creating executable", &destination)?;
        for chunk in [&stub, &ini, &archive] {
            file.write_all(chunk)
                .await
                .fs_context("writing executable", &destination)?;
        }
        file.flush()
            .await
            .fs_context("writing executable", &destination)?;
        drop(file);

        let size = stub.len() + ini.len() + archive.len();
        log::debug!("Assembled {} ({} bytes)", shown, size);

        co.notify(
            Step::new(TaskKind::AssembleTarget, Phase::Completed, format!("Assembled {shown}"))
                .arg("path", &shown)
                .arg("bytes", size),
        )
        .await;

        if self.os.is_posix() {
            ApplyPermissions::new(&destination, self.os).run(ctx, co).await?;
        }

        Ok(destination)
    }
}
