//! Cached downloads.

use super::{BuildContext, Task};
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::{ErrorExt, Result},
    utils::fs,
};
use std::path::PathBuf;

/// Fetches `uri` into `destination` unless a non-empty file is already there.
///
/// The body is written to a `.part` sibling and renamed into place, so an
/// interrupted download never leaves a truncated file that would later count
/// as a cache hit.
#[derive(Debug, Clone)]
pub struct Download {
    pub uri: String,
    pub destination: PathBuf,
}

impl Download {
    pub fn new(uri: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            destination: destination.into(),
        }
    }
}

impl Task for Download {
    type Output = PathBuf;

    async fn run(self, ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
        let destination = self.destination.display().to_string();
        co.notify(
            Step::new(TaskKind::Download, Phase::Ready, format!("Ready to download {}", self.uri))
                .arg("uri", &self.uri)
                .arg("path", &destination),
        )
        .await;

        if fs::is_non_empty_file(&self.destination).await {
            log::debug!("Cache hit for {}", self.destination.display());
            co.info(
                Step::new(TaskKind::Download, Phase::Running, format!("Using cached {destination}"))
                    .arg("path", &destination)
                    .arg("cached", true),
            )
            .await;
        } else {
            co.progress(
                Step::new(TaskKind::Download, Phase::Running, format!("Downloading {}", self.uri))
                    .arg("uri", &self.uri)
                    .arg("path", &destination),
            )
            .await;

            let bytes = ctx.fetcher.fetch(&self.uri).await?;
            let partial = self.destination.with_extension("part");
            fs::write_file(&partial, &bytes).await?;
            tokio::fs::rename(&partial, &self.destination)
                .await
                .fs_context("moving download into place", &self.destination)?;
            log::info!("Downloaded {} ({} bytes)", self.uri, bytes.len());
        }

        co.notify(
            Step::new(TaskKind::Download, Phase::Completed, format!("Downloaded {}", self.uri))
                .arg("uri", &self.uri)
                .arg("path", &destination),
        )
        .await;
        Ok(self.destination)
    }
}
