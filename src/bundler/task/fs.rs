//! Directory and file copy tasks.

use super::{BuildContext, Task};
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::Result,
    utils::fs,
};
use std::path::PathBuf;

/// Creates a directory and its parents. Existing directories are a no-op.
#[derive(Debug, Clone)]
pub struct CreateDirectory {
    pub path: PathBuf,
}

impl CreateDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Task for CreateDirectory {
    type Output = ();

    async fn run(self, _ctx: &BuildContext<'_>, co: &Co) -> Result<()> {
        let path = self.path.display().to_string();
        co.notify(
            Step::new(TaskKind::CreateDirectory, Phase::Ready, format!("Ready to create {path}"))
                .arg("path", &path),
        )
        .await;

        co.progress(
            Step::new(TaskKind::CreateDirectory, Phase::Running, format!("Creating {path}"))
                .arg("path", &path),
        )
        .await;
        fs::create_dir_all(&self.path).await?;

        co.notify(
            Step::new(TaskKind::CreateDirectory, Phase::Completed, format!("Created {path}"))
                .arg("path", &path),
        )
        .await;
        Ok(())
    }
}

/// Removes a directory and everything in it. Missing directories are a no-op.
#[derive(Debug, Clone)]
pub struct ClearDirectory {
    pub path: PathBuf,
}

impl ClearDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Task for ClearDirectory {
    type Output = ();

    async fn run(self, _ctx: &BuildContext<'_>, co: &Co) -> Result<()> {
        let path = self.path.display().to_string();
        co.notify(
            Step::new(TaskKind::ClearDirectory, Phase::Ready, format!("Ready to clean {path}"))
                .arg("path", &path),
        )
        .await;

        co.progress(
            Step::new(TaskKind::ClearDirectory, Phase::Running, format!("Cleaning {path}"))
                .arg("path", &path),
        )
        .await;
        fs::remove_dir_all(&self.path).await?;

        co.notify(
            Step::new(TaskKind::ClearDirectory, Phase::Completed, format!("Cleaned {path}"))
                .arg("path", &path),
        )
        .await;
        Ok(())
    }
}

/// Copies one file, keeping its permission bits.
#[derive(Debug, Clone)]
pub struct CopyFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl CopyFile {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Task for CopyFile {
    type Output = PathBuf;

    async fn run(self, _ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
        let from = self.from.display().to_string();
        let to = self.to.display().to_string();
        co.notify(
            Step::new(TaskKind::CopyFile, Phase::Ready, format!("Ready to copy {from}"))
                .arg("from", &from)
                .arg("to", &to),
        )
        .await;

        co.progress(
            Step::new(TaskKind::CopyFile, Phase::Running, format!("Copying {from} to {to}"))
                .arg("from", &from)
                .arg("to", &to),
        )
        .await;
        let bytes = fs::copy_file(&self.from, &self.to).await?;

        co.notify(
            Step::new(TaskKind::CopyFile, Phase::Completed, format!("Copied {from}"))
                .arg("to", &to)
                .arg("bytes", bytes),
        )
        .await;
        Ok(self.to)
    }
}

/// Copies several files into one directory, keeping their file names.
#[derive(Debug, Clone)]
pub struct CopyFiles {
    pub files: Vec<PathBuf>,
    pub destination: PathBuf,
}

impl CopyFiles {
    pub fn new(files: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            files,
            destination: destination.into(),
        }
    }
}

impl Task for CopyFiles {
    type Output = Vec<PathBuf>;

    async fn run(self, _ctx: &BuildContext<'_>, co: &Co) -> Result<Vec<PathBuf>> {
        let destination = self.destination.display().to_string();
        co.notify(
            Step::new(
                TaskKind::CopyFiles,
                Phase::Ready,
                format!("Ready to copy {} file(s) to {destination}", self.files.len()),
            )
            .arg("count", self.files.len())
            .arg("to", &destination),
        )
        .await;

        let mut copied = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let Some(name) = file.file_name() else {
                log::warn!("Skipping {} without a file name", file.display());
                continue;
            };
            let target = self.destination.join(name);
            co.progress(
                Step::new(TaskKind::CopyFiles, Phase::Running, format!("Copying {}", file.display()))
                    .arg("from", file.display())
                    .arg("to", target.display()),
            )
            .await;
            fs::copy_file(file, &target).await?;
            copied.push(target);
        }

        co.notify(
            Step::new(
                TaskKind::CopyFiles,
                Phase::Completed,
                format!("Copied {} file(s) to {destination}", copied.len()),
            )
            .arg("count", copied.len())
            .arg("to", &destination),
        )
        .await;
        Ok(copied)
    }
}
