//! Bundler tool invocation.

use super::{BuildContext, Task};
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::{Error, Result},
    utils::fs,
};
use std::{path::PathBuf, process::Stdio, time::Duration};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};

/// Upper bound for one bundler run (20 minutes).
pub const BUNDLER_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Runs the bundler tool against the manifest with the host interpreter and
/// returns the archive path.
///
/// Output from both streams is captured and attached to
/// [`Error::BundleToolFailed`] on a non-zero exit or timeout.
#[derive(Debug, Clone)]
pub struct InvokeBundler {
    pub interpreter: PathBuf,
    pub tool: PathBuf,
    pub manifest: PathBuf,
    pub timeout: Duration,
}

impl InvokeBundler {
    pub fn new(
        interpreter: impl Into<PathBuf>,
        tool: impl Into<PathBuf>,
        manifest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            tool: tool.into(),
            manifest: manifest.into(),
            timeout: BUNDLER_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Task for InvokeBundler {
    type Output = PathBuf;

    async fn run(self, ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
        let archive = ctx.config.archive_path();
        co.notify(
            Step::new(TaskKind::InvokeBundler, Phase::Ready, "Ready to build archive")
                .arg("tool", self.tool.display())
                .arg("manifest", self.manifest.display()),
        )
        .await;

        co.progress(
            Step::new(
                TaskKind::InvokeBundler,
                Phase::Running,
                format!("Building {}", ctx.config.archive_filename()),
            )
            .arg("interpreter", self.interpreter.display())
            .arg("output", archive.display()),
        )
        .await;

        // A stale archive would mask a run that writes nothing
        fs::remove_file(&archive).await?;

        let mut child = Command::new(&self.interpreter)
            .arg("-d")
            .arg("phar.readonly=0")
            .arg(&self.tool)
            .arg("compile")
            .arg("--config")
            .arg(&self.manifest)
            .arg("--working-dir")
            .arg(ctx.config.root())
            .arg("--no-interaction")
            .current_dir(ctx.config.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::BundleToolFailed {
                status: None,
                output: format!("failed to start {}: {}", self.interpreter.display(), e),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let run = async {
            // Both streams drain concurrently so neither pipe can fill up and block the tool
            let (mut out, err) = tokio::join!(read_lines(stdout), read_lines(stderr));
            out.extend(err);
            let status = child.wait().await;
            (out, status)
        };

        let outcome = tokio::time::timeout(self.timeout, run).await;
        let (output, status) = match outcome {
            Ok((lines, Ok(status))) => (lines.join("\n"), status),
            Ok((lines, Err(e))) => {
                return Err(Error::BundleToolFailed {
                    status: None,
                    output: format!("{}\nfailed to wait for bundler: {}", lines.join("\n"), e),
                });
            }
            Err(_elapsed) => {
                log::warn!(
                    "Bundler timed out after {} minutes, terminating",
                    self.timeout.as_secs() / 60
                );
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill bundler process: {}", e);
                }
                return Err(Error::BundleToolFailed {
                    status: None,
                    output: format!("bundler timed out after {:?}", self.timeout),
                });
            }
        };

        if !status.success() {
            return Err(Error::BundleToolFailed {
                status: status.code(),
                output,
            });
        }
        log::debug!("Bundler output:\n{}", output);

        if !fs::is_non_empty_file(&archive).await {
            return Err(Error::BundleToolFailed {
                status: status.code(),
                output: format!(
                    "{}\nbundler exited successfully but {} was not written",
                    output,
                    archive.display()
                ),
            });
        }

        co.notify(
            Step::new(
                TaskKind::InvokeBundler,
                Phase::Completed,
                format!("Built {}", ctx.config.archive_filename()),
            )
            .arg("path", archive.display()),
        )
        .await;
        Ok(archive)
    }
}

async fn read_lines<R>(stream: Option<R>) -> Vec<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut captured = Vec::new();
    if let Some(stream) = stream {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            captured.push(line);
        }
    }
    captured
}
