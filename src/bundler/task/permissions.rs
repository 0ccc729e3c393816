//! Executable bits for POSIX targets.

use super::{BuildContext, Task};
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::Result,
    settings::Os,
};
use std::path::PathBuf;

/// Marks a file as executable (`0o755`) when the target OS is POSIX.
///
/// Windows targets, and hosts without POSIX permissions, skip the change but
/// still report every step.
#[derive(Debug, Clone)]
pub struct ApplyPermissions {
    pub path: PathBuf,
    pub os: Os,
}

impl ApplyPermissions {
    pub fn new(path: impl Into<PathBuf>, os: Os) -> Self {
        Self {
            path: path.into(),
            os,
        }
    }
}

impl Task for ApplyPermissions {
    type Output = ();

    async fn run(self, _ctx: &BuildContext<'_>, co: &Co) -> Result<()> {
        let path = self.path.display().to_string();
        co.notify(
            Step::new(
                TaskKind::ApplyPermissions,
                Phase::Ready,
                format!("Ready to mark {path} executable"),
            )
            .arg("path", &path),
        )
        .await;

        co.progress(
            Step::new(
                TaskKind::ApplyPermissions,
                Phase::Running,
                format!("Marking {path} executable"),
            )
            .arg("path", &path)
            .arg("os", self.os),
        )
        .await;
        if self.os.is_posix() {
            set_executable(&self.path).await?;
        } else {
            log::debug!("Skipping permissions for {} target", self.os);
        }

        co.notify(
            Step::new(
                TaskKind::ApplyPermissions,
                Phase::Completed,
                format!("Marked {path} executable"),
            )
            .arg("path", &path),
        )
        .await;
        Ok(())
    }
}

#[cfg(unix)]
async fn set_executable(path: &std::path::Path) -> Result<()> {
    use crate::bundler::error::ErrorExt;
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .fs_context("setting executable permissions", path)
}

#[cfg(not(unix))]
async fn set_executable(path: &std::path::Path) -> Result<()> {
    log::debug!("Host has no POSIX permissions, leaving {} as is", path.display());
    Ok(())
}
