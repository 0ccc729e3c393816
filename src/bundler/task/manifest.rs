//! Bundler tool manifest (`box.json`).

use super::{BuildContext, Task};
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::{Error, Result},
    settings::{BuildInclusion, Configuration},
    utils::fs,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Renders the manifest the bundler tool compiles the archive from.
///
/// The loader stub is the archive's main script; the configured entrypoint
/// is always included so the loader can hand control to it.
pub fn manifest(config: &Configuration) -> Result<Value> {
    let root = config.root();
    let mut files = vec![Value::String(config.entrypoint().to_string())];
    let mut directories = Vec::new();
    let mut finder = Vec::new();

    for inclusion in config.build() {
        match inclusion {
            BuildInclusion::File(path) => files.push(relative_to(root, path)),
            BuildInclusion::Directory(path) => directories.push(relative_to(root, path)),
            BuildInclusion::Finder(rule) => finder.push(serde_json::to_value(rule)?),
        }
    }

    let timestamp = chrono::DateTime::from_timestamp(config.timestamp(), 0)
        .ok_or_else(|| Error::GenericError(format!("invalid build timestamp {}", config.timestamp())))?;

    Ok(json!({
        "base-path": root.to_string_lossy(),
        "main": relative_to(root, &config.loader_path()),
        "output": config.archive_path().to_string_lossy(),
        "alias": config.archive_filename(),
        "files": files,
        "directories": directories,
        "finder": finder,
        "compression": "GZ",
        "check-requirements": false,
        "dump-autoload": false,
        "stub": true,
        "timestamp": timestamp.to_rfc3339(),
    }))
}

fn relative_to(root: &Path, path: &Path) -> Value {
    let shown = path.strip_prefix(root).unwrap_or(path);
    Value::String(shown.to_string_lossy().replace('\\', "/"))
}

/// Writes the manifest to [`Configuration::manifest_path`].
#[derive(Debug, Clone, Default)]
pub struct WriteManifest;

impl Task for WriteManifest {
    type Output = PathBuf;

    async fn run(self, ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
        let path = ctx.config.manifest_path();
        let shown = path.display().to_string();
        co.notify(
            Step::new(TaskKind::WriteManifest, Phase::Ready, "Ready to write bundler manifest")
                .arg("path", &shown),
        )
        .await;

        co.progress(
            Step::new(TaskKind::WriteManifest, Phase::Running, format!("Writing {shown}"))
                .arg("path", &shown),
        )
        .await;
        let document = manifest(ctx.config)?;
        fs::write_file(&path, serde_json::to_vec_pretty(&document)?).await?;

        co.notify(
            Step::new(TaskKind::WriteManifest, Phase::Completed, format!("Wrote {shown}"))
                .arg("path", &shown),
        )
        .await;
        Ok(path)
    }
}
