//! `init` subcommand: writes a starter configuration file.

use crate::{
    bundler::{Arch, Os},
    cli::{Args, RuntimeConfig},
    error::{CliError, Result},
};
use serde_json::{Value, json};
use std::path::Path;

/// Starter configuration for a project rooted at `root`.
///
/// The application is named after the root directory and targets the host
/// OS and architecture.
pub fn starter_configuration(root: &Path) -> Value {
    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "app".to_string());

    json!({
        "name": name,
        "entrypoint": "index.php",
        "platform": [Os::host().as_str()],
        "arch": [Arch::host().as_str()],
        "build": {
            "files": ["index.php"],
            "directories": ["src"],
            "finder": [
                {
                    "directory": "vendor",
                    "not-directory": ["tests", "docs"],
                    "name": "*.php"
                }
            ]
        },
        "ini": {
            "memory_limit": "256M"
        }
    })
}

/// Writes the starter configuration, refusing to overwrite unless `force`.
pub async fn init(args: &Args, runtime: &RuntimeConfig, force: bool) -> Result<()> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let path = root.join(&args.config);

    if path.exists() && !force {
        return Err(CliError::AlreadyExists { path }.into());
    }

    let document = starter_configuration(&root);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, serde_json::to_string_pretty(&document)? + "\n").await?;

    runtime
        .output()
        .success(&format!("Wrote {}", path.display()))?;
    Ok(())
}
