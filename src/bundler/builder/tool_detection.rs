//! External tool detection.
//!
//! The bundler tool is itself a PHP archive, so packing needs a PHP
//! interpreter on the build host.

use crate::bundler::{
    error::{Error, Result},
    settings::Configuration,
};
use std::path::PathBuf;

/// Locates the host interpreter used to run the bundler tool.
///
/// A configured `interpreter` must exist; otherwise `php` is looked up on
/// `PATH`.
pub fn find_interpreter(config: &Configuration) -> Result<PathBuf> {
    if let Some(path) = config.interpreter() {
        if path.is_file() {
            log::debug!("Using configured interpreter at: {}", path.display());
            return Ok(path.to_path_buf());
        }
        return Err(Error::ToolNotFound {
            tool: path.display().to_string(),
            hint: "the \"interpreter\" configured in the build file does not exist".into(),
        });
    }

    match which::which("php") {
        Ok(path) => {
            log::debug!("Found php at: {}", path.display());
            Ok(path)
        }
        Err(e) => Err(Error::ToolNotFound {
            tool: "php".into(),
            hint: format!(
                "{}. Install PHP 8.1 or newer, or set \"interpreter\" in the build file",
                e
            ),
        }),
    }
}
