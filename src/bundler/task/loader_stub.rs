//! Loader script generation.
//!
//! The loader is the archive's main script. At program start it finds the
//! companion libraries shipped next to the executable for the running
//! OS/arch, exposes them through the `KODEGEN_LIBRARIES` constant and the
//! `KODEGEN_LIBRARY_PATH` environment variable, then requires the
//! application entrypoint from inside the archive.

use super::{BuildContext, Task};
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::{Error, Result},
    settings::Configuration,
    utils::fs,
};
use handlebars::Handlebars;
use std::{collections::BTreeMap, path::PathBuf};

const LOADER_TEMPLATE: &str = r#"<?php

declare(strict_types=1);

(static function (): void {
    $os = match (PHP_OS_FAMILY) {
        'Windows' => 'windows',
        'Darwin' => 'macos',
        default => 'linux',
    };
    $arch = match (strtolower(php_uname('m'))) {
        'x86_64', 'amd64' => 'amd64',
        'aarch64', 'arm64' => 'arm64',
        'i386', 'i586', 'i686', 'x86' => 'x86',
        'riscv64' => 'riscv64',
        default => 'arm',
    };
    $extension = ['windows' => 'dll', 'macos' => 'dylib', 'linux' => 'so'][$os];
    $suffix = '-' . $os . '-' . $arch . '.' . $extension;

    $archive = Phar::running(false);
    $directory = $archive === '' ? __DIR__ : dirname($archive);

    $libraries = [];
    foreach (glob($directory . DIRECTORY_SEPARATOR . '*' . $suffix) ?: [] as $library) {
        $libraries[basename($library, $suffix)] = $library;
    }

    define('KODEGEN_LIBRARIES', $libraries);
    putenv('KODEGEN_LIBRARY_PATH=' . $directory);
})();

require 'phar://{{alias}}/{{entrypoint}}';
"#;

/// Renders the loader script for `config`.
pub fn render_loader(config: &Configuration) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut data = BTreeMap::new();
    data.insert("alias", config.archive_filename());
    data.insert(
        "entrypoint",
        config.entrypoint().trim_start_matches(['.', '/']).to_string(),
    );

    handlebars
        .register_template_string("loader.php", LOADER_TEMPLATE)
        .map_err(|e| Error::GenericError(format!("failed to register loader template: {}", e)))?;

    handlebars
        .render("loader.php", &data)
        .map_err(|e| Error::GenericError(format!("failed to render loader template: {}", e)))
}

/// Writes the loader script to [`Configuration::loader_path`].
#[derive(Debug, Clone, Default)]
pub struct WriteLoaderStub;

impl Task for WriteLoaderStub {
    type Output = PathBuf;

    async fn run(self, ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
        let path = ctx.config.loader_path();
        let shown = path.display().to_string();
        co.notify(
            Step::new(TaskKind::WriteLoaderStub, Phase::Ready, "Ready to write loader stub")
                .arg("path", &shown),
        )
        .await;

        co.progress(
            Step::new(TaskKind::WriteLoaderStub, Phase::Running, format!("Writing {shown}"))
                .arg("path", &shown)
                .arg("entrypoint", ctx.config.entrypoint()),
        )
        .await;
        let script = render_loader(ctx.config)?;
        fs::write_file(&path, script).await?;

        co.notify(
            Step::new(TaskKind::WriteLoaderStub, Phase::Completed, format!("Wrote {shown}"))
                .arg("path", &shown),
        )
        .await;
        Ok(path)
    }
}
