//! Workflow recipes composed from tasks.
//!
//! Each recipe is straight-line async code over a [`Co`] handle; the
//! [`Compiler`](super::Compiler) wraps them into coroutines.

use super::tool_detection::find_interpreter;
use crate::bundler::{
    coroutine::{Co, Phase, Step, TaskKind},
    error::Result,
    target::{Artifact, Target},
    task::{
        BuildContext, ClearDirectory, CreateDirectory, Download, InvokeBundler, Task,
        WriteLoaderStub, WriteManifest,
    },
    utils::fs,
};
use std::path::PathBuf;

/// Creates the output and temp directories and keeps build output out of
/// version control.
pub async fn prepare(ctx: &BuildContext<'_>, co: &Co) -> Result<()> {
    let output = ctx.config.output();
    co.notify(
        Step::new(TaskKind::Prepare, Phase::Ready, "Preparing build directories")
            .arg("output", output.display()),
    )
    .await;

    CreateDirectory::new(&output).run(ctx, co).await?;
    CreateDirectory::new(ctx.config.temp_directory())
        .run(ctx, co)
        .await?;
    fs::write_file(&output.join(".gitignore"), "*\n").await?;

    co.notify(
        Step::new(TaskKind::Prepare, Phase::Completed, "Prepared build directories")
            .arg("output", output.display()),
    )
    .await;
    Ok(())
}

/// Produces the portable archive and returns its path.
pub async fn pack(ctx: &BuildContext<'_>, co: &Co) -> Result<PathBuf> {
    let config = ctx.config;
    let interpreter = find_interpreter(config)?;

    co.notify(
        Step::new(
            TaskKind::Pack,
            Phase::Ready,
            format!("Packing {}", config.archive_filename()),
        )
        .arg("root", config.root().display()),
    )
    .await;

    prepare(ctx, co).await?;
    WriteLoaderStub.run(ctx, co).await?;
    let manifest = WriteManifest.run(ctx, co).await?;
    let tool = Download::new(config.box_uri(), config.box_path())
        .run(ctx, co)
        .await?;
    let archive = InvokeBundler::new(interpreter, tool, manifest)
        .run(ctx, co)
        .await?;

    co.notify(
        Step::new(
            TaskKind::Pack,
            Phase::Completed,
            format!("Packed {}", config.archive_filename()),
        )
        .arg("path", archive.display()),
    )
    .await;
    Ok(archive)
}

/// Builds one target into a freshly cleared directory.
pub async fn build_target(
    ctx: &BuildContext<'_>,
    co: &Co,
    target: &dyn Target,
) -> Result<Vec<Artifact>> {
    let label = target.label();
    let directory = ctx.config.output().join(target.output());
    co.notify(
        Step::new(TaskKind::Target, Phase::Ready, format!("Building {label}"))
            .arg("target", &label)
            .arg("path", directory.display()),
    )
    .await;

    ClearDirectory::new(&directory).run(ctx, co).await?;
    CreateDirectory::new(&directory).run(ctx, co).await?;
    let artifacts = target.compile(ctx, co).await?;

    co.notify(
        Step::new(TaskKind::Target, Phase::Completed, format!("Built {label}"))
            .arg("target", &label)
            .arg("artifacts", artifacts.len()),
    )
    .await;
    Ok(artifacts)
}
