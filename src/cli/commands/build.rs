//! `compile` and `pack` subcommands.

use crate::{
    bundler::{CompileOptions, Compiler, Configuration, Coroutine, load, settings::loader::locate},
    cli::{Args, RuntimeConfig},
    error::{BundlerError, Result},
};

/// Builds the configuration from defaults, CLI flags, and the config file.
///
/// The stub base URL flag is applied last so it wins over the file.
pub fn load_configuration(args: &Args, runtime: &RuntimeConfig) -> Result<Configuration> {
    let base = match &args.root {
        Some(root) => Configuration::rooted_at(root)?,
        None => Configuration::new()?,
    };
    if locate(&args.config, &base).is_none() {
        runtime.output().warn(&format!(
            "No {} found in {}, using defaults",
            args.config.display(),
            base.root().display()
        ))?;
    }

    let config = load(&args.config, base)?;
    Ok(match &args.stub_base_url {
        Some(url) => config.with_stub_base_uri(url.as_str()),
        None => config,
    })
}

/// Drives a workflow to completion, presenting each step.
async fn drive<'a, T: 'a>(mut workflow: Coroutine<'a, T>, runtime: &RuntimeConfig) -> Result<T> {
    while let Some(step) = workflow.next().await {
        runtime.output().step(&step?)?;
    }
    workflow.take_output().ok_or_else(|| {
        BundlerError::Anyhow(anyhow::anyhow!("workflow finished without a result"))
    })
}

/// Runs the compile workflow and prints every artifact.
pub async fn compile(args: &Args, runtime: &RuntimeConfig, pack: bool) -> Result<()> {
    let compiler = Compiler::new(load_configuration(args, runtime)?)?;
    let artifacts = drive(compiler.compile(CompileOptions { pack }), runtime).await?;

    runtime
        .output()
        .success(&format!("Built {} artifact(s)", artifacts.len()))?;
    for artifact in &artifacts {
        runtime.output().artifact(artifact)?;
    }
    Ok(())
}

/// Runs the pack workflow.
pub async fn pack(args: &Args, runtime: &RuntimeConfig) -> Result<()> {
    let compiler = Compiler::new(load_configuration(args, runtime)?)?;
    let archive = drive(compiler.pack(), runtime).await?;

    runtime
        .output()
        .success(&format!("Archive written to {}", archive.display()))?;
    Ok(())
}
