//! Main compiler orchestration.
//!
//! This module provides the [`Compiler`] that resolves targets and exposes
//! the prepare, pack, and compile workflows as coroutines.

use super::workflow;
use crate::bundler::{
    coroutine::{Coroutine, Phase, Step, TaskKind},
    error::Result,
    settings::Configuration,
    target::{Artifact, Target, TargetFactoryChain},
    task::BuildContext,
    utils::{Fetch, HttpFetcher},
};
use std::{path::PathBuf, sync::Arc};

/// Options for [`Compiler::compile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Produce the archive before building targets.
    pub pack: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { pack: true }
    }
}

/// Main compiler orchestrator.
///
/// Workflows are returned as [`Coroutine`]s: nothing runs until the caller
/// pulls the first step, and dropping the coroutine cancels the rest of the
/// run.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_compile::bundler::{CompileOptions, Compiler, Configuration};
///
/// # async fn example() -> kodegen_bundler_compile::bundler::Result<()> {
/// let compiler = Compiler::new(Configuration::new()?)?;
///
/// let mut run = compiler.compile(CompileOptions::default());
/// while let Some(step) = run.next().await {
///     println!("{}", step?);
/// }
///
/// for artifact in run.take_output().unwrap_or_default() {
///     println!("{} {}", artifact.sha256, artifact.path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Compiler {
    config: Configuration,
    fetcher: Arc<dyn Fetch>,
    factories: TargetFactoryChain,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.config)
            .field("factories", &self.factories)
            .finish_non_exhaustive()
    }
}

impl Compiler {
    /// Creates a compiler with the HTTP fetcher and the default factory chain.
    pub fn new(config: Configuration) -> Result<Self> {
        Ok(Self {
            config,
            fetcher: Arc::new(HttpFetcher::new()?),
            factories: TargetFactoryChain::default(),
        })
    }

    /// Replaces the download source.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replaces the target factory chain.
    #[must_use]
    pub fn with_factories(mut self, factories: TargetFactoryChain) -> Self {
        self.factories = factories;
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    fn context(&self) -> BuildContext<'_> {
        BuildContext {
            config: &self.config,
            fetcher: self.fetcher.as_ref(),
        }
    }

    /// Resolves and checks every configured target.
    ///
    /// Fails before any file is written when a descriptor is unknown, an
    /// architecture is unsupported, two outputs collide, or no runtime
    /// edition provides the required extensions.
    pub fn resolve_targets(&self) -> Result<Vec<Box<dyn Target>>> {
        let descriptors = self.config.target_descriptors();
        let targets = self.factories.resolve_all(&descriptors, &self.config)?;
        for target in &targets {
            target.check(&self.config)?;
        }
        log::info!("Resolved {} target(s)", targets.len());
        Ok(targets)
    }

    /// Creates the output and temp directories.
    pub fn prepare(&self) -> Coroutine<'_, ()> {
        Coroutine::new(move |co| async move {
            let ctx = self.context();
            workflow::prepare(&ctx, &co).await
        })
    }

    /// Produces the portable archive and returns its path.
    pub fn pack(&self) -> Coroutine<'_, PathBuf> {
        Coroutine::new(move |co| async move {
            let ctx = self.context();
            workflow::pack(&ctx, &co).await
        })
    }

    /// Builds every configured target, packing first when requested.
    ///
    /// Targets are resolved and checked before anything runs, then built
    /// one after another. A failing target stops the run; targets built
    /// before it keep their output.
    pub fn compile(&self, options: CompileOptions) -> Coroutine<'_, Vec<Artifact>> {
        Coroutine::new(move |co| async move {
            let targets = self.resolve_targets()?;
            let ctx = self.context();

            co.notify(
                Step::new(
                    TaskKind::Compile,
                    Phase::Ready,
                    format!("Compiling {} target(s)", targets.len()),
                )
                .arg("targets", targets.len())
                .arg("pack", options.pack),
            )
            .await;

            if options.pack {
                co.forward(self.pack()).await?;
            }

            let mut artifacts = Vec::new();
            for target in &targets {
                artifacts.extend(workflow::build_target(&ctx, &co, target.as_ref()).await?);
            }

            co.notify(
                Step::new(
                    TaskKind::Compile,
                    Phase::Completed,
                    format!("Compiled {} target(s)", targets.len()),
                )
                .arg("artifacts", artifacts.len()),
            )
            .await;
            Ok(artifacts)
        })
    }
}
