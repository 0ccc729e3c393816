//! Compiler core: configuration, targets, tasks, and workflows.
//!
//! # Module Organization
//!
//! - [`settings`] - configuration model and file loader
//! - [`target`] - targets and the factory chain
//! - [`runtime`] - runtime edition and stub selection
//! - [`task`] - idempotent build tasks
//! - [`coroutine`] - step-emitting coroutine engine
//! - [`builder`] - [`Compiler`] and workflow recipes
//! - [`utils`] - filesystem and HTTP helpers

pub mod builder;
pub mod coroutine;
pub mod error;
pub mod runtime;
pub mod settings;
pub mod target;
pub mod task;
pub mod utils;

pub use builder::{CompileOptions, Compiler};
pub use coroutine::{Co, Coroutine, Level, Phase, Step, TaskKind};
pub use error::{Error, Remediation, Result};
pub use settings::{Arch, BuildInclusion, Configuration, FinderRule, Os, load};
pub use target::{Artifact, Target, TargetDescriptor, TargetFactory, TargetFactoryChain};
pub use task::BuildContext;
