//! Target factories and the resolution chain.

use super::{ArchiveFactory, NativeFactory, Target, TargetDescriptor, UserFactories};
use crate::bundler::{
    error::{Error, Result},
    settings::Configuration,
};
use std::path::{Component, Path, PathBuf};

/// Turns descriptors of the types it recognizes into targets.
pub trait TargetFactory {
    /// Returns `Ok(None)` when the descriptor's type is not handled here.
    fn create(
        &self,
        descriptor: &TargetDescriptor,
        config: &Configuration,
    ) -> Result<Option<Box<dyn Target>>>;
}

/// Ordered list of factories; the first match wins.
///
/// The default chain is native targets, then archive targets, then
/// user-defined factories, so built-in types can never be shadowed.
pub struct TargetFactoryChain {
    factories: Vec<Box<dyn TargetFactory>>,
}

impl TargetFactoryChain {
    /// Creates a chain from factories in priority order.
    pub fn new(factories: Vec<Box<dyn TargetFactory>>) -> Self {
        Self { factories }
    }

    /// Built-in factories followed by `user`.
    pub fn with_user_factories(user: UserFactories) -> Self {
        Self::new(vec![
            Box::new(NativeFactory),
            Box::new(ArchiveFactory),
            Box::new(user),
        ])
    }

    /// Appends a factory with the lowest priority.
    #[must_use]
    pub fn push(mut self, factory: Box<dyn TargetFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    /// Resolves one descriptor.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownTargetType`] when no factory matches, or the first
    /// error a matching factory raises.
    pub fn resolve(
        &self,
        descriptor: &TargetDescriptor,
        config: &Configuration,
    ) -> Result<Box<dyn Target>> {
        for factory in &self.factories {
            if let Some(target) = factory.create(descriptor, config)? {
                log::debug!("Resolved {} target to {:?}", descriptor.kind, target.output());
                return Ok(target);
            }
        }
        Err(Error::UnknownTargetType {
            kind: descriptor.kind.clone(),
        })
    }

    /// Resolves every descriptor and rejects unsafe or colliding output paths.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTargetOutput`] when an output subpath is absolute,
    /// climbs out with `..`, or names the output directory itself.
    /// [`Error::DuplicateTargetOutput`] when two outputs are equal or one
    /// contains the other, since clearing one would wipe the other.
    pub fn resolve_all(
        &self,
        descriptors: &[TargetDescriptor],
        config: &Configuration,
    ) -> Result<Vec<Box<dyn Target>>> {
        let mut seen: Vec<(PathBuf, String)> = Vec::with_capacity(descriptors.len());
        let mut targets = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let target = self.resolve(descriptor, config)?;
            let output = normalize_output(target.output()).ok_or_else(|| {
                Error::InvalidTargetOutput {
                    label: target.label(),
                    path: target.output().to_path_buf(),
                }
            })?;

            if let Some((_, first)) = seen
                .iter()
                .find(|(other, _)| output.starts_with(other) || other.starts_with(&output))
            {
                return Err(Error::DuplicateTargetOutput {
                    path: output,
                    first: first.clone(),
                    second: target.label(),
                });
            }
            seen.push((output, target.label()));
            targets.push(target);
        }

        Ok(targets)
    }
}

/// Drops `.` segments; `None` for absolute paths, `..` segments or an
/// empty result.
fn normalize_output(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => normalized.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!normalized.as_os_str().is_empty()).then_some(normalized)
}

impl Default for TargetFactoryChain {
    fn default() -> Self {
        Self::with_user_factories(UserFactories::default())
    }
}

impl std::fmt::Debug for TargetFactoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetFactoryChain")
            .field("factories", &self.factories.len())
            .finish()
    }
}
