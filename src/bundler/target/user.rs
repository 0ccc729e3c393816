//! Registry of user-defined target factories.
//!
//! Embedders register a constructor per target type. When the chain reaches
//! the registry, the constructor for the descriptor's type runs with no
//! arguments and the descriptor is delegated to the factory it returns,
//! together with the untouched configuration object.

use super::{Target, TargetDescriptor, TargetFactory};
use crate::bundler::{
    error::{Error, Result},
    settings::Configuration,
};
use std::collections::HashMap;

/// No-argument constructor for a user-defined factory.
pub type FactoryConstructor = Box<dyn Fn() -> anyhow::Result<Box<dyn TargetFactory>>>;

/// User-defined factories keyed by target type.
#[derive(Default)]
pub struct UserFactories {
    constructors: HashMap<String, FactoryConstructor>,
}

impl UserFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` for `kind`, replacing any earlier one.
    #[must_use]
    pub fn register<F>(mut self, kind: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn TargetFactory>> + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
        self
    }

    /// Returns true when a constructor is registered for `kind`.
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }
}

impl TargetFactory for UserFactories {
    fn create(
        &self,
        descriptor: &TargetDescriptor,
        config: &Configuration,
    ) -> Result<Option<Box<dyn Target>>> {
        let Some(constructor) = self.constructors.get(&descriptor.kind) else {
            return Ok(None);
        };

        let factory = constructor().map_err(|reason| Error::UserFactoryInstantiation {
            kind: descriptor.kind.clone(),
            reason,
        })?;
        factory.create(descriptor, config)
    }
}

impl std::fmt::Debug for UserFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.constructors.keys().collect();
        kinds.sort();
        f.debug_struct("UserFactories").field("kinds", &kinds).finish()
    }
}
