use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::memory::InMemoryCacheFactory;
use super::provider::{RateCache, RateError};

/// Backend-agnostic rate cache configuration.
///
/// `backend` must match the [`RateCacheFactory::backend_name`] of a
/// registered factory. `connection_string` is handed to that factory as is.
///
/// | backend  | connection_string examples        |
/// |----------|-----------------------------------|
/// | `memory` | ignored                           |
/// | `sqlite` | `rates.db`, `:memory:`            |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    pub connection_string: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

/// One implementation per cache backend, registered with a
/// [`RateCacheRegistry`] at startup.
#[async_trait]
pub trait RateCacheFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) the store and return a ready-to-use cache.
    async fn create(&self, config: &CacheConfig) -> Result<Box<dyn RateCache>, RateError>;
}

/// Registry of [`RateCacheFactory`] instances, keyed by backend name.
pub struct RateCacheRegistry {
    factories: HashMap<&'static str, Box<dyn RateCacheFactory>>,
}

impl RateCacheRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the `memory` backend already registered.
    pub fn with_memory() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(InMemoryCacheFactory));
        registry
    }

    /// Register a backend factory, replacing any factory of the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RateCacheFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`RateError::Configuration`] if no factory is registered for the
    ///   requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &CacheConfig,
    ) -> Result<Box<dyn RateCache>, RateError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RateError::Configuration(format!(
                    "unknown cache backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RateCacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
