use async_trait::async_trait;
use netbrut_core::rates::{CacheConfig, RateCache, RateCacheFactory, RateError};

use crate::repository::SqliteRateCache;

/// [`RateCacheFactory`] for SQLite.
///
/// Register this with a [`netbrut_core::rates::RateCacheRegistry`] to make
/// the `"sqlite"` backend available:
///
/// ```rust,no_run
/// use netbrut_core::rates::RateCacheRegistry;
/// use netbrut_db_sqlite::SqliteCacheFactory;
///
/// let mut registry = RateCacheRegistry::with_memory();
/// registry.register(Box::new(SqliteCacheFactory));
/// ```
pub struct SqliteCacheFactory;

#[async_trait]
impl RateCacheFactory for SqliteCacheFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    ///
    /// Accepts a bare file path (created if missing), `":memory:"`, or a
    /// full `sqlite:` URL.
    async fn create(
        &self,
        config: &CacheConfig,
    ) -> Result<Box<dyn RateCache>, RateError> {
        let cache = SqliteRateCache::new(&config.connection_string).await?;
        cache.run_migrations().await?;
        Ok(Box::new(cache))
    }
}
