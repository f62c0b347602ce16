//! SQLite backend for the EUR/TRY rate cache.

mod decimal;
mod factory;
mod repository;

pub use factory::SqliteCacheFactory;
pub use repository::SqliteRateCache;
