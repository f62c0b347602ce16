//! Rate data sources: CSV seeding, the built-in 2025 table, the TCMB
//! bulletin archive and the cache-backed provider combining them.

pub mod loader;
pub mod provider;
pub mod static_rates;
pub mod tcmb;

pub use loader::{MonthlyRateLoader, MonthlyRateLoaderError, MonthlyRateRecord};
pub use provider::{CachedRateProvider, DEFAULT_CACHE_TTL_HOURS};
pub use static_rates::{STATIC_RATE_YEAR, StaticRateProvider, static_series};
pub use tcmb::{OfflineFetcher, TcmbArchive, reference_date};
