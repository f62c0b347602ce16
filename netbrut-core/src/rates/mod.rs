pub mod factory;
pub mod memory;
pub mod provider;

pub use factory::{CacheConfig, RateCacheFactory, RateCacheRegistry};
pub use memory::{InMemoryCacheFactory, InMemoryRateCache};
pub use provider::{CachedRate, FetchedRate, RateCache, RateError, RateFetcher, RateProvider};
