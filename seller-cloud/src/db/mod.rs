//! Database access layer

pub mod archive;
pub mod stats_cache;

pub use archive::{InMemoryArchive, PgSellerArchive, SellerArchive};
pub use stats_cache::{InMemoryStatsCache, PgStatsCache, StatsCache, StatsCacheEntry};
