//! Time-indexed, per-antenna pointing lookup.
//!
//! `PointingDirectionCache` sits on top of an `AntennaLevelCache`, which
//! holds one bounded `TimeLevelCache` per antenna. All of them are fed by
//! a single forward cursor over a `PointingSource`.

pub mod antenna_cache;
pub mod config;
pub mod direction_cache;
pub mod entry;
pub mod error;
pub mod record;
pub mod source;
pub mod time_cache;

pub use antenna_cache::AntennaLevelCache;
pub use config::CacheConfig;
pub use direction_cache::{CacheStats, PointingDirectionCache, PointingLookup};
pub use entry::TimeLevelEntry;
pub use error::{PointingCacheError, Result};
pub use record::{PointingRecord, PointingRow, SkyDirection, TimeWindow};
pub use source::{PointingSource, VecPointingSource};
pub use time_cache::{LookupStatus, TimeLevelCache};
