//! Antenna pointing direction cache over a time-ordered pointing log.

pub mod pointing;
pub mod storage;

pub use pointing::{
    CacheConfig, CacheStats, LookupStatus, PointingCacheError, PointingDirectionCache,
    PointingLookup, PointingRecord, PointingRow, PointingSource, SkyDirection, VecPointingSource,
};
pub use storage::{LogCompression, LogConfig, LogRow, PointingLog, PointingLogWriter};
