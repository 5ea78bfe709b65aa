//! On-disk pointing log: an append-only file of checksummed row blocks
//! that doubles as a `PointingSource`.

pub mod pointing_log;

pub use pointing_log::{LogCompression, LogConfig, LogRow, PointingLog, PointingLogWriter};
