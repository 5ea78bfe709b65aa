use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PointingCacheError {
    #[error("entries not monotonically increasing for antenna {antenna}: time {time} after {last_time}")]
    NonMonotonic {
        antenna: usize,
        time: f64,
        last_time: f64,
    },
    #[error("antenna {antenna} out of range (cache built for {n_antennas} antennas)")]
    AntennaOutOfRange { antenna: usize, n_antennas: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("pointing row {row} out of range ({n_rows} rows)")]
    RowOutOfRange { row: usize, n_rows: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Invalid checksum for pointing row {row}")]
    ChecksumMismatch { row: usize },
    #[error("LZ4 decompression error: {0}")]
    Decompression(String),
    #[error("not a pointing log: {0}")]
    BadHeader(String),
}

pub type Result<T> = std::result::Result<T, PointingCacheError>;
