use crate::pointing::error::{PointingCacheError, Result};
use crate::pointing::record::{PointingRecord, SkyDirection};
use crate::pointing::source::PointingSource;
use bincode::{deserialize, serialize};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MAGIC: &[u8; 8] = b"PTGLOG\x00\x01";
const HEADER_LEN: u64 = 9;
// payload length + crc32, both little-endian u32
const BLOCK_HEADER_LEN: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogCompression {
    None,
    Lz4,
}

impl LogCompression {
    fn flag(self) -> u8 {
        match self {
            LogCompression::None => 0,
            LogCompression::Lz4 => 1,
        }
    }

    fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            0 => Ok(LogCompression::None),
            1 => Ok(LogCompression::Lz4),
            other => Err(PointingCacheError::BadHeader(format!(
                "unknown compression flag {}",
                other
            ))),
        }
    }

    fn encode(self, data: Vec<u8>) -> Vec<u8> {
        match self {
            LogCompression::None => data,
            LogCompression::Lz4 => compress_prepend_size(&data),
        }
    }

    fn decode(self, data: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            LogCompression::None => Ok(data),
            LogCompression::Lz4 => decompress_size_prepended(&data)
                .map_err(|e| PointingCacheError::Decompression(e.to_string())),
        }
    }
}

/// Configuration for writing a pointing log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub path: PathBuf,
    pub compression: LogCompression,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storage/pointing.log"),
            compression: LogCompression::None,
        }
    }
}

/// A row as stored in the log. `rate` is the direction's drift per unit
/// time, applied relative to `time` when a direction is resolved.
///
/// The cache resolves entries at their own `time`, where the drift is
/// zero; `rate` only shows up through direct `pointing_row` reads with a
/// different `target_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub antenna_id: u32,
    pub time: f64,
    pub interval: f64,
    pub direction: Option<SkyDirection>,
    pub rate: Option<SkyDirection>,
}

impl LogRow {
    pub fn new(antenna_id: u32, time: f64, interval: f64, direction: SkyDirection) -> Self {
        Self {
            antenna_id,
            time,
            interval,
            direction: Some(direction),
            rate: None,
        }
    }

    pub fn without_direction(antenna_id: u32, time: f64, interval: f64) -> Self {
        Self {
            antenna_id,
            time,
            interval,
            direction: None,
            rate: None,
        }
    }

    pub fn with_rate(mut self, rate: SkyDirection) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Direction evaluated at `target_time`.
    pub fn direction_at(&self, target_time: f64) -> Option<SkyDirection> {
        let direction = self.direction?;
        Some(match &self.rate {
            Some(rate) => direction.advanced(rate, target_time - self.time),
            None => direction,
        })
    }
}

/// Appends rows to a new pointing log.
pub struct PointingLogWriter {
    writer: BufWriter<File>,
    compression: LogCompression,
    last_times: HashMap<u32, f64>,
    rows: usize,
}

impl PointingLogWriter {
    /// Creates (or truncates) the log file named by `config`.
    pub fn create(config: &LogConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(&config.path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&[config.compression.flag()])?;

        Ok(Self {
            writer,
            compression: config.compression,
            last_times: HashMap::new(),
            rows: 0,
        })
    }

    /// Appends one row and returns its row number. Rows for one antenna
    /// must not go back in time.
    pub fn append(&mut self, row: &LogRow) -> Result<usize> {
        if let Some(&last_time) = self.last_times.get(&row.antenna_id) {
            if row.time < last_time {
                return Err(PointingCacheError::NonMonotonic {
                    antenna: row.antenna_id as usize,
                    time: row.time,
                    last_time,
                });
            }
        }

        let payload = self.compression.encode(serialize(row)?);
        let checksum = crc32fast::hash(&payload);

        self.writer.write_all(&(payload.len() as u32).to_le_bytes())?;
        self.writer.write_all(&checksum.to_le_bytes())?;
        self.writer.write_all(&payload)?;

        self.last_times.insert(row.antenna_id, row.time);
        self.rows += 1;
        Ok(self.rows - 1)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes and syncs the file, returning the number of rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(self.rows)
    }
}

struct LogReader {
    inner: BufReader<File>,
    // Byte offset of `inner`, when known; lets sequential reads skip the seek.
    position: Option<u64>,
}

/// Read side of a pointing log, indexed by row.
///
/// Reads go through an interior `RefCell`, so a `PointingLog` must stay
/// on one thread.
pub struct PointingLog {
    path: PathBuf,
    compression: LogCompression,
    offsets: Vec<u64>,
    reader: RefCell<LogReader>,
}

impl PointingLog {
    /// Opens a log and indexes every complete block. A block cut short at
    /// the end of the file is ignored.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_LEN {
            return Err(PointingCacheError::BadHeader(format!(
                "{} is too short",
                path.display()
            )));
        }

        let mut inner = BufReader::new(file);
        let mut header = [0u8; HEADER_LEN as usize];
        inner.read_exact(&mut header)?;
        if &header[..MAGIC.len()] != MAGIC {
            return Err(PointingCacheError::BadHeader(format!(
                "{} has no pointing log magic",
                path.display()
            )));
        }
        let compression = LogCompression::from_flag(header[MAGIC.len()])?;

        let mut offsets = Vec::new();
        let mut position = HEADER_LEN;
        while position + BLOCK_HEADER_LEN <= file_len {
            let mut block_header = [0u8; BLOCK_HEADER_LEN as usize];
            inner.read_exact(&mut block_header)?;
            let (len, _) = split_block_header(&block_header);

            let end = position + BLOCK_HEADER_LEN + len as u64;
            if end > file_len {
                break;
            }
            offsets.push(position);
            inner.seek_relative(len as i64)?;
            position = end;
        }

        if position != file_len {
            warn!(
                path = %path.display(),
                rows = offsets.len(),
                trailing_bytes = file_len - position,
                "ignoring torn block at end of pointing log"
            );
        }
        debug!(path = %path.display(), rows = offsets.len(), ?compression, "opened pointing log");

        Ok(Self {
            path,
            compression,
            offsets,
            reader: RefCell::new(LogReader {
                inner,
                position: None,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> LogCompression {
        self.compression
    }

    /// Reads and verifies the stored row `row`.
    pub fn read_row(&self, row: usize) -> Result<LogRow> {
        let offset = *self
            .offsets
            .get(row)
            .ok_or(PointingCacheError::RowOutOfRange {
                row,
                n_rows: self.offsets.len(),
            })?;

        let mut reader = self.reader.borrow_mut();
        if reader.position != Some(offset) {
            reader.inner.seek(SeekFrom::Start(offset))?;
        }
        reader.position = None;

        let mut block_header = [0u8; BLOCK_HEADER_LEN as usize];
        reader.inner.read_exact(&mut block_header)?;
        let (len, checksum) = split_block_header(&block_header);

        let mut payload = vec![0u8; len as usize];
        reader.inner.read_exact(&mut payload)?;
        reader.position = Some(offset + BLOCK_HEADER_LEN + len as u64);

        if crc32fast::hash(&payload) != checksum {
            return Err(PointingCacheError::ChecksumMismatch { row });
        }

        Ok(deserialize(&self.compression.decode(payload)?)?)
    }
}

impl PointingSource for PointingLog {
    type Direction = SkyDirection;

    fn n_rows(&self) -> usize {
        self.offsets.len()
    }

    fn pointing_row(
        &self,
        row: usize,
        target_time: f64,
        resolve_direction: bool,
    ) -> Result<PointingRecord<SkyDirection>> {
        let data = self.read_row(row)?;
        let antenna = data.antenna_id as usize;

        let direction = if resolve_direction {
            data.direction_at(target_time)
        } else {
            None
        };

        Ok(match direction {
            Some(direction) => {
                PointingRecord::resolved(antenna, data.time, data.interval, row, direction)
            }
            None => PointingRecord::unresolved(antenna, data.time, data.interval, row),
        })
    }
}

fn split_block_header(header: &[u8; BLOCK_HEADER_LEN as usize]) -> (u32, u32) {
    let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let checksum = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (len, checksum)
}
