//! Root of the pointing lookup: drives the shared source cursor and turns
//! cache misses into further reads.

use super::antenna_cache::AntennaLevelCache;
use super::config::CacheConfig;
use super::error::{PointingCacheError, Result};
use super::source::PointingSource;
use super::time_cache::LookupStatus;
use serde::Serialize;
use tracing::{debug, trace};

/// Answer to a pointing query.
#[derive(Debug, Clone, PartialEq)]
pub struct PointingLookup<D> {
    /// Always true; a fallback is substituted whenever no data matches.
    pub success: bool,
    pub direction: D,
    /// False when `direction` is the caller's fallback.
    pub from_cache: bool,
}

/// Diagnostic counters. Not used for any decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub fallbacks: u64,
    pub fills: u64,
    pub rewinds: u64,
    pub rows_read: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of queries answered from cached data (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.fallbacks;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Answers "where was antenna A pointing at time T" from a time-ordered
/// pointing source without rescanning it for every query.
///
/// Lookups mutate the cache: a miss may advance the shared row cursor,
/// or flush every antenna and replay the source from row 0.
pub struct PointingDirectionCache<'a, S: PointingSource> {
    source: &'a S,
    antenna_cache: AntennaLevelCache<S::Direction>,
    last_row_read: Option<usize>,
    earliest_time: Vec<Option<f64>>,
    pointing_eof_reached: bool,
    stats: CacheStats,
}

impl<'a, S: PointingSource> PointingDirectionCache<'a, S> {
    pub fn new(config: CacheConfig, source: &'a S) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            source,
            antenna_cache: AntennaLevelCache::new(
                config.n_antennas,
                config.min_times,
                config.max_times,
            ),
            last_row_read: None,
            earliest_time: vec![None; config.n_antennas],
            pointing_eof_reached: false,
            stats: CacheStats::default(),
        })
    }

    pub fn with_defaults(n_antennas: usize, source: &'a S) -> Result<Self> {
        Self::new(CacheConfig::new(n_antennas), source)
    }

    pub fn pointing_source(&self) -> &'a S {
        self.source
    }

    pub fn n_antennas(&self) -> usize {
        self.antenna_cache.n_antennas()
    }

    /// Highest source row consumed so far, `None` before the first read
    /// or right after a rewind.
    pub fn last_row_read(&self) -> Option<usize> {
        self.last_row_read
    }

    pub fn pointing_eof_reached(&self) -> bool {
        self.pointing_eof_reached
    }

    /// Start of the first window ever seen for `antenna`.
    pub fn earliest_time(&self, antenna: usize) -> Result<Option<f64>> {
        self.check_antenna(antenna)?;
        Ok(self.earliest_time[antenna])
    }

    /// Number of entries currently cached for `antenna`.
    pub fn cached_times(&self, antenna: usize) -> Result<usize> {
        Ok(self.antenna_cache.time_cache(antenna)?.len())
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Returns the direction of `antenna` at `time`, or `fallback` when the
    /// source has nothing covering that instant.
    ///
    /// May read from the source and mutate cache state. Errors are only
    /// returned for invariant violations (out-of-range antenna, time going
    /// backwards within an antenna) and source read failures. A matching
    /// row without a direction, or a NaN/infinite `time`, yields the
    /// fallback.
    pub fn get_pointing_direction(
        &mut self,
        antenna: usize,
        time: f64,
        fallback: &S::Direction,
    ) -> Result<PointingLookup<S::Direction>> {
        self.check_antenna(antenna)?;

        if !time.is_finite() {
            debug!(antenna, time, "non-finite query time, using fallback");
            return Ok(self.fallback(fallback));
        }

        if self.no_data_for_antenna(antenna, time) {
            debug!(antenna, time, "no pointing data for antenna, using fallback");
            return Ok(self.fallback(fallback));
        }

        let (status, direction) =
            self.antenna_cache
                .get_pointing_direction(antenna, time, self.source)?;
        trace!(antenna, time, ?status, "pointing lookup");

        match (status, direction) {
            (LookupStatus::Hit, Some(direction)) => Ok(self.hit(direction)),
            (LookupStatus::Hit, None) | (LookupStatus::MissInternal, _) => {
                Ok(self.fallback(fallback))
            }
            (status, _) => {
                self.fill_cache(antenna, time, status == LookupStatus::MissPrior)?;

                let (status, direction) =
                    self.antenna_cache
                        .get_pointing_direction(antenna, time, self.source)?;
                trace!(antenna, time, ?status, "pointing lookup after fill");

                match direction {
                    Some(direction) if status.is_hit() => Ok(self.hit(direction)),
                    _ => Ok(self.fallback(fallback)),
                }
            }
        }
    }

    /// True when the source provably has nothing for `antenna` at `time`:
    /// either `time` precedes the antenna's first window, or the whole
    /// source has been scanned without seeing the antenna at all.
    fn no_data_for_antenna(&self, antenna: usize, time: f64) -> bool {
        match self.earliest_time[antenna] {
            Some(earliest) => time < earliest,
            None => self.pointing_eof_reached,
        }
    }

    /// Reads rows forward until one for `antenna` covers or passes `time`,
    /// or the source is exhausted. With `flush_and_rewind` every antenna's
    /// cache is dropped and reading restarts at row 0.
    fn fill_cache(&mut self, antenna: usize, time: f64, flush_and_rewind: bool) -> Result<()> {
        if flush_and_rewind {
            debug!(antenna, time, "rewinding pointing source");
            self.antenna_cache.flush_times();
            self.last_row_read = None;
            self.stats.rewinds += 1;
        }

        self.stats.fills += 1;
        let n_rows = self.source.n_rows();
        let start = self.last_row_read;

        loop {
            let row = self.last_row_read.map_or(0, |row| row + 1);
            if row >= n_rows {
                self.pointing_eof_reached = true;
                debug!(antenna, time, ?start, n_rows, "reached end of pointing source");
                return Ok(());
            }

            let record = self.source.pointing_row(row, time, false)?;
            let (row_antenna, row_time) = (record.antenna_id, record.time);
            let window = record.window();

            self.stats.evictions += self.antenna_cache.add_entry(record)? as u64;
            self.stats.rows_read += 1;
            self.last_row_read = Some(row);

            let earliest = &mut self.earliest_time[row_antenna];
            if earliest.is_none() {
                *earliest = Some(window.start());
            }

            if row_antenna == antenna && (window.covers(time) || row_time > time) {
                debug!(antenna, time, ?start, stop = row, "filled pointing cache");
                return Ok(());
            }
        }
    }

    fn check_antenna(&self, antenna: usize) -> Result<()> {
        let n_antennas = self.antenna_cache.n_antennas();
        if antenna >= n_antennas {
            return Err(PointingCacheError::AntennaOutOfRange {
                antenna,
                n_antennas,
            });
        }
        Ok(())
    }

    fn hit(&mut self, direction: S::Direction) -> PointingLookup<S::Direction> {
        self.stats.hits += 1;
        PointingLookup {
            success: true,
            direction,
            from_cache: true,
        }
    }

    fn fallback(&mut self, fallback: &S::Direction) -> PointingLookup<S::Direction> {
        self.stats.fallbacks += 1;
        PointingLookup {
            success: true,
            direction: fallback.clone(),
            from_cache: false,
        }
    }
}
