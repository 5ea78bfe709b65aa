use super::error::{PointingCacheError, Result};
use super::record::PointingRecord;
use super::source::PointingSource;
use super::time_cache::{LookupStatus, TimeLevelCache};

/// One `TimeLevelCache` per antenna, indexed by antenna id.
#[derive(Debug, Clone)]
pub struct AntennaLevelCache<D> {
    time_caches: Vec<TimeLevelCache<D>>,
}

impl<D: Clone> AntennaLevelCache<D> {
    pub fn new(n_antennas: usize, min_times: usize, max_times: usize) -> Self {
        Self {
            time_caches: (0..n_antennas)
                .map(|antenna| TimeLevelCache::new(antenna, min_times, max_times))
                .collect(),
        }
    }

    pub fn n_antennas(&self) -> usize {
        self.time_caches.len()
    }

    pub fn time_cache(&self, antenna: usize) -> Result<&TimeLevelCache<D>> {
        let n_antennas = self.time_caches.len();
        self.time_caches
            .get(antenna)
            .ok_or(PointingCacheError::AntennaOutOfRange {
                antenna,
                n_antennas,
            })
    }

    fn time_cache_mut(&mut self, antenna: usize) -> Result<&mut TimeLevelCache<D>> {
        let n_antennas = self.time_caches.len();
        self.time_caches
            .get_mut(antenna)
            .ok_or(PointingCacheError::AntennaOutOfRange {
                antenna,
                n_antennas,
            })
    }

    /// Routes the record to its antenna. Returns the number of entries
    /// evicted to make room.
    pub fn add_entry(&mut self, record: PointingRecord<D>) -> Result<usize> {
        self.time_cache_mut(record.antenna_id)?.add_entry(record)
    }

    pub fn get_pointing_direction<S>(
        &mut self,
        antenna: usize,
        time: f64,
        source: &S,
    ) -> Result<(LookupStatus, Option<D>)>
    where
        S: PointingSource<Direction = D> + ?Sized,
    {
        self.time_cache_mut(antenna)?
            .get_pointing_direction(time, source)
    }

    pub fn flush_times(&mut self) {
        for cache in &mut self.time_caches {
            cache.flush();
        }
    }
}
