//! Per-antenna ordered window of pointing samples.

use super::entry::TimeLevelEntry;
use super::error::{PointingCacheError, Result};
use super::record::PointingRecord;
use super::source::PointingSource;
use tracing::{debug, error};

/// Outcome of a time lookup against one antenna's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    /// Some entry's window contains the time.
    Hit,
    /// The time is older than anything cached; the source must be replayed.
    MissPrior,
    /// The time falls in a gap between two adjacent cached entries.
    MissInternal,
    /// The time is newer than anything cached (or nothing is cached yet).
    MissPost,
}

impl LookupStatus {
    pub fn is_hit(&self) -> bool {
        matches!(self, LookupStatus::Hit)
    }
}

/// Bounded, time-ordered sequence of entries for a single antenna.
///
/// When an insertion would grow the sequence past `max_times`, the oldest
/// entries are dropped until `min_times` remain, then the new entry is
/// appended.
#[derive(Debug, Clone)]
pub struct TimeLevelCache<D> {
    antenna: usize,
    entries: Vec<TimeLevelEntry<D>>,
    min_times: usize,
    max_times: usize,
}

impl<D: Clone> TimeLevelCache<D> {
    pub fn new(antenna: usize, min_times: usize, max_times: usize) -> Self {
        Self {
            antenna,
            entries: Vec::new(),
            min_times,
            max_times,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TimeLevelEntry<D>] {
        &self.entries
    }

    /// Appends a record, compacting first if needed. Returns how many
    /// entries were evicted.
    pub fn add_entry(&mut self, record: PointingRecord<D>) -> Result<usize> {
        if let Some(last) = self.entries.last() {
            if record.time < last.time() {
                error!(
                    antenna = self.antenna,
                    time = record.time,
                    last_time = last.time(),
                    row = record.row,
                    "pointing entries not monotonically increasing"
                );
                return Err(PointingCacheError::NonMonotonic {
                    antenna: self.antenna,
                    time: record.time,
                    last_time: last.time(),
                });
            }
        }

        let mut evicted = 0;
        if self.entries.len() + 1 > self.max_times {
            evicted = self.entries.len().saturating_sub(self.min_times);
            self.entries.drain(..evicted);
            debug!(
                antenna = self.antenna,
                evicted,
                retained = self.entries.len(),
                "compacted time-level cache"
            );
        }

        self.entries.push(TimeLevelEntry::new(record));
        Ok(evicted)
    }

    /// Classifies `time` against the cached window. On a hit the index of
    /// the matching entry is returned as well.
    ///
    /// When both the lower-bound entry and its predecessor cover `time`,
    /// the lower-bound entry is chosen.
    pub fn locate(&self, time: f64) -> (LookupStatus, Option<usize>) {
        let last = match self.entries.last() {
            Some(last) => last,
            None => return (LookupStatus::MissPost, None),
        };
        if time > last.window().end() {
            return (LookupStatus::MissPost, None);
        }

        // First entry whose window does not end before `time`.
        let index = self.entries.partition_point(|entry| entry.window().end() < time);
        if index == self.entries.len() {
            return (LookupStatus::MissPost, None);
        }

        if self.entries[index].window().covers(time) {
            return (LookupStatus::Hit, Some(index));
        }
        if index > 0 && self.entries[index - 1].window().covers(time) {
            return (LookupStatus::Hit, Some(index - 1));
        }

        if index == 0 {
            (LookupStatus::MissPrior, None)
        } else {
            (LookupStatus::MissInternal, None)
        }
    }

    /// Looks up `time`, resolving the matching entry's direction through
    /// `source` if it has not been fetched yet. A hit on a row without a
    /// direction comes back as `(Hit, None)`.
    pub fn get_pointing_direction<S>(
        &mut self,
        time: f64,
        source: &S,
    ) -> Result<(LookupStatus, Option<D>)>
    where
        S: PointingSource<Direction = D> + ?Sized,
    {
        match self.locate(time) {
            (LookupStatus::Hit, Some(index)) => {
                let direction = self.entries[index].direction(source)?.cloned();
                Ok((LookupStatus::Hit, direction))
            }
            (status, _) => Ok((status, None)),
        }
    }

    pub fn flush(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointing::record::PointingRow;
    use crate::pointing::source::VecPointingSource;

    fn record(time: f64, interval: f64, row: usize) -> PointingRecord<u32> {
        PointingRecord::unresolved(0, time, interval, row)
    }

    fn cache_with(times: &[f64], min_times: usize, max_times: usize) -> TimeLevelCache<u32> {
        let mut cache = TimeLevelCache::new(0, min_times, max_times);
        for (row, &time) in times.iter().enumerate() {
            cache.add_entry(record(time, 1.0, row)).unwrap();
        }
        cache
    }

    #[test]
    fn test_empty_cache_is_miss_post() {
        let cache: TimeLevelCache<u32> = TimeLevelCache::new(0, 1, 2);
        assert_eq!(cache.locate(5.0), (LookupStatus::MissPost, None));
    }

    #[test]
    fn test_lookup_classification() {
        let cache = cache_with(&[10.0, 20.0, 30.0], 10, 100);

        assert_eq!(cache.locate(9.0), (LookupStatus::Hit, Some(0)));
        assert_eq!(cache.locate(21.0), (LookupStatus::Hit, Some(1)));
        assert_eq!(cache.locate(31.0), (LookupStatus::Hit, Some(2)));
        assert_eq!(cache.locate(5.0).0, LookupStatus::MissPrior);
        assert_eq!(cache.locate(15.0).0, LookupStatus::MissInternal);
        assert_eq!(cache.locate(25.0).0, LookupStatus::MissInternal);
        assert_eq!(cache.locate(31.5).0, LookupStatus::MissPost);
    }

    #[test]
    fn test_overlapping_windows() {
        let mut cache: TimeLevelCache<u32> = TimeLevelCache::new(0, 10, 100);
        cache.add_entry(record(10.0, 10.0, 0)).unwrap();
        cache.add_entry(record(12.0, 1.0, 1)).unwrap();

        assert_eq!(cache.locate(11.5), (LookupStatus::Hit, Some(0)));
        // Past the last entry's window, even though entry 0 reaches to 20.
        assert_eq!(cache.locate(16.0).0, LookupStatus::MissPost);
    }

    #[test]
    fn test_shared_boundary_prefers_lower_bound_entry() {
        let mut cache: TimeLevelCache<u32> = TimeLevelCache::new(0, 10, 100);
        cache.add_entry(record(20.0, 5.0, 0)).unwrap();
        cache.add_entry(record(30.0, 5.0, 1)).unwrap();

        assert_eq!(cache.locate(25.0), (LookupStatus::Hit, Some(0)));
    }

    #[test]
    fn test_non_monotonic_insert_fails() {
        let mut cache = cache_with(&[10.0, 20.0], 10, 100);
        let err = cache.add_entry(record(15.0, 1.0, 2)).unwrap_err();
        assert!(matches!(
            err,
            PointingCacheError::NonMonotonic { antenna: 0, .. }
        ));
        assert_eq!(cache.len(), 2);

        // Equal times are allowed.
        cache.add_entry(record(20.0, 1.0, 3)).unwrap();
    }

    #[test]
    fn test_compaction_keeps_most_recent() {
        let mut cache: TimeLevelCache<u32> = TimeLevelCache::new(0, 2, 4);
        let mut evicted = 0;
        for row in 0..10 {
            evicted += cache.add_entry(record(row as f64 * 10.0, 1.0, row)).unwrap();
            assert!(cache.len() <= 4);
        }

        let times: Vec<f64> = cache.entries().iter().map(|e| e.time()).collect();
        assert_eq!(times, vec![60.0, 70.0, 80.0, 90.0]);
        assert_eq!(evicted, 6);
    }

    #[test]
    fn test_compaction_scenario() {
        let cache = cache_with(&[10.0, 20.0, 30.0], 1, 2);
        let times: Vec<f64> = cache.entries().iter().map(|e| e.time()).collect();
        assert_eq!(times, vec![20.0, 30.0]);

        assert_eq!(cache.locate(25.0).0, LookupStatus::MissInternal);
        assert_eq!(cache.locate(10.0).0, LookupStatus::MissPrior);
    }

    #[test]
    fn test_hit_on_row_without_direction() {
        let source = VecPointingSource::new(vec![PointingRow::<u32>::without_direction(0, 10.0, 1.0)]);
        let mut cache = TimeLevelCache::new(0, 10, 100);
        cache.add_entry(source.pointing_row(0, 0.0, false).unwrap()).unwrap();

        for _ in 0..2 {
            let (status, direction) = cache.get_pointing_direction(10.0, &source).unwrap();
            assert_eq!(status, LookupStatus::Hit);
            assert_eq!(direction, None);
        }
        assert_eq!(source.resolved_reads(), 1);
    }

    #[test]
    fn test_hit_resolves_through_source() {
        let source = VecPointingSource::new(vec![
            PointingRow::new(0, 10.0, 1.0, 100u32),
            PointingRow::new(0, 20.0, 1.0, 200u32),
        ]);
        let mut cache = TimeLevelCache::new(0, 10, 100);
        for row in 0..2 {
            cache.add_entry(source.pointing_row(row, 0.0, false).unwrap()).unwrap();
        }

        let (status, direction) = cache.get_pointing_direction(19.5, &source).unwrap();
        assert_eq!(status, LookupStatus::Hit);
        assert_eq!(direction, Some(200));

        let (status, direction) = cache.get_pointing_direction(15.0, &source).unwrap();
        assert_eq!(status, LookupStatus::MissInternal);
        assert_eq!(direction, None);
        assert_eq!(source.resolved_reads(), 1);
    }
}
