use super::error::{PointingCacheError, Result};
use super::record::{PointingRecord, PointingRow};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Sequential, row-indexed reader over a time-ordered pointing table.
///
/// Rows need not be globally sorted, but the times of any single antenna
/// must be non-decreasing in row order.
pub trait PointingSource {
    type Direction: Clone;

    fn n_rows(&self) -> usize;

    /// Reads one row. With `resolve_direction == false` implementations may
    /// skip producing the direction; `target_time` is the instant the caller
    /// wants the direction evaluated at.
    fn pointing_row(
        &self,
        row: usize,
        target_time: f64,
        resolve_direction: bool,
    ) -> Result<PointingRecord<Self::Direction>>;
}

/// In-memory pointing table. Counts reads so callers can see how much
/// scanning a workload caused.
#[derive(Debug, Default)]
pub struct VecPointingSource<D> {
    rows: Vec<PointingRow<D>>,
    cheap_reads: AtomicUsize,
    resolved_reads: AtomicUsize,
}

impl<D: Clone> VecPointingSource<D> {
    pub fn new(rows: Vec<PointingRow<D>>) -> Self {
        Self {
            rows,
            cheap_reads: AtomicUsize::new(0),
            resolved_reads: AtomicUsize::new(0),
        }
    }

    pub fn rows(&self) -> &[PointingRow<D>] {
        &self.rows
    }

    /// Rows read without direction resolution.
    pub fn cheap_reads(&self) -> usize {
        self.cheap_reads.load(Ordering::Relaxed)
    }

    /// Rows read with direction resolution.
    pub fn resolved_reads(&self) -> usize {
        self.resolved_reads.load(Ordering::Relaxed)
    }

    pub fn total_reads(&self) -> usize {
        self.cheap_reads() + self.resolved_reads()
    }

    pub fn reset_counters(&self) {
        self.cheap_reads.store(0, Ordering::Relaxed);
        self.resolved_reads.store(0, Ordering::Relaxed);
    }
}

impl<D: Clone> PointingSource for VecPointingSource<D> {
    type Direction = D;

    fn n_rows(&self) -> usize {
        self.rows.len()
    }

    fn pointing_row(
        &self,
        row: usize,
        _target_time: f64,
        resolve_direction: bool,
    ) -> Result<PointingRecord<D>> {
        let data = self.rows.get(row).ok_or(PointingCacheError::RowOutOfRange {
            row,
            n_rows: self.rows.len(),
        })?;

        if !resolve_direction {
            self.cheap_reads.fetch_add(1, Ordering::Relaxed);
            return Ok(PointingRecord::unresolved(
                data.antenna_id,
                data.time,
                data.interval,
                row,
            ));
        }

        self.resolved_reads.fetch_add(1, Ordering::Relaxed);
        Ok(match &data.direction {
            Some(direction) => PointingRecord::resolved(
                data.antenna_id,
                data.time,
                data.interval,
                row,
                direction.clone(),
            ),
            None => PointingRecord::unresolved(data.antenna_id, data.time, data.interval, row),
        })
    }
}
