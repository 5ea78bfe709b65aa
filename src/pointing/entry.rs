use super::error::Result;
use super::record::{PointingRecord, TimeWindow};
use super::source::PointingSource;

#[derive(Debug, Clone)]
enum Payload<D> {
    Unresolved,
    Resolved(D),
    // The source row has no direction; remembered so it is read only once.
    Unavailable,
}

/// A single cached pointing sample for one antenna.
///
/// Only timing is kept eagerly; the direction is fetched from the source
/// on first access and memoized, including the case where the row turns
/// out to have none.
#[derive(Debug, Clone)]
pub struct TimeLevelEntry<D> {
    payload: Payload<D>,
    row: usize,
    window: TimeWindow,
}

impl<D: Clone> TimeLevelEntry<D> {
    pub fn new(record: PointingRecord<D>) -> Self {
        let payload = match record.direction {
            Some(direction) if record.valid => Payload::Resolved(direction),
            _ => Payload::Unresolved,
        };
        Self {
            payload,
            row: record.row,
            window: TimeWindow::new(record.time, record.interval),
        }
    }

    // Getters
    pub fn row(&self) -> usize { self.row }
    pub fn time(&self) -> f64 { self.window.time }
    pub fn interval(&self) -> f64 { self.window.interval }
    pub fn window(&self) -> TimeWindow { self.window }
    pub fn is_resolved(&self) -> bool { !matches!(self.payload, Payload::Unresolved) }

    /// Returns the direction, re-reading this entry's row from `source`
    /// the first time it is asked for. `Ok(None)` means the row carries
    /// no direction.
    pub fn direction<S>(&mut self, source: &S) -> Result<Option<&D>>
    where
        S: PointingSource<Direction = D> + ?Sized,
    {
        if let Payload::Unresolved = self.payload {
            let record = source.pointing_row(self.row, self.window.time, true)?;
            self.payload = match record.direction {
                Some(direction) if record.valid => Payload::Resolved(direction),
                _ => Payload::Unavailable,
            };
        }

        Ok(match &self.payload {
            Payload::Resolved(direction) => Some(direction),
            _ => None,
        })
    }
}
