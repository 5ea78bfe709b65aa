use serde::{Deserialize, Serialize};

/// A sky direction in radians. The cache treats it as an opaque payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyDirection {
    pub longitude: f64,
    pub latitude: f64,
}

impl SkyDirection {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Linear extrapolation `self + rate * dt`.
    pub fn advanced(&self, rate: &SkyDirection, dt: f64) -> Self {
        Self {
            longitude: self.longitude + rate.longitude * dt,
            latitude: self.latitude + rate.latitude * dt,
        }
    }
}

/// Closed validity window `[time - interval, time + interval]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub time: f64,
    pub interval: f64,
}

impl TimeWindow {
    pub fn new(time: f64, interval: f64) -> Self {
        Self { time, interval }
    }

    pub fn start(&self) -> f64 {
        self.time - self.interval
    }

    pub fn end(&self) -> f64 {
        self.time + self.interval
    }

    pub fn covers(&self, time: f64) -> bool {
        self.start() <= time && time <= self.end()
    }
}

/// One row of a pointing table as stored by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointingRow<D> {
    pub antenna_id: usize,
    pub time: f64,
    pub interval: f64,
    pub direction: Option<D>,
}

impl<D> PointingRow<D> {
    pub fn new(antenna_id: usize, time: f64, interval: f64, direction: D) -> Self {
        Self {
            antenna_id,
            time,
            interval,
            direction: Some(direction),
        }
    }

    /// A row that carries timing but never resolves to a direction.
    pub fn without_direction(antenna_id: usize, time: f64, interval: f64) -> Self {
        Self {
            antenna_id,
            time,
            interval,
            direction: None,
        }
    }
}

/// What a pointing source hands back for a single row.
///
/// `direction` is only populated when the row was read with direction
/// resolution requested and the source could actually produce one.
#[derive(Debug, Clone, PartialEq)]
pub struct PointingRecord<D> {
    pub antenna_id: usize,
    pub time: f64,
    pub interval: f64,
    pub row: usize,
    pub valid: bool,
    pub direction: Option<D>,
}

impl<D> PointingRecord<D> {
    /// Record read on the cheap path: timing only.
    pub fn unresolved(antenna_id: usize, time: f64, interval: f64, row: usize) -> Self {
        Self {
            antenna_id,
            time,
            interval,
            row,
            valid: false,
            direction: None,
        }
    }

    pub fn resolved(antenna_id: usize, time: f64, interval: f64, row: usize, direction: D) -> Self {
        Self {
            antenna_id,
            time,
            interval,
            row,
            valid: true,
            direction: Some(direction),
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.time, self.interval)
    }
}
