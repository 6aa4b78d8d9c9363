//! Clock utilities for export progress reporting.
//!
//! Every export run is anchored to a monotonic clock epoch recorded when
//! the run starts. Progress callbacks and job records derive their elapsed
//! and remaining-time figures from that single epoch, so wall-clock jumps
//! never distort ETA math.

use std::time::Instant;

/// A clock anchored to the moment an export started.
#[derive(Debug, Clone)]
pub struct ExportClock {
    /// The instant the export started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl ExportClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since the export started.
    pub fn elapsed_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Seconds elapsed since the export started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at export start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Convert milliseconds to seconds.
    pub fn ms_to_secs(ms: f64) -> f64 {
        ms / 1000.0
    }

    /// Convert seconds to milliseconds.
    pub fn secs_to_ms(secs: f64) -> f64 {
        secs * 1000.0
    }
}
