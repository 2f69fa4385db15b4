//! Per-interval frame statistics for monitoring a stream.

use std::time::Duration;

use cgt_core::layout::{FrameStats, FrameStatsDelta};

/// One reporting interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSample {
    pub frames: u64,
    pub fps: f64,
    pub delta: FrameStatsDelta,
}

impl StatsSample {
    pub fn mean_total_us(&self) -> u64 {
        self.delta.mean_total_us(self.frames)
    }
}

/// Accumulates the [`FrameStats`] of frames read in an interval.
///
/// Counters in `FrameStats` are cumulative on the producer side, so the
/// interval figures are the difference between the last snapshot of this
/// interval and the last snapshot of the previous one.
#[derive(Debug, Default)]
pub struct StatsTracker {
    previous: Option<FrameStats>,
    latest: Option<FrameStats>,
    frames: u64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, stats: FrameStats) {
        self.latest = Some(stats);
        self.frames += 1;
    }

    /// Closes the current interval of wall-clock length `elapsed`.
    ///
    /// Returns `None` when no frame was observed since the last call.
    pub fn take_interval(&mut self, elapsed: Duration) -> Option<StatsSample> {
        let latest = self.latest.take()?;
        let frames = std::mem::take(&mut self.frames);
        let delta = match &self.previous {
            Some(previous) => latest.delta_since(previous),
            None => latest.delta_since(&FrameStats::default()),
        };
        self.previous = Some(latest);

        let secs = elapsed.as_secs_f64();
        let fps = if secs > 0.0 { frames as f64 / secs } else { 0.0 };
        Some(StatsSample { frames, fps, delta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total_us: u64, attempts: u64, successes: u64) -> FrameStats {
        FrameStats {
            total_us,
            acquire_attempts: attempts,
            acquire_successes: successes,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_interval_yields_nothing() {
        let mut tracker = StatsTracker::new();
        assert!(tracker.take_interval(Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_interval_reports_delta_against_previous_interval() {
        // Arrange
        let mut tracker = StatsTracker::new();
        tracker.observe(stats(100, 10, 10));
        let _ = tracker.take_interval(Duration::from_secs(1));

        // Act
        for i in 1..=30 {
            tracker.observe(stats(100 + i * 10, 10 + i, 10 + i - 1));
        }
        let sample = tracker.take_interval(Duration::from_millis(500)).unwrap();

        // Assert
        assert_eq!(sample.frames, 30);
        assert!((sample.fps - 60.0).abs() < f64::EPSILON);
        assert_eq!(sample.delta.total_us, 300);
        assert_eq!(sample.delta.acquire_attempts, 30);
        assert_eq!(sample.delta.acquire_successes, 29);
        assert_eq!(sample.mean_total_us(), 10);
    }

    #[test]
    fn test_zero_elapsed_gives_zero_fps() {
        let mut tracker = StatsTracker::new();
        tracker.observe(FrameStats::default());
        let sample = tracker.take_interval(Duration::ZERO).unwrap();
        assert_eq!(sample.fps, 0.0);
        assert_eq!(sample.frames, 1);
    }
}
