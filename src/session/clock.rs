//! Elapsed-time accounting for recording and playback.
//!
//! Recording time is kept as an accumulator of finished segments plus the start
//! of the running segment, so any number of pause/resume cycles adds up without
//! drift. Playback time is never accumulated locally: it is derived from the
//! position reported by the playback device.

use std::time::{Duration, Instant};

/// Active recording time, excluding paused intervals.
#[derive(Debug, Clone, Default)]
pub struct ElapsedClock {
    /// Time from completed record segments
    accumulated: Duration,
    /// When the current segment began, `None` while paused or stopped
    segment_start: Option<Instant>,
}

impl ElapsedClock {
    /// Creates a stopped clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the accumulator and opens the first segment at `now`.
    pub fn start(&mut self, now: Instant) {
        self.accumulated = Duration::ZERO;
        self.segment_start = Some(now);
    }

    /// Folds the running segment into the accumulator and closes it.
    pub fn pause(&mut self, now: Instant) {
        if let Some(started) = self.segment_start.take() {
            self.accumulated += now.saturating_duration_since(started);
        }
    }

    /// Opens a new segment at `now`. A segment that is already running is kept.
    pub fn resume(&mut self, now: Instant) {
        if self.segment_start.is_none() {
            self.segment_start = Some(now);
        }
    }

    /// Finalizes the clock and returns the total in whole seconds.
    ///
    /// The running segment is folded in even when no pause preceded the stop,
    /// then the clock is reset to zero.
    pub fn stop(&mut self, now: Instant) -> u64 {
        self.pause(now);
        let total = self.accumulated.as_secs();
        self.reset();
        total
    }

    /// Clears the accumulator and any running segment.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.segment_start = None;
    }

    /// Total active time as of `now`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .segment_start
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or(Duration::ZERO);
        self.accumulated + running
    }

    /// Total active time as of `now`, floored to whole seconds.
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.elapsed(now).as_secs()
    }

    /// Whether a segment is currently running.
    pub fn is_running(&self) -> bool {
        self.segment_start.is_some()
    }
}

/// Remaining-time display for a loaded track.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    duration: Duration,
}

impl PlaybackClock {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Whole seconds of the track, used as the initial display value.
    pub fn initial_secs(&self) -> u64 {
        self.duration.as_secs()
    }

    /// Remaining whole seconds given the device's reported position.
    pub fn remaining_secs(&self, position: Duration) -> u64 {
        self.duration.saturating_sub(position).as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn test_pause_resume_stop_scenario() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();

        clock.start(t0);
        clock.pause(at(t0, 3));
        assert_eq!(clock.elapsed_secs(at(t0, 4)), 3);

        clock.resume(at(t0, 5));
        assert_eq!(clock.elapsed_secs(at(t0, 7)), 5);

        assert_eq!(clock.stop(at(t0, 9)), 7);
        assert_eq!(clock.elapsed_secs(at(t0, 20)), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_many_cycles_sum_active_time() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);

        // 2s on, 1s off, repeated ten times
        let mut now = 0;
        for _ in 0..10 {
            now += 2;
            clock.pause(at(t0, now));
            now += 1;
            clock.resume(at(t0, now));
        }
        assert_eq!(clock.stop(at(t0, now)), 20);
    }

    #[test]
    fn test_stop_without_pause_folds_running_segment() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        assert_eq!(clock.stop(at(t0, 4)), 4);
    }

    #[test]
    fn test_duplicate_events_do_not_double_count() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        clock.pause(at(t0, 2));
        clock.pause(at(t0, 3));
        clock.resume(at(t0, 4));
        clock.resume(at(t0, 5));
        assert_eq!(clock.stop(at(t0, 6)), 4);
    }

    #[test]
    fn test_elapsed_is_floored() {
        let t0 = Instant::now();
        let mut clock = ElapsedClock::new();
        clock.start(t0);
        assert_eq!(clock.elapsed_secs(t0 + Duration::from_millis(2999)), 2);
    }

    #[test]
    fn test_playback_remaining_never_negative() {
        let clock = PlaybackClock::new(Duration::from_millis(10_400));
        assert_eq!(clock.initial_secs(), 10);
        assert_eq!(clock.remaining_secs(Duration::from_secs(3)), 7);
        assert_eq!(clock.remaining_secs(Duration::from_secs(30)), 0);
    }
}
