//! Session wall-clock bookkeeping
//!
//! Times are milliseconds from the host's monotonic clock. The clock never
//! reads time itself, so tests drive it with plain numbers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionClock {
    start_ms: f64,
    total_paused_ms: f64,
    /// Set while a pause is open
    pause_started_ms: Option<f64>,
    jumping: bool,
    jump_duration_ms: f64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the session start and zero every accumulator
    pub fn start(&mut self, now_ms: f64) {
        *self = Self {
            start_ms: now_ms,
            ..Self::default()
        };
    }

    pub fn begin_pause(&mut self, now_ms: f64) {
        if self.pause_started_ms.is_none() {
            self.pause_started_ms = Some(now_ms);
        }
    }

    pub fn end_pause(&mut self, now_ms: f64) {
        if let Some(started) = self.pause_started_ms.take() {
            self.total_paused_ms += (now_ms - started).max(0.0);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_started_ms.is_some()
    }

    pub fn total_paused(&self) -> f64 {
        self.total_paused_ms
    }

    /// Unpaused time since `start`, never negative
    ///
    /// An open pause is excluded up to `now_ms`.
    pub fn elapsed(&self, now_ms: f64) -> f64 {
        let open_pause = self
            .pause_started_ms
            .map(|started| (now_ms - started).max(0.0))
            .unwrap_or(0.0);
        (now_ms - self.start_ms - self.total_paused_ms - open_pause).max(0.0)
    }

    pub fn begin_jump(&mut self) {
        self.jumping = true;
        self.jump_duration_ms = 0.0;
    }

    pub fn add_jump_duration(&mut self, delta_ms: f64) {
        if self.jumping {
            self.jump_duration_ms += delta_ms;
        }
    }

    /// Finish the jump and return how long it lasted
    pub fn end_jump(&mut self) -> f64 {
        self.jumping = false;
        std::mem::take(&mut self.jump_duration_ms)
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn jump_duration(&self) -> f64 {
        self.jump_duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_elapsed_without_pause() {
        let mut clock = SessionClock::new();
        clock.start(1000.0);
        assert_eq!(clock.elapsed(1000.0), 0.0);
        assert_eq!(clock.elapsed(3500.0), 2500.0);
        // Time going backwards never yields a negative duration
        assert_eq!(clock.elapsed(500.0), 0.0);
    }

    #[test]
    fn test_elapsed_excludes_open_and_closed_pauses() {
        let mut clock = SessionClock::new();
        clock.start(0.0);
        clock.begin_pause(1000.0);
        assert_eq!(clock.elapsed(1800.0), 1000.0);
        clock.end_pause(2000.0);
        assert_eq!(clock.elapsed(2500.0), 1500.0);
        clock.begin_pause(3000.0);
        clock.end_pause(4000.0);
        assert_eq!(clock.total_paused(), 2000.0);
        assert_eq!(clock.elapsed(5000.0), 3000.0);
    }

    #[test]
    fn test_unbalanced_pause_calls_are_ignored() {
        let mut clock = SessionClock::new();
        clock.start(0.0);
        clock.end_pause(100.0);
        clock.begin_pause(200.0);
        clock.begin_pause(900.0);
        clock.end_pause(1200.0);
        assert_eq!(clock.total_paused(), 1000.0);
    }

    #[test]
    fn test_jump_timer_only_counts_while_jumping() {
        let mut clock = SessionClock::new();
        clock.add_jump_duration(16.0);
        assert_eq!(clock.jump_duration(), 0.0);

        clock.begin_jump();
        clock.add_jump_duration(16.0);
        clock.add_jump_duration(17.0);
        assert!(clock.is_jumping());
        assert_eq!(clock.end_jump(), 33.0);
        assert!(!clock.is_jumping());
        assert_eq!(clock.jump_duration(), 0.0);
    }

    proptest! {
        #[test]
        fn elapsed_excludes_every_pause(
            cycles in prop::collection::vec((0u32..5_000, 0u32..5_000), 0..12),
            tail in 0u32..5_000,
        ) {
            let mut clock = SessionClock::new();
            clock.start(0.0);
            let mut now = 0.0;
            let mut played = 0.0;
            for (run, pause) in cycles {
                now += run as f64;
                played += run as f64;
                clock.begin_pause(now);
                now += pause as f64;
                clock.end_pause(now);
            }
            now += tail as f64;
            played += tail as f64;
            prop_assert!((clock.elapsed(now) - played).abs() < 1e-6);
        }
    }
}
