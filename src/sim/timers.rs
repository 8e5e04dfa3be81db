//! Deterministic timer scheduler
//!
//! One-shot and repeating timers advanced by the session tick. Each timer
//! carries its own `paused` flag; `set_paused` mirrors the session pause onto
//! every timer so nothing fires while the game is frozen.

use serde::{Deserialize, Serialize};

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Periodic: try to add one brick to the field
    SpawnBrick,
    /// Periodic: drop a special ball
    SpawnSpecialBall,
    /// One-shot: decide between respawn and game over after a lost ball
    ResolveBallDeath,
    /// One-shot: re-enable collisions and relaunch a respawned ball
    RelaunchBall,
}

/// Insertion order, breaks ties between timers due at the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
struct TimerId(u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timer {
    id: TimerId,
    kind: TimerKind,
    remaining_ms: f64,
    /// `Some` for repeating timers
    interval_ms: Option<f64>,
    paused: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    timers: Vec<Timer>,
    next_id: u32,
    paused: bool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `kind` once after `delay_ms`
    pub fn once(&mut self, kind: TimerKind, delay_ms: f64) {
        self.push(kind, delay_ms, None);
    }

    /// Fire `kind` every `interval_ms`, first firing one interval from now
    pub fn every(&mut self, kind: TimerKind, interval_ms: f64) {
        self.push(kind, interval_ms, Some(interval_ms.max(1.0)));
    }

    fn push(&mut self, kind: TimerKind, delay_ms: f64, interval_ms: Option<f64>) {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            kind,
            remaining_ms: delay_ms.max(0.0),
            interval_ms,
            paused: self.paused,
        });
    }

    /// Drop every timer (teardown / restart)
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Mirror the session pause onto every scheduled timer
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        for timer in &mut self.timers {
            timer.paused = paused;
        }
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance all unpaused timers, returning fired kinds in due order
    pub fn advance(&mut self, delta_ms: f64) -> Vec<TimerKind> {
        let mut fired: Vec<(f64, TimerId, TimerKind)> = Vec::new();

        for timer in self.timers.iter_mut().filter(|t| !t.paused) {
            let start = timer.remaining_ms;
            timer.remaining_ms -= delta_ms;
            match timer.interval_ms {
                Some(interval) => {
                    let mut due = start;
                    while timer.remaining_ms <= 0.0 {
                        fired.push((due, timer.id, timer.kind));
                        timer.remaining_ms += interval;
                        due += interval;
                    }
                }
                None => {
                    if timer.remaining_ms <= 0.0 {
                        fired.push((start, timer.id, timer.kind));
                    }
                }
            }
        }

        self.timers
            .retain(|t| t.interval_ms.is_some() || t.remaining_ms > 0.0);

        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, _, kind)| kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut scheduler = Scheduler::new();
        scheduler.once(TimerKind::ResolveBallDeath, 1000.0);
        assert!(scheduler.advance(999.0).is_empty());
        assert_eq!(scheduler.advance(1.0), vec![TimerKind::ResolveBallDeath]);
        assert!(scheduler.advance(5000.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_repeating_timer_keeps_phase() {
        let mut scheduler = Scheduler::new();
        scheduler.every(TimerKind::SpawnBrick, 5000.0);
        assert!(scheduler.advance(4000.0).is_empty());
        assert_eq!(scheduler.advance(1500.0), vec![TimerKind::SpawnBrick]);
        // 500ms already carried over from the previous period
        assert_eq!(scheduler.advance(4500.0), vec![TimerKind::SpawnBrick]);
        assert_eq!(
            scheduler.advance(10000.0),
            vec![TimerKind::SpawnBrick, TimerKind::SpawnBrick]
        );
    }

    #[test]
    fn test_paused_timers_do_not_fire() {
        let mut scheduler = Scheduler::new();
        scheduler.every(TimerKind::SpawnSpecialBall, 100.0);
        scheduler.set_paused(true);
        // Timers added while paused inherit the flag
        scheduler.once(TimerKind::RelaunchBall, 10.0);
        assert!(scheduler.advance(1000.0).is_empty());

        scheduler.set_paused(false);
        assert_eq!(
            scheduler.advance(100.0),
            vec![TimerKind::RelaunchBall, TimerKind::SpawnSpecialBall]
        );
    }

    #[test]
    fn test_clear_drops_every_timer() {
        let mut scheduler = Scheduler::new();
        scheduler.once(TimerKind::RelaunchBall, 10.0);
        scheduler.every(TimerKind::SpawnBrick, 10.0);
        assert!(scheduler.is_pending(TimerKind::SpawnBrick));
        scheduler.clear();
        assert!(scheduler.is_empty());
        assert!(scheduler.advance(100.0).is_empty());
    }
}
