//! Frame-driven playback clock.

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; only frame bookkeeping happened.
    Idle,
    Advanced,
    /// Elapsed time hit the total and the clock stopped itself.
    Finished,
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    elapsed_ms: f64,
    total_ms: f64,
    playing: bool,
    speed: f64,
    last_frame_ms: Option<f64>,
}

impl PlaybackClock {
    pub fn new(total_ms: f64) -> Self {
        Self {
            elapsed_ms: 0.0,
            total_ms: total_ms.max(0.0),
            playing: false,
            speed: 1.0,
            last_frame_ms: None,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// True when paused at the origin.
    pub fn is_stopped(&self) -> bool {
        !self.playing && self.elapsed_ms == 0.0
    }

    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        let last = self.last_frame_ms.replace(now_ms);
        if !self.playing {
            return TickOutcome::Idle;
        }
        let Some(last) = last else {
            return TickOutcome::Advanced;
        };

        let delta = (now_ms - last).max(0.0);
        self.elapsed_ms = (self.elapsed_ms + delta * self.speed).clamp(0.0, self.total_ms);

        if self.elapsed_ms >= self.total_ms {
            self.playing = false;
            tracing::debug!(total_ms = self.total_ms, "clock reached end");
            return TickOutcome::Finished;
        }
        TickOutcome::Advanced
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.elapsed_ms = 0.0;
    }

    pub fn seek(&mut self, ms: f64) {
        self.elapsed_ms = ms.clamp(0.0, self.total_ms);
    }

    /// Applies a new total after the segment list changed.
    pub fn set_total(&mut self, total_ms: f64) {
        self.total_ms = total_ms.max(0.0);
        self.elapsed_ms = self.elapsed_ms.clamp(0.0, self.total_ms);
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(EngineError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_speed_advances_then_clamps() {
        let mut clock = PlaybackClock::new(10_000.0);
        clock.set_speed(2.0).unwrap();
        clock.play();

        assert_eq!(clock.tick(0.0), TickOutcome::Advanced);
        assert_eq!(clock.elapsed_ms(), 0.0);

        let mut now = 0.0;
        for step in 1..50 {
            now += 100.0;
            assert_eq!(clock.tick(now), TickOutcome::Advanced);
            assert_eq!(clock.elapsed_ms(), 200.0 * step as f64);
        }

        now += 100.0;
        assert_eq!(clock.tick(now), TickOutcome::Finished);
        assert_eq!(clock.elapsed_ms(), 10_000.0);
        assert!(!clock.is_playing());

        for _ in 0..5 {
            now += 100.0;
            assert_eq!(clock.tick(now), TickOutcome::Idle);
            assert_eq!(clock.elapsed_ms(), 10_000.0);
        }
    }

    #[test]
    fn paused_ticks_keep_timestamps_warm() {
        let mut clock = PlaybackClock::new(5_000.0);
        assert_eq!(clock.tick(1_000.0), TickOutcome::Idle);
        assert_eq!(clock.tick(1_016.0), TickOutcome::Idle);
        assert_eq!(clock.elapsed_ms(), 0.0);

        clock.play();
        clock.tick(1_032.0);
        assert_eq!(clock.elapsed_ms(), 16.0);
    }

    #[test]
    fn speed_change_applies_from_next_tick() {
        let mut clock = PlaybackClock::new(5_000.0);
        clock.play();
        clock.tick(0.0);
        clock.tick(100.0);
        clock.set_speed(0.5).unwrap();
        assert_eq!(clock.elapsed_ms(), 100.0);
        clock.tick(200.0);
        assert_eq!(clock.elapsed_ms(), 150.0);
    }

    #[test]
    fn rejects_non_positive_speed() {
        let mut clock = PlaybackClock::new(1_000.0);
        assert!(clock.set_speed(0.0).is_err());
        assert!(clock.set_speed(-1.0).is_err());
        assert!(clock.set_speed(f64::NAN).is_err());
        assert_eq!(clock.speed(), 1.0);
    }

    #[test]
    fn shrinking_total_reclamps_elapsed() {
        let mut clock = PlaybackClock::new(5_000.0);
        clock.seek(4_000.0);
        clock.set_total(3_000.0);
        assert_eq!(clock.elapsed_ms(), 3_000.0);
        clock.stop();
        assert!(clock.is_stopped());
    }

    #[test]
    fn empty_timeline_finishes_immediately() {
        let mut clock = PlaybackClock::new(0.0);
        clock.play();
        clock.tick(0.0);
        assert_eq!(clock.tick(16.0), TickOutcome::Finished);
        assert_eq!(clock.elapsed_ms(), 0.0);
    }
}
