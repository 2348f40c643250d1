//! Performance automation: recorded scroll gestures replayed against the clock.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub offset: f64,
}

impl Keyframe {
    pub fn new(time: f64, offset: f64) -> Self {
        Self { time, offset }
    }
}

/// Keyframes ordered by strictly increasing time. Stored as a plain array;
/// loading replays every keyframe through [`AutomationTrack::push`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct AutomationTrack {
    keyframes: Vec<Keyframe>,
}

impl From<Vec<Keyframe>> for AutomationTrack {
    fn from(keyframes: Vec<Keyframe>) -> Self {
        Self::from_keyframes(keyframes)
    }
}

impl From<AutomationTrack> for Vec<Keyframe> {
    fn from(track: AutomationTrack) -> Self {
        track.keyframes
    }
}

impl AutomationTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a track by pushing each keyframe in order.
    pub fn from_keyframes(keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut track = Self::new();
        for k in keyframes {
            track.push(k);
        }
        track
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.keyframes.last()
    }

    pub fn duration(&self) -> f64 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Appends `k`. A keyframe earlier than the tail drops the suffix from its
    /// time onward; one at the same time as the tail replaces it.
    pub fn push(&mut self, k: Keyframe) {
        if !k.time.is_finite() || !k.offset.is_finite() {
            return;
        }
        if self.keyframes.last().is_some_and(|last| k.time <= last.time) {
            self.truncate_from(k.time);
        }
        self.keyframes.push(k);
    }

    /// Removes every keyframe with `time >= t`.
    pub fn truncate_from(&mut self, t: f64) {
        let keep = self.keyframes.partition_point(|k| k.time < t);
        self.keyframes.truncate(keep);
    }

    /// Scroll offset at `t`, linearly interpolated and clamped to the end keyframes.
    pub fn offset_at(&self, t: f64) -> Option<f64> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;
        if t <= first.time {
            return Some(first.offset);
        }
        if t >= last.time {
            return Some(last.offset);
        }

        let i = self.keyframes.partition_point(|k| k.time <= t);
        let a = self.keyframes[i - 1];
        let b = self.keyframes[i];
        let span = b.time - a.time;
        if span <= 0.0 {
            return Some(b.offset);
        }
        let f = (t - a.time) / span;
        Some(a.offset + (b.offset - a.offset) * f)
    }
}

/// Thresholds governing capture density and retention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    pub min_keyframes: usize,
    pub min_offset_delta_px: f64,
    pub min_time_delta_ms: f64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            min_keyframes: 5,
            min_offset_delta_px: 2.0,
            min_time_delta_ms: 50.0,
        }
    }
}

/// Result of closing a capture session.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Keep(AutomationTrack),
    /// Too few keyframes were captured; nothing should be persisted.
    Discard { captured: usize },
}

/// In-flight recording buffer.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    settings: CaptureSettings,
    start_time: f64,
    track: AutomationTrack,
    captured: usize,
    last_sample: Option<Keyframe>,
}

impl CaptureSession {
    pub fn new(settings: CaptureSettings) -> Self {
        Self::punch_in(settings, AutomationTrack::new(), 0.0)
    }

    /// Starts capturing over `base`, keeping only its keyframes before `start_time`.
    pub fn punch_in(settings: CaptureSettings, mut base: AutomationTrack, start_time: f64) -> Self {
        base.truncate_from(start_time);
        tracing::debug!(
            start_time,
            kept = base.len(),
            "capture session started"
        );
        Self {
            settings,
            start_time,
            track: base,
            captured: 0,
            last_sample: None,
        }
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn captured(&self) -> usize {
        self.captured
    }

    pub fn track(&self) -> &AutomationTrack {
        &self.track
    }

    /// Records a sample, returning whether it was kept.
    pub fn sample(&mut self, time: f64, offset: f64) -> bool {
        if !time.is_finite() || !offset.is_finite() || time < self.start_time {
            return false;
        }
        if let Some(last) = self.last_sample {
            let moved = (offset - last.offset).abs() > self.settings.min_offset_delta_px;
            let waited = time - last.time > self.settings.min_time_delta_ms;
            if !moved && !waited {
                return false;
            }
        }

        let k = Keyframe::new(time, offset);
        let replaces_tail = self
            .last_sample
            .is_some_and(|last| time <= last.time);
        self.track.push(k);
        if !replaces_tail {
            self.captured += 1;
        }
        self.last_sample = Some(k);
        true
    }

    pub fn finish(self) -> CaptureOutcome {
        if self.captured < self.settings.min_keyframes {
            tracing::debug!(
                captured = self.captured,
                required = self.settings.min_keyframes,
                "capture below minimum length, discarding"
            );
            return CaptureOutcome::Discard {
                captured: self.captured,
            };
        }
        CaptureOutcome::Keep(self.track)
    }
}
