//! Keeps an auxiliary video element in step with the playback clock.

use crate::error::MediaError;

/// An externally owned playable element: a live camera feed or a file-backed video.
pub trait MediaElement {
    /// Current position in seconds.
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError>;

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&mut self, rate: f64);

    fn is_paused(&self) -> bool;

    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSyncSettings {
    pub enabled: bool,
    pub tolerance_secs: f64,
    pub min_resync_interval_ms: f64,
}

impl Default for VideoSyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            tolerance_secs: 0.15,
            min_resync_interval_ms: 500.0,
        }
    }
}

/// What a single sync pass did to the element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub seeked: bool,
    pub rate_changed: bool,
    pub started: bool,
    pub paused: bool,
}

#[derive(Debug, Clone)]
pub struct VideoSync {
    settings: VideoSyncSettings,
    last_correction_ms: Option<f64>,
}

impl VideoSync {
    pub fn new(settings: VideoSyncSettings) -> Self {
        Self {
            settings,
            last_correction_ms: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
        self.last_correction_ms = None;
    }

    pub fn settings(&self) -> VideoSyncSettings {
        self.settings
    }

    /// One per-frame pass. Failures are logged and retried on a later frame.
    pub fn sync(
        &mut self,
        media: &mut dyn MediaElement,
        elapsed_ms: f64,
        speed: f64,
        playing: bool,
        now_ms: f64,
    ) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.settings.enabled {
            return report;
        }

        if !playing {
            if !media.is_paused() {
                media.pause();
                report.paused = true;
            }
            return report;
        }

        if media.playback_rate() != speed {
            media.set_playback_rate(speed);
            report.rate_changed = true;
        }

        if media.is_paused() {
            match media.play() {
                Ok(()) => report.started = true,
                Err(e) => tracing::warn!(error = %e, "video play failed, retrying next frame"),
            }
        }

        let expected = elapsed_ms / 1000.0;
        let drift = (expected - media.current_time()).abs();
        let interval_ok = self
            .last_correction_ms
            .is_none_or(|last| now_ms - last >= self.settings.min_resync_interval_ms);

        if drift > self.settings.tolerance_secs && interval_ok {
            match media.set_current_time(expected) {
                Ok(()) => {
                    self.last_correction_ms = Some(now_ms);
                    report.seeked = true;
                    tracing::debug!(expected, drift, "video resynced");
                }
                Err(e) => {
                    tracing::warn!(error = %e, expected, "video seek failed, retrying next frame")
                }
            }
        }

        report
    }

    /// Rewinds the element to the start, as the Stop control does.
    pub fn reset(&mut self, media: &mut dyn MediaElement) {
        self.last_correction_ms = None;
        if !self.settings.enabled {
            return;
        }
        media.pause();
        if let Err(e) = media.set_current_time(0.0) {
            tracing::warn!(error = %e, "video reset failed");
        }
    }

    /// Host-side scrub used while sync is disabled.
    pub fn scrub(&self, media: &mut dyn MediaElement, seconds: f64) -> Result<(), MediaError> {
        if self.settings.enabled {
            return Err(MediaError::Rejected(
                "scrubbing is driven by the clock while sync is enabled".to_string(),
            ));
        }
        media.set_current_time(seconds.max(0.0))
    }
}

/// A media element that advances only when told to, for headless runs and tests.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    pub time: f64,
    pub rate: f64,
    pub paused: bool,
    pub ready: bool,
    pub seeks: usize,
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self {
            time: 0.0,
            rate: 1.0,
            paused: true,
            ready: true,
            seeks: 0,
        }
    }
}

impl SimulatedMedia {
    /// Advances the element's own position by `delta_ms` of wall time.
    pub fn advance(&mut self, delta_ms: f64) {
        if !self.paused {
            self.time += delta_ms / 1000.0 * self.rate;
        }
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<(), MediaError> {
        if !self.ready {
            return Err(MediaError::NotReady);
        }
        self.time = seconds;
        self.seeks += 1;
        Ok(())
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if !self.ready {
            return Err(MediaError::NotReady);
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }
}
