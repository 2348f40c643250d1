//! Session coordinator: the single owner of mode state.
//!
//! A [`Session`] decides which subsystem has write authority over elapsed
//! time and scroll position on every frame:
//!
//! - `Manual`: the clock drives scroll (autoplay) until the user scrolls,
//!   after which scroll drives time until the next [`Session::play`].
//! - `Recording`: the clock runs and the performer's scroll is captured.
//! - `Playback`: the clock runs and a recorded track drives scroll.

use std::fmt;

use crate::{
    automation::{AutomationTrack, CaptureOutcome, CaptureSession, CaptureSettings},
    clock::{PlaybackClock, TickOutcome},
    error::{EngineError, Result},
    layout::LayoutQuery,
    model::{Script, Segment},
    reconcile::{Reconciler, ScrollBehavior, ScrollCommand},
    store::TrackStore,
    timeline::{Lookup, Timeline, build_timeline},
    video::{MediaElement, SyncReport, VideoSync, VideoSyncSettings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Manual,
    Recording,
    Playback,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Manual => "manual",
            Mode::Recording => "recording",
            Mode::Playback => "playback",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

enum ModeState {
    /// `scroll_override` suppresses time-to-scroll writes after a user scroll.
    Manual { scroll_override: bool },
    Recording(CaptureSession),
    Playback(AutomationTrack),
}

impl ModeState {
    fn mode(&self) -> Mode {
        match self {
            ModeState::Manual { .. } => Mode::Manual,
            ModeState::Recording(_) => Mode::Recording,
            ModeState::Playback(_) => Mode::Playback,
        }
    }
}

/// Notable things that happened during a call, for the host to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Finished,
    RecordingSaved { keyframes: usize },
    RecordingDiscarded { captured: usize },
    AutomationEnded,
    /// A user scroll took control away from the clock.
    ManualTakeover,
}

/// Output of one [`Session::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub elapsed_ms: f64,
    pub playing: bool,
    pub mode: Mode,
    pub active: Lookup,
    pub scroll: Option<ScrollCommand>,
    pub video: SyncReport,
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub speed: f64,
    pub focal_position: f64,
    pub end_tolerance_px: f64,
    pub capture: CaptureSettings,
    pub video: VideoSyncSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            focal_position: 0.5,
            end_tolerance_px: 2.0,
            capture: CaptureSettings::default(),
            video: VideoSyncSettings::default(),
        }
    }
}

pub struct Session {
    script_id: String,
    segments: Vec<Segment>,
    timeline: Timeline,
    clock: PlaybackClock,
    reconciler: Reconciler,
    capture: CaptureSettings,
    video: VideoSync,
    tracks: TrackStore,
    mode: ModeState,
    pending_scroll: Option<ScrollBehavior>,
}

impl Session {
    pub fn new(script: Script, settings: SessionSettings, tracks: TrackStore) -> Result<Self> {
        let timeline = build_timeline(&script.segments);
        let mut clock = PlaybackClock::new(timeline.total());
        clock.set_speed(settings.speed)?;
        let reconciler = Reconciler::new(settings.focal_position, settings.end_tolerance_px)?;

        tracing::info!(
            script_id = script.id.as_str(),
            segments = script.segments.len(),
            total_ms = timeline.total(),
            "session created"
        );

        Ok(Self {
            script_id: script.id,
            segments: script.segments,
            timeline,
            clock,
            reconciler,
            capture: settings.capture,
            video: VideoSync::new(settings.video),
            tracks,
            mode: ModeState::Manual {
                scroll_override: false,
            },
            pending_scroll: Some(ScrollBehavior::Instant),
        })
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms()
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn speed(&self) -> f64 {
        self.clock.speed()
    }

    pub fn is_scroll_overridden(&self) -> bool {
        matches!(
            self.mode,
            ModeState::Manual {
                scroll_override: true
            }
        )
    }

    pub fn active_segment(&self) -> Lookup {
        self.timeline.segment_at(self.clock.elapsed_ms())
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    pub fn has_automation_track(&self) -> Result<bool> {
        Ok(self
            .tracks
            .load(&self.script_id)?
            .is_some_and(|t| !t.is_empty()))
    }

    pub fn delete_automation_track(&mut self) -> Result<()> {
        self.tracks.delete(&self.script_id)?;
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        self.clock.set_speed(speed)
    }

    pub fn set_focal_position(&mut self, focal: f64) -> Result<()> {
        self.reconciler.set_focal_position(focal)
    }

    pub fn set_video_sync(&mut self, enabled: bool) {
        self.video.set_enabled(enabled);
    }

    pub fn video_sync_enabled(&self) -> bool {
        self.video.is_enabled()
    }

    /// Replaces the whole segment list. Any automation session is ended
    /// because its keyframes refer to the old layout.
    pub fn replace_segments(&mut self, segments: Vec<Segment>) {
        match self.mode {
            ModeState::Recording(_) => {
                tracing::info!("segments replaced mid-recording, capture aborted");
                self.enter_manual();
            }
            ModeState::Playback(_) => {
                self.enter_manual();
            }
            ModeState::Manual { .. } => {}
        }
        self.timeline = build_timeline(&segments);
        self.segments = segments;
        self.clock.set_total(self.timeline.total());
        self.pending_scroll = Some(ScrollBehavior::Instant);
    }

    /// Starts or resumes autoplay. After a manual scroll the elapsed time is
    /// first resynchronized from `scroll_top`.
    pub fn play(&mut self, scroll_top: f64, layout: &dyn LayoutQuery) -> Result<()> {
        self.require_manual("play")?;

        if self.is_scroll_overridden() {
            let t = self
                .reconciler
                .scroll_to_time(&self.timeline, layout, scroll_top);
            self.clock.seek(t);
            self.mode = ModeState::Manual {
                scroll_override: false,
            };
            tracing::debug!(elapsed_ms = t, "resynced from scroll before resuming");
        }

        if self.clock.elapsed_ms() >= self.clock.total_ms() {
            self.clock.seek(0.0);
        }
        if self.clock.elapsed_ms() == 0.0 {
            self.pending_scroll = Some(ScrollBehavior::Smooth);
        }
        self.clock.play();
        tracing::info!(elapsed_ms = self.clock.elapsed_ms(), "autoplay started");
        Ok(())
    }

    /// Pauses autoplay, or ends the automation session in Recording/Playback.
    pub fn pause(&mut self) -> Result<Vec<SessionEvent>> {
        match self.mode {
            ModeState::Manual { .. } => {
                self.clock.pause();
                Ok(Vec::new())
            }
            _ => self.exit_to_manual(),
        }
    }

    /// The Play/Pause control. Automation sessions span one play-through,
    /// so in Recording or Playback this ends the session instead.
    pub fn toggle_play(
        &mut self,
        scroll_top: f64,
        layout: &dyn LayoutQuery,
    ) -> Result<Vec<SessionEvent>> {
        match self.mode {
            ModeState::Manual { .. } if self.clock.is_playing() => self.pause(),
            ModeState::Manual { .. } => {
                self.play(scroll_top, layout)?;
                Ok(Vec::new())
            }
            _ => self.exit_to_manual(),
        }
    }

    /// The Stop control: ends any session and rewinds to the start.
    pub fn stop(&mut self, media: Option<&mut dyn MediaElement>) -> Result<Vec<SessionEvent>> {
        let result = self.exit_to_manual();
        self.clock.stop();
        self.pending_scroll = Some(ScrollBehavior::Instant);
        if let Some(media) = media {
            self.video.reset(media);
        }
        tracing::info!("playback stopped");
        result
    }

    /// Moves the playhead while in Manual mode.
    pub fn seek(&mut self, ms: f64) -> Result<()> {
        self.require_manual("seek")?;
        self.mode = ModeState::Manual {
            scroll_override: false,
        };
        self.clock.seek(ms);
        self.pending_scroll = Some(ScrollBehavior::Smooth);
        Ok(())
    }

    /// Begins a fresh recording from the start of the script.
    pub fn start_recording(&mut self) -> Result<()> {
        self.require_manual("start recording")?;
        self.clock.stop();
        self.clock.play();
        self.mode = ModeState::Recording(CaptureSession::new(self.capture));
        tracing::info!(script_id = self.script_id.as_str(), "recording started");
        Ok(())
    }

    /// Records over the stored track from the current position onward,
    /// keeping everything before it.
    pub fn punch_in(&mut self) -> Result<()> {
        self.require_manual("punch in")?;
        if self.clock.elapsed_ms() >= self.clock.total_ms() {
            self.clock.seek(0.0);
        }
        let base = self.tracks.load(&self.script_id)?.unwrap_or_default();
        let start = self.clock.elapsed_ms();
        self.mode = ModeState::Recording(CaptureSession::punch_in(self.capture, base, start));
        self.clock.play();
        tracing::info!(
            script_id = self.script_id.as_str(),
            start_ms = start,
            "punch-in recording started"
        );
        Ok(())
    }

    /// Discards an in-flight recording without touching the stored track.
    pub fn abort_recording(&mut self) -> bool {
        if !matches!(self.mode, ModeState::Recording(_)) {
            return false;
        }
        self.enter_manual();
        tracing::info!("recording aborted");
        true
    }

    /// Replays the stored track from the start of the script.
    pub fn start_automation(&mut self) -> Result<()> {
        self.require_manual("start automation playback")?;
        let track = self
            .tracks
            .load(&self.script_id)?
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EngineError::NoAutomationTrack {
                script_id: self.script_id.clone(),
            })?;

        tracing::info!(
            script_id = self.script_id.as_str(),
            keyframes = track.len(),
            "automation playback started"
        );
        self.mode = ModeState::Playback(track);
        self.clock.stop();
        self.clock.play();
        Ok(())
    }

    /// Handles a user scroll, touch or wheel gesture that left the container at `scroll_top`.
    pub fn on_user_scroll(&mut self, scroll_top: f64, layout: &dyn LayoutQuery) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let ModeState::Recording(capture) = &mut self.mode {
            capture.sample(self.clock.elapsed_ms(), scroll_top);
            return events;
        }

        let was_playing = self.clock.is_playing();
        if matches!(self.mode, ModeState::Playback(_)) {
            self.enter_manual();
            tracing::info!("automation playback interrupted by user scroll");
            events.push(SessionEvent::AutomationEnded);
        }

        if was_playing {
            events.push(SessionEvent::ManualTakeover);
        }
        self.clock.pause();
        self.mode = ModeState::Manual {
            scroll_override: true,
        };
        self.pending_scroll = None;

        let t = self
            .reconciler
            .scroll_to_time(&self.timeline, layout, scroll_top);
        self.clock.seek(t);
        events
    }

    /// Drives one frame. `scroll_top` is the container's current offset.
    pub fn tick(
        &mut self,
        now_ms: f64,
        scroll_top: f64,
        layout: &dyn LayoutQuery,
        media: Option<&mut dyn MediaElement>,
    ) -> Result<Frame> {
        let outcome = self.clock.tick(now_ms);
        let advancing = self.clock.is_playing() || outcome == TickOutcome::Finished;
        let elapsed = self.clock.elapsed_ms();
        let mut events = Vec::new();

        let scroll = match &mut self.mode {
            ModeState::Recording(capture) => {
                if advancing {
                    capture.sample(elapsed, scroll_top);
                }
                None
            }
            ModeState::Playback(track) if advancing => track.offset_at(elapsed).map(|offset| {
                ScrollCommand {
                    offset,
                    behavior: ScrollBehavior::Instant,
                }
            }),
            ModeState::Playback(_) => None,
            ModeState::Manual {
                scroll_override: false,
            } if advancing || self.pending_scroll.is_some() => {
                let behavior = self.pending_scroll.take().unwrap_or(ScrollBehavior::Instant);
                self.reconciler
                    .time_to_scroll(&self.timeline, layout, elapsed)
                    .map(|offset| ScrollCommand { offset, behavior })
            }
            ModeState::Manual { .. } => None,
        };

        if outcome == TickOutcome::Finished {
            events.push(SessionEvent::Finished);
            events.extend(self.exit_to_manual()?);
        }

        let video = match media {
            Some(media) => self.video.sync(
                media,
                self.clock.elapsed_ms(),
                self.clock.speed(),
                self.clock.is_playing(),
                now_ms,
            ),
            None => SyncReport::default(),
        };

        Ok(Frame {
            elapsed_ms: self.clock.elapsed_ms(),
            playing: self.clock.is_playing(),
            mode: self.mode(),
            active: self.active_segment(),
            scroll,
            video,
            events,
        })
    }

    fn require_manual(&self, action: &'static str) -> Result<()> {
        match self.mode {
            ModeState::Manual { .. } => Ok(()),
            _ => Err(EngineError::InvalidTransition {
                action,
                mode: self.mode().to_string(),
            }),
        }
    }

    fn enter_manual(&mut self) -> ModeState {
        self.clock.pause();
        std::mem::replace(
            &mut self.mode,
            ModeState::Manual {
                scroll_override: false,
            },
        )
    }

    /// Leaves Recording or Playback, persisting a capture that is long enough.
    fn exit_to_manual(&mut self) -> Result<Vec<SessionEvent>> {
        let previous = self.enter_manual();
        let mut events = Vec::new();

        match previous {
            ModeState::Recording(capture) => match capture.finish() {
                CaptureOutcome::Keep(track) => {
                    self.tracks.save(&self.script_id, &track)?;
                    events.push(SessionEvent::RecordingSaved {
                        keyframes: track.len(),
                    });
                }
                CaptureOutcome::Discard { captured } => {
                    tracing::info!(captured, "recording too short, discarded");
                    events.push(SessionEvent::RecordingDiscarded { captured });
                }
            },
            ModeState::Playback(_) => {
                tracing::info!(elapsed_ms = self.clock.elapsed_ms(), "automation playback ended");
                events.push(SessionEvent::AutomationEnded);
            }
            ModeState::Manual { .. } => {}
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layout::StackLayout, model::Word};

    fn session() -> (Session, StackLayout) {
        let script = Script {
            id: "script-1".to_string(),
            title: None,
            segments: vec![
                Segment::new("a", vec![Word::plain("a")], 2000),
                Segment::new("b", vec![Word::plain("b")], 3000),
            ],
        };
        let layout = StackLayout::from_heights(&[100.0, 100.0], 0.0, 400.0, 0.5);
        let s = Session::new(script, SessionSettings::default(), TrackStore::in_memory()).unwrap();
        (s, layout)
    }

    #[test]
    fn first_frame_from_stopped_is_smooth() {
        let (mut s, layout) = session();
        s.play(0.0, &layout).unwrap();
        let f = s.tick(0.0, 0.0, &layout, None).unwrap();
        assert_eq!(f.scroll.unwrap().behavior, ScrollBehavior::Smooth);

        let f = s.tick(1000.0, 0.0, &layout, None).unwrap();
        let cmd = f.scroll.unwrap();
        assert_eq!(cmd.behavior, ScrollBehavior::Instant);
        assert_eq!(cmd.offset, 50.0);
    }

    #[test]
    fn playback_without_track_is_rejected() {
        let (mut s, _) = session();
        let err = s.start_automation().unwrap_err();
        assert!(matches!(err, EngineError::NoAutomationTrack { .. }));
        assert_eq!(s.mode(), Mode::Manual);
        assert!(!s.is_playing());
    }

    #[test]
    fn recording_resets_and_forces_play() {
        let (mut s, layout) = session();
        s.seek(1500.0).unwrap();
        s.start_recording().unwrap();
        assert_eq!(s.mode(), Mode::Recording);
        assert_eq!(s.elapsed_ms(), 0.0);
        assert!(s.is_playing());

        assert!(s.start_automation().is_err());
        assert!(s.play(0.0, &layout).is_err());
    }

    #[test]
    fn short_recording_is_not_persisted() {
        let (mut s, layout) = session();
        s.start_recording().unwrap();
        s.tick(0.0, 0.0, &layout, None).unwrap();
        s.tick(100.0, 10.0, &layout, None).unwrap();

        let events = s.toggle_play(0.0, &layout).unwrap();
        assert_eq!(events, vec![SessionEvent::RecordingDiscarded { captured: 2 }]);
        assert_eq!(s.mode(), Mode::Manual);
        assert!(!s.has_automation_track().unwrap());
    }

    #[test]
    fn stop_rewinds_from_any_mode() {
        let (mut s, layout) = session();
        s.play(0.0, &layout).unwrap();
        s.tick(0.0, 0.0, &layout, None).unwrap();
        s.tick(700.0, 0.0, &layout, None).unwrap();
        assert_eq!(s.elapsed_ms(), 700.0);

        s.stop(None).unwrap();
        assert_eq!(s.elapsed_ms(), 0.0);
        assert!(!s.is_playing());

        let f = s.tick(800.0, 35.0, &layout, None).unwrap();
        assert_eq!(f.scroll.map(|c| c.offset), Some(0.0));
    }

    #[test]
    fn abort_discards_capture() {
        let (mut s, layout) = session();
        s.start_recording().unwrap();
        for i in 0..10 {
            s.tick(i as f64 * 100.0, i as f64 * 10.0, &layout, None).unwrap();
        }
        assert!(s.abort_recording());
        assert!(!s.has_automation_track().unwrap());
        assert!(!s.abort_recording());
    }
}
