use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use telecue::{
    config::Config,
    formats::time::format_clock,
    layout::{LayoutQuery, StackLayout},
    session::{Frame, Mode, Session, SessionEvent},
    store::{FileStore, TrackStore},
    timeline::Lookup,
    video::{MediaElement, SimulatedMedia},
};

use crate::{cli::SimulateCmd, pipeline::load_script};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Action {
    Scroll { scroll_top: f64 },
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Deserialize)]
struct Gesture {
    at_ms: f64,
    #[serde(flatten)]
    action: Action,
}

fn load_gestures(path: Option<&Path>) -> Result<Vec<Gesture>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading gestures: {}", path.display()))?;
    let mut gestures: Vec<Gesture> = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing gestures: {}", path.display()))?;
    gestures.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
    Ok(gestures)
}

pub fn run_simulate(cmd: SimulateCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!("simulate", input = cmd.input.input.as_str());
    let _g = span.enter();

    let script = load_script(&cmd.input, cfg)?;
    let layout = StackLayout::from_text(&script.segments, &cfg.text_layout());
    let gestures = load_gestures(cmd.gestures.as_deref())?;

    let mut settings = cfg.session_settings();
    if let Some(speed) = cmd.speed {
        settings.speed = speed;
    }
    if cmd.video {
        settings.video.enabled = true;
    }

    let store = FileStore::open(&cmd.store)
        .with_context(|| format!("failed opening store: {}", cmd.store.display()))?;
    let mut session = Session::new(script, settings, TrackStore::new(Box::new(store)))?;
    let mut media = SimulatedMedia::default();

    if cmd.record {
        session.start_recording()?;
    } else if let Some(at) = cmd.punch_in_at {
        session.seek(at)?;
        session.punch_in()?;
    } else if cmd.automation {
        session.start_automation()?;
    } else {
        session.play(0.0, &layout)?;
    }

    let frame_ms = cmd.frame_ms.max(1.0);
    let last_gesture = gestures.last().map(|g| g.at_ms).unwrap_or(0.0);
    let budget_ms =
        session.timeline().total() / session.speed() + last_gesture + 10.0 * frame_ms;
    let every = cmd.every.max(1);

    let mut now = 0.0;
    let mut scroll_top = 0.0;
    let mut pending = gestures.into_iter().peekable();
    let mut frames = 0usize;
    let mut all_events = Vec::new();

    while now <= budget_ms {
        while let Some(g) = pending.next_if(|g| g.at_ms <= now) {
            let events = apply_gesture(&mut session, &mut media, &layout, &mut scroll_top, g.action)?;
            all_events.extend(events);
        }

        let frame = session.tick(
            now,
            scroll_top,
            &layout,
            cmd.video.then_some(&mut media as &mut dyn MediaElement),
        )?;
        if let Some(scroll) = frame.scroll {
            scroll_top = scroll.offset.clamp(0.0, layout.max_scroll());
        }

        if frames % every == 0 || !frame.events.is_empty() {
            print_frame(&frame, scroll_top, session.timeline().len(), cmd.video.then_some(&media));
        }
        all_events.extend(frame.events.iter().cloned());

        frames += 1;
        now += frame_ms;
        media.advance(frame_ms);

        if !frame.playing && pending.peek().is_none() && frame.mode == Mode::Manual {
            break;
        }
    }

    for e in &all_events {
        println!("event: {}", describe(e));
    }
    tracing::info!(frames, elapsed_ms = session.elapsed_ms(), "simulation finished");
    Ok(())
}

fn apply_gesture(
    session: &mut Session,
    media: &mut SimulatedMedia,
    layout: &StackLayout,
    scroll_top: &mut f64,
    action: Action,
) -> Result<Vec<SessionEvent>> {
    tracing::debug!(?action, "applying gesture");
    let events = match action {
        Action::Scroll { scroll_top: to } => {
            *scroll_top = to.clamp(0.0, layout.max_scroll());
            session.on_user_scroll(*scroll_top, layout)
        }
        Action::Play => {
            if session.mode() == Mode::Manual && !session.is_playing() {
                session.play(*scroll_top, layout)?;
            }
            Vec::new()
        }
        Action::Pause => session.pause()?,
        Action::Stop => session.stop(Some(media as &mut dyn MediaElement))?,
    };
    Ok(events)
}

fn print_frame(frame: &Frame, scroll_top: f64, segments: usize, media: Option<&SimulatedMedia>) {
    let seg = match frame.active {
        Lookup::Active(i) => format!("{}/{}", i + 1, segments),
        Lookup::BeforeFirst => "-".to_string(),
        Lookup::Finished => "end".to_string(),
    };
    let state = if frame.playing { "playing" } else { "paused" };
    match media {
        Some(m) => println!(
            "{:>9}  seg {:<7}  scroll {:>8.1}  {:<9}  {:<7}  video {:.2}s",
            format_clock(frame.elapsed_ms),
            seg,
            scroll_top,
            frame.mode.label(),
            state,
            m.time
        ),
        None => println!(
            "{:>9}  seg {:<7}  scroll {:>8.1}  {:<9}  {}",
            format_clock(frame.elapsed_ms),
            seg,
            scroll_top,
            frame.mode.label(),
            state
        ),
    }
}

fn describe(e: &SessionEvent) -> String {
    match e {
        SessionEvent::Finished => "reached end of script".to_string(),
        SessionEvent::RecordingSaved { keyframes } => {
            format!("automation track saved ({keyframes} keyframes)")
        }
        SessionEvent::RecordingDiscarded { captured } => {
            format!("recording discarded, only {captured} keyframes captured")
        }
        SessionEvent::AutomationEnded => "automation playback ended".to_string(),
        SessionEvent::ManualTakeover => "manual scroll took over".to_string(),
    }
}
