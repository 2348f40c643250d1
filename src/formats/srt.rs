use anyhow::{Result, anyhow};

use crate::{
    config::Import,
    model::{Script, Segment},
};

/// Imports SubRip or WebVTT cues. The gap before each following cue is folded
/// into the preceding segment so segment starts line up with cue starts.
pub fn parse_srt_or_vtt(raw: &str, prefer_vtt: bool, cfg: &Import) -> Result<Script> {
    let plain = if prefer_vtt {
        parse_vtt(raw).or_else(|| parse_srt(raw))
    } else {
        parse_srt(raw).or_else(|| parse_vtt(raw))
    }
    .ok_or_else(|| anyhow!("failed to parse as SRT or VTT"))?;

    let cues: Vec<(i64, i64, String)> = plain
        .events()
        .iter()
        .map(|e| (moment_to_ms(&e.start), moment_to_ms(&e.end), e.text.clone()))
        .collect();

    Ok(Script::new(cues_to_segments(&cues, cfg)))
}

fn parse_srt(raw: &str) -> Option<aspasia::PlainSubtitle> {
    let srt = raw.parse::<aspasia::SubRipSubtitle>().ok()?;
    tracing::info!("parsed as SRT via aspasia");
    Some(aspasia::PlainSubtitle::from(&srt))
}

fn parse_vtt(raw: &str) -> Option<aspasia::PlainSubtitle> {
    let vtt = raw.parse::<aspasia::WebVttSubtitle>().ok()?;
    tracing::info!("parsed as VTT via aspasia");
    Some(aspasia::PlainSubtitle::from(&vtt))
}

fn cues_to_segments(cues: &[(i64, i64, String)], cfg: &Import) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(cues.len());
    for (i, (start, end, text)) in cues.iter().enumerate() {
        let until = cues.get(i + 1).map(|next| next.0.max(*end)).unwrap_or(*end);
        let duration = (until - start).max(0) as u64;
        let text = super::clean_text(text, cfg);
        segments.push(Segment::from_text(&text, duration));
    }
    segments
}

fn moment_to_ms(m: &aspasia::Moment) -> i64 {
    let h = m.hours();
    let min = m.minutes();
    let s = m.seconds();
    let ms = m.ms();
    (((h * 60 + min) * 60 + s) * 1000 + ms) as i64
}
