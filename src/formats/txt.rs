use anyhow::{Result, anyhow};

use crate::{
    config::{Config, Import},
    formats::time::{format_timestamp, parse_time_range_arrow},
    model::{Script, Segment},
    timeline::build_timeline,
};

pub fn write_txt(script: &Script, cfg: &Config) -> String {
    let mode = cfg.formats.txt.mode.to_lowercase();
    let timeline = build_timeline(&script.segments);
    let mut out = String::new();

    for (seg, entry) in script.segments.iter().zip(timeline.entries()) {
        if mode == "text_only" {
            out.push_str(seg.text().trim());
            out.push('\n');
        } else {
            out.push_str(&format!(
                "[{} --> {}] ",
                format_timestamp(entry.start as i64),
                format_timestamp(entry.end as i64),
            ));
            out.push_str(seg.text().trim());
            out.push('\n');
        }
    }

    out
}

/// One segment per non-empty line. `[start --> end]` prefixes give explicit
/// durations; other lines are timed by reading pace.
pub fn parse_txt(input: &str, cfg: &Import) -> Result<Script> {
    let mut segments: Vec<Segment> = Vec::new();

    for (line_no, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((range, text_part)) = timed_prefix(line) {
            let (start, end) = parse_time_range_arrow(range)
                .map_err(|e| anyhow!("TXT line {}: {e}", line_no + 1))?;
            if end < start {
                return Err(anyhow!(
                    "TXT line {} ends before it starts: '{}'",
                    line_no + 1,
                    range
                ));
            }
            let text = super::clean_text(text_part, cfg);
            segments.push(Segment::from_text(&text, (end - start) as u64));
            continue;
        }

        let text = super::clean_text(line, cfg);
        let dur = super::synth_duration_ms(&text, cfg);
        segments.push(Segment::from_text(&text, dur));
    }

    Ok(Script::new(segments))
}

/// Splits a leading `[start --> end]` off `line`. Other bracketed prefixes,
/// such as stage directions, stay part of the text.
fn timed_prefix(line: &str) -> Option<(&str, &str)> {
    let (range, text) = line.strip_prefix('[')?.split_once(']')?;
    range.contains("-->").then_some((range.trim(), text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixes_explicit_and_paced_lines() {
        let raw = "[00:00:00.000 --> 00:00:02.000] Good evening\n\nand welcome   back\n";
        let script = parse_txt(raw, &Import::default()).unwrap();
        assert_eq!(script.segments.len(), 2);
        assert_eq!(script.segments[0].duration_ms, 2000);
        assert_eq!(script.segments[1].text(), "and welcome back");
        assert_eq!(script.segments[1].duration_ms, 1067);
    }

    #[test]
    fn stage_directions_are_script_text() {
        let raw = "[applause] Thank you all for coming\n[0 --> 800] Really\n";
        let script = parse_txt(raw, &Import::default()).unwrap();
        assert_eq!(script.segments.len(), 2);
        assert_eq!(script.segments[0].text(), "[applause] Thank you all for coming");
        assert_eq!(
            script.segments[0].duration_ms,
            crate::formats::synth_duration_ms("[applause] Thank you all for coming", &Import::default())
        );
        assert_eq!(script.segments[1].duration_ms, 800);
    }

    #[test]
    fn malformed_range_reports_its_line() {
        let err = parse_txt("Intro\n[soon --> later] Oops\n", &Import::default()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn writes_cumulative_ranges() {
        let script = parse_txt("[0 --> 1500] One\n[0 --> 500] Two\n", &Import::default()).unwrap();
        let out = write_txt(&script, &Config::default());
        assert_eq!(
            out,
            "[00:00:00.000 --> 00:00:01.500] One\n[00:00:01.500 --> 00:00:02.000] Two\n"
        );
    }
}
