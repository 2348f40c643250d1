use anyhow::{Result, anyhow};
use serde_json::{Map, Value};

use crate::{
    config::Import,
    model::{GeneratedLine, Script, Segment, Word, millis_from_f64, new_id},
};

pub fn write_json(script: &Script, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(script)?)
    } else {
        Ok(serde_json::to_string(script)?)
    }
}

/// Accepts a saved script object, a bare `segments` array, or the
/// `[{text, duration}]` list a script generator returns.
pub fn parse_json(input: &str, cfg: &Import) -> Result<Script> {
    let v: Value = serde_json::from_str(input)?;

    if let Some(obj) = v.as_object() {
        let segs = obj
            .get("segments")
            .ok_or_else(|| anyhow!("script object has no 'segments' array"))?;
        let mut script = Script::new(parse_segments_array(segs, cfg)?);
        if let Some(id) = obj.get("id").and_then(|x| x.as_str()) {
            script.id = id.to_string();
        }
        script.title = obj
            .get("title")
            .and_then(|x| x.as_str())
            .map(|s| s.to_string());
        return Ok(script);
    }

    if let Some(items) = v.as_array() {
        let generated_shape = items
            .iter()
            .all(|i| i.get("id").is_none() && i.get("words").is_none());
        if !generated_shape {
            return Ok(Script::new(parse_segments_array(&v, cfg)?));
        }
        if let Ok(lines) = serde_json::from_value::<Vec<GeneratedLine>>(v.clone()) {
            tracing::info!(lines = lines.len(), "parsed generated script lines");
            return Ok(Script::from_generated(lines));
        }
        return Ok(Script::new(parse_segments_array(&v, cfg)?));
    }

    Err(anyhow!("unrecognized JSON script shape"))
}

fn parse_segments_array(v: &Value, cfg: &Import) -> Result<Vec<Segment>> {
    let arr = v
        .as_array()
        .ok_or_else(|| anyhow!("segments must be an array"))?;
    let mut segments = Vec::with_capacity(arr.len());

    for (i, item) in arr.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| anyhow!("segment {i} must be an object"))?;
        segments.push(parse_segment(obj, cfg).map_err(|e| anyhow!("segment {i}: {e}"))?);
    }

    Ok(segments)
}

fn parse_segment(obj: &Map<String, Value>, cfg: &Import) -> Result<Segment> {
    let id = obj
        .get("id")
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(new_id);

    let words: Vec<Word> = if let Some(words) = obj.get("words") {
        serde_json::from_value(words.clone())?
    } else if let Some(text) = obj.get("text").and_then(|x| x.as_str()) {
        text.split_whitespace().map(Word::plain).collect()
    } else {
        return Err(anyhow!("missing 'words' or 'text'"));
    };

    let duration_ms = match obj.get("duration_ms").or_else(|| obj.get("duration")) {
        Some(v) => decode_duration_ms(v)?,
        None => {
            let text = words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            super::synth_duration_ms(&text, cfg)
        }
    };

    Ok(Segment::new(id, words, duration_ms))
}

/// Numbers are milliseconds however they are written; strings may carry
/// a unit or clock form (`"1.5s"`, `"00:01.500"`).
fn decode_duration_ms(v: &Value) -> Result<u64> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .and_then(millis_from_f64)
            .ok_or_else(|| anyhow!("bad numeric duration: {n}")),
        Value::String(s) => {
            let ms = super::time::parse_time_to_ms(s)?;
            u64::try_from(ms).map_err(|_| anyhow!("negative duration: {ms}"))
        }
        _ => Err(anyhow!("unsupported duration type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_saved_script_object() {
        let raw = r#"{
            "id": "abc",
            "title": "Keynote",
            "segments": [
                {"id": "s1", "words": [{"text": "Hello"}, {"text": "world", "color": "red"}], "duration_ms": 2000},
                {"text": "Second line", "duration": "1.5s"}
            ]
        }"#;
        let script = parse_json(raw, &Import::default()).unwrap();
        assert_eq!(script.id, "abc");
        assert_eq!(script.title.as_deref(), Some("Keynote"));
        assert_eq!(script.segments[0].words[1].color.as_deref(), Some("red"));
        assert_eq!(script.segments[1].duration_ms, 1500);
    }

    #[test]
    fn parses_generated_lines() {
        let raw = r#"[{"text": "Welcome everyone", "duration": 3000}, {"text": "Let's begin", "duration": 1200}]"#;
        let script = parse_json(raw, &Import::default()).unwrap();
        assert_eq!(script.segments.len(), 2);
        assert_eq!(script.duration_ms(), 4200);
    }

    #[test]
    fn numeric_durations_are_millis_in_any_form() {
        for raw in [
            r#"[{"text": "hi", "duration": 1500}]"#,
            r#"[{"text": "hi", "duration": 1500.0}]"#,
            r#"{"segments": [{"text": "hi", "duration_ms": 1500.0}]}"#,
            r#"{"segments": [{"id": "s", "text": "hi", "duration": 1499.6}]}"#,
        ] {
            let script = parse_json(raw, &Import::default()).unwrap();
            assert_eq!(script.segments[0].duration_ms, 1500, "{raw}");
        }
    }

    #[test]
    fn negative_duration_is_rejected() {
        assert!(parse_json(r#"[{"id": "s", "text": "hi", "duration": -5}]"#, &Import::default()).is_err());
    }

    #[test]
    fn saved_script_survives_write_and_parse() {
        let script = Script {
            id: "x".to_string(),
            title: None,
            segments: vec![Segment::new("s", vec![Word::colored("Go", "green")], 900)],
        };
        let raw = write_json(&script, true).unwrap();
        assert_eq!(parse_json(&raw, &Import::default()).unwrap(), script);
    }
}
