use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub segments: Vec<Segment>,
}

impl Script {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            id: new_id(),
            title: None,
            segments,
        }
    }

    /// Builds a script from the timed lines a script generator returns.
    pub fn from_generated(lines: Vec<GeneratedLine>) -> Self {
        let segments = lines
            .into_iter()
            .map(|l| Segment::from_text(&l.text, l.duration_ms))
            .collect();
        Self::new(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        self.segments.iter().map(|s| s.duration_ms).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub words: Vec<Word>,
    pub duration_ms: u64,
}

impl Segment {
    pub fn new(id: impl Into<String>, words: Vec<Word>, duration_ms: u64) -> Self {
        Self {
            id: id.into(),
            words,
            duration_ms,
        }
    }

    /// Splits `text` on whitespace into untagged words under a fresh id.
    pub fn from_text(text: &str, duration_ms: u64) -> Self {
        let words = text.split_whitespace().map(Word::plain).collect();
        Self::new(new_id(), words, duration_ms)
    }

    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Word {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Some(color.into()),
        }
    }
}

/// One line of output from a script-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLine {
    pub text: String,
    #[serde(alias = "duration", deserialize_with = "millis_from_number")]
    pub duration_ms: u64,
}

/// Reads a millisecond count written as either an integer or a float.
fn millis_from_number<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let ms = f64::deserialize(d)?;
    millis_from_f64(ms).ok_or_else(|| D::Error::custom(format!("invalid duration {ms}")))
}

pub(crate) fn millis_from_f64(ms: f64) -> Option<u64> {
    (ms.is_finite() && ms >= 0.0).then(|| ms.round() as u64)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_lines_become_segments_in_order() {
        let script = Script::from_generated(vec![
            GeneratedLine {
                text: "Hello  there".to_string(),
                duration_ms: 1200,
            },
            GeneratedLine {
                text: "General Kenobi".to_string(),
                duration_ms: 800,
            },
        ]);

        assert_eq!(script.segments.len(), 2);
        assert_eq!(script.segments[0].text(), "Hello there");
        assert_eq!(script.segments[1].words.len(), 2);
        assert_eq!(script.duration_ms(), 2000);
        assert_ne!(script.segments[0].id, script.segments[1].id);
    }

    #[test]
    fn generated_duration_is_millis_whatever_the_number_form() {
        let lines: Vec<GeneratedLine> = serde_json::from_str(
            r#"[{"text":"a","duration":1500},{"text":"b","duration":1500.0},{"text":"c","duration_ms":12.6}]"#,
        )
        .unwrap();
        let ms: Vec<u64> = lines.iter().map(|l| l.duration_ms).collect();
        assert_eq!(ms, vec![1500, 1500, 13]);
        assert!(serde_json::from_str::<GeneratedLine>(r#"{"text":"x","duration":-1}"#).is_err());
    }

    #[test]
    fn word_color_is_omitted_when_absent() {
        let json = serde_json::to_string(&Word::plain("hi")).unwrap();
        assert_eq!(json, r#"{"text":"hi"}"#);

        let tagged: Word = serde_json::from_str(r#"{"text":"hi","color":"red"}"#).unwrap();
        assert_eq!(tagged, Word::colored("hi", "red"));
    }
}
