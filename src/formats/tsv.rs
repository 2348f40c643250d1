use anyhow::{Result, anyhow};
use csv::{ReaderBuilder, WriterBuilder};

use crate::{
    config::Import,
    formats::time::parse_time_to_ms,
    model::{Script, Segment, Word},
};

const COLUMNS: [&str; 3] = ["id", "duration_ms", "text"];

pub fn write_tsv(script: &Script) -> Result<String> {
    let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(vec![]);

    wtr.write_record(COLUMNS)?;
    for seg in &script.segments {
        wtr.write_record([
            seg.id.clone(),
            seg.duration_ms.to_string(),
            seg.text(),
        ])?;
    }

    let data = wtr.into_inner().map_err(|e| anyhow!(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}

pub fn parse_tsv(input: &str, cfg: &Import) -> Result<Script> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(input.as_bytes());

    let headers = rdr.headers()?.clone();
    let text_ix = headers
        .iter()
        .position(|h| h == "text")
        .ok_or_else(|| anyhow!("missing 'text' column"))?;
    let duration_ix = headers
        .iter()
        .position(|h| h == "duration_ms" || h == "duration");
    let id_ix = headers.iter().position(|h| h == "id");

    let mut segments = Vec::new();

    for rec in rdr.records() {
        let rec = rec?;
        let text = super::clean_text(rec.get(text_ix).unwrap_or(""), cfg);

        let duration_ms = match duration_ix
            .and_then(|ix| rec.get(ix))
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(s) => {
                let ms = parse_time_to_ms(s)?;
                u64::try_from(ms).map_err(|_| anyhow!("negative duration: {ms}"))?
            }
            None => super::synth_duration_ms(&text, cfg),
        };

        let words: Vec<Word> = text.split_whitespace().map(Word::plain).collect();
        let segment = match id_ix
            .and_then(|ix| rec.get(ix))
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(id) => Segment::new(id, words, duration_ms),
            None => Segment::from_text(&text, duration_ms),
        };
        segments.push(segment);
    }

    Ok(Script::new(segments))
}
