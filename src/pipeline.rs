use anyhow::{Context, Result, anyhow};
use std::{fs, path::Path};

use telecue::{
    config::Config,
    formats::{self, time::format_timestamp},
    model::Script,
    timeline::build_timeline,
};

use crate::cli::{ConvertCmd, Format, InputArgs, TimelineCmd};

pub fn load_script(input: &InputArgs, cfg: &Config) -> Result<Script> {
    let input_format = input
        .from
        .unwrap_or_else(|| infer_format_from_path_or_dash(&input.input));
    tracing::info!(?input_format, "input format selected");

    let raw = read_input_to_string(&input.input)?;
    tracing::info!(bytes = raw.len(), "read input");

    let script = parse_any(&raw, input_format, cfg)
        .with_context(|| format!("failed parsing input as {:?}", input_format))?;
    log_script_summary(&script, cfg);
    Ok(script)
}

pub fn run_timeline(cmd: TimelineCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!("timeline", input = cmd.input.input.as_str());
    let _g = span.enter();

    let script = load_script(&cmd.input, cfg)?;
    let timeline = build_timeline(&script.segments);

    println!("{:>4}  {:<12}  {:<12}  {:>8}  text", "#", "start", "end", "ms");
    for (i, (seg, entry)) in script.segments.iter().zip(timeline.entries()).enumerate() {
        let mut preview = seg.text();
        if preview.chars().count() > 48 {
            preview = preview.chars().take(47).collect::<String>() + "…";
        }
        println!(
            "{:>4}  {:<12}  {:<12}  {:>8}  {}",
            i,
            format_timestamp(entry.start as i64),
            format_timestamp(entry.end as i64),
            seg.duration_ms,
            preview
        );
    }
    println!("total {}", format_timestamp(timeline.total() as i64));
    Ok(())
}

pub fn run_convert(cmd: ConvertCmd, cfg: &Config) -> Result<()> {
    let span = tracing::info_span!("convert", input = cmd.input.input.as_str(), to = ?cmd.to);
    let _g = span.enter();

    let script = load_script(&cmd.input, cfg)?;
    let rendered = render_any(&script, cmd.to, cfg)?;

    if cmd.stdout {
        print!("{rendered}");
        tracing::info!(mode = "stdout", "wrote output");
        return Ok(());
    }

    let out_path = derive_output_path(&cmd)?;
    write_output(&out_path, &rendered, cmd.overwrite)?;
    tracing::info!(path = out_path.as_str(), "wrote output file");

    Ok(())
}

fn infer_format_from_path_or_dash(input: &str) -> Format {
    if input == "-" {
        return Format::Txt;
    }
    let p = Path::new(input);
    match p
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "json" => Format::Json,
        "tsv" => Format::Tsv,
        "srt" => Format::Srt,
        "vtt" => Format::Vtt,
        _ => Format::Txt,
    }
}

fn read_input_to_string(input: &str) -> Result<String> {
    if input == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed reading input: {input}"))
    }
}

fn parse_any(raw: &str, fmt: Format, cfg: &Config) -> Result<Script> {
    let trimmed = raw.trim_start();
    if fmt == Format::Txt && (trimmed.starts_with('{') || trimmed.starts_with('[')) {
        tracing::info!("input looks like JSON; attempting JSON parse");
        if let Ok(s) = formats::json::parse_json(raw, &cfg.import) {
            return Ok(s);
        }
    }

    match fmt {
        Format::Json => formats::json::parse_json(raw, &cfg.import),
        Format::Txt => formats::txt::parse_txt(raw, &cfg.import),
        Format::Tsv => formats::tsv::parse_tsv(raw, &cfg.import),
        Format::Srt => formats::srt::parse_srt_or_vtt(raw, false, &cfg.import),
        Format::Vtt => formats::srt::parse_srt_or_vtt(raw, true, &cfg.import),
    }
}

fn log_script_summary(script: &Script, cfg: &Config) {
    tracing::info!(
        segments = script.segments.len(),
        duration_ms = script.duration_ms(),
        "script summary"
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        let n = cfg.logging.debug_segment_samples.min(script.segments.len());
        for (i, s) in script.segments.iter().take(n).enumerate() {
            tracing::debug!(
                idx = i,
                id = s.id.as_str(),
                duration_ms = s.duration_ms,
                words = s.words.len(),
                "segment sample"
            );
        }
    }
}

fn render_any(script: &Script, fmt: Format, cfg: &Config) -> Result<String> {
    match fmt {
        Format::Json => formats::json::write_json(script, cfg.formats.json.pretty),
        Format::Txt => Ok(formats::txt::write_txt(script, cfg)),
        Format::Tsv => formats::tsv::write_tsv(script),
        Format::Srt | Format::Vtt => Err(anyhow!(
            "{} is an import-only format",
            fmt.extension().to_uppercase()
        )),
    }
}

fn derive_output_path(cmd: &ConvertCmd) -> Result<String> {
    if let Some(o) = &cmd.output {
        return Ok(o.clone());
    }

    if cmd.input.input == "-" {
        return Err(anyhow!(
            "output path required when input is stdin and --stdout is not set"
        ));
    }

    let p = Path::new(&cmd.input.input);
    let stem = p
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("bad input filename"))?;

    let parent = p.parent().unwrap_or_else(|| Path::new("."));
    let out = parent.join(format!("{stem}.{}", cmd.to.extension()));
    Ok(out.to_string_lossy().to_string())
}

fn write_output(path: &str, data: &str, overwrite: bool) -> Result<()> {
    if Path::new(path).exists() && !overwrite {
        return Err(anyhow!(
            "refusing to overwrite existing file (pass --overwrite): {path}"
        ));
    }
    fs::write(path, data)?;
    Ok(())
}
