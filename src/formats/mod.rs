pub mod json;
pub mod srt;
pub mod time;
pub mod tsv;
pub mod txt;

use crate::config::Import;

pub(crate) fn clean_text(text: &str, cfg: &Import) -> String {
    let mut s = text.to_string();
    if cfg.trim_text {
        s = s.trim().to_string();
    }
    if cfg.normalize_whitespace {
        s = normalize_ws(&s);
    }
    s
}

pub(crate) fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Reading time for `text` at the configured pace.
pub(crate) fn synth_duration_ms(text: &str, cfg: &Import) -> u64 {
    let cps = cfg.chars_per_second.max(1.0);
    let raw = (text.chars().count() as f64 / cps * 1000.0).round() as u64;
    raw.clamp(cfg.min_duration_ms, cfg.max_duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_duration_is_clamped() {
        let cfg = Import::default();
        assert_eq!(synth_duration_ms("hi", &cfg), cfg.min_duration_ms);
        assert_eq!(synth_duration_ms(&"x".repeat(150), &cfg), 10_000);
        assert_eq!(synth_duration_ms(&"x".repeat(10_000), &cfg), cfg.max_duration_ms);
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_ws("  a \t b\n\nc "), "a b c");
    }
}
