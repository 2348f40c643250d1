use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    automation::CaptureSettings,
    layout::TextLayoutOptions,
    session::SessionSettings,
    video::VideoSyncSettings,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: Logging,
    pub playback: Playback,
    pub automation: Automation,
    pub video: Video,
    pub layout: Layout,
    pub import: Import,
    pub formats: Formats,
}

impl Config {
    pub fn load(path_opt: Option<&Path>) -> Result<Self> {
        let default_path = Path::new("telecue.toml");
        let path = if let Some(p) = path_opt {
            Some(p)
        } else if default_path.exists() {
            Some(default_path)
        } else {
            None
        };

        let mut cfg = Config::default();

        if let Some(path) = path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading config file: {}", path.display()))?;
            let parsed: Config = toml::from_str(&raw)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
            cfg = parsed;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.playback.speed.is_finite() && self.playback.speed > 0.0) {
            bail!("playback.speed must be > 0 (got {})", self.playback.speed);
        }
        let focal = self.playback.focal_position;
        if !(focal > 0.0 && focal < 1.0) {
            bail!("playback.focal_position must be within (0, 1) (got {focal})");
        }
        if self.layout.line_height <= 0.0 || self.layout.container_height <= 0.0 {
            bail!("layout.line_height and layout.container_height must be > 0");
        }
        if self.import.min_duration_ms > self.import.max_duration_ms {
            bail!("import.min_duration_ms must not exceed import.max_duration_ms");
        }
        Ok(())
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        let s = toml::to_string_pretty(self).context("failed serializing config as TOML")?;
        Ok(s)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            speed: self.playback.speed,
            focal_position: self.playback.focal_position,
            end_tolerance_px: self.playback.end_tolerance_px,
            capture: CaptureSettings {
                min_keyframes: self.automation.min_keyframes,
                min_offset_delta_px: self.automation.min_offset_delta_px,
                min_time_delta_ms: self.automation.min_time_delta_ms,
            },
            video: VideoSyncSettings {
                enabled: self.video.sync_enabled,
                tolerance_secs: self.video.tolerance_secs,
                min_resync_interval_ms: self.video.min_resync_interval_ms,
            },
        }
    }

    pub fn text_layout(&self) -> TextLayoutOptions {
        TextLayoutOptions {
            wrap_width: self.layout.wrap_width,
            line_height: self.layout.line_height,
            segment_gap: self.layout.segment_gap,
            container_height: self.layout.container_height,
            focal_position: self.playback.focal_position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: String,
    pub debug_segment_samples: usize,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            debug_segment_samples: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Playback {
    pub speed: f64,
    pub focal_position: f64,
    pub end_tolerance_px: f64,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            speed: 1.0,
            focal_position: 0.5,
            end_tolerance_px: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Automation {
    pub min_keyframes: usize,
    pub min_offset_delta_px: f64,
    pub min_time_delta_ms: f64,
}

impl Default for Automation {
    fn default() -> Self {
        let c = CaptureSettings::default();
        Self {
            min_keyframes: c.min_keyframes,
            min_offset_delta_px: c.min_offset_delta_px,
            min_time_delta_ms: c.min_time_delta_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    pub sync_enabled: bool,
    pub tolerance_secs: f64,
    pub min_resync_interval_ms: f64,
}

impl Default for Video {
    fn default() -> Self {
        let v = VideoSyncSettings::default();
        Self {
            sync_enabled: v.enabled,
            tolerance_secs: v.tolerance_secs,
            min_resync_interval_ms: v.min_resync_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub wrap_width: usize,
    pub line_height: f64,
    pub segment_gap: f64,
    pub container_height: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            wrap_width: 42,
            line_height: 48.0,
            segment_gap: 24.0,
            container_height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Import {
    pub chars_per_second: f64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    pub normalize_whitespace: bool,
    pub trim_text: bool,
}

impl Default for Import {
    fn default() -> Self {
        Self {
            chars_per_second: 15.0,
            min_duration_ms: 800,
            max_duration_ms: 12_000,
            normalize_whitespace: true,
            trim_text: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Formats {
    pub json: JsonCfg,
    pub txt: TxtCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonCfg {
    pub pretty: bool,
}

impl Default for JsonCfg {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TxtCfg {
    pub mode: String,
}

impl Default for TxtCfg {
    fn default() -> Self {
        Self {
            mode: "timestamp_range".to_string(),
        }
    }
}

pub fn init_tracing(logging: &Logging, cli_override_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = cli_override_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let is_json = logging.format.to_lowercase() == "json";

    if is_json {
        fmt()
            .with_env_filter(filter)
            .event_format(fmt::format().json())
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .pretty()
            .init();
    }

    tracing::info!(
        level = level,
        format = logging.format.as_str(),
        "logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let cfg = Config::default();
        let raw = cfg.to_toml_pretty().unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.automation.min_keyframes, 5);
        assert_eq!(parsed.playback.focal_position, 0.5);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[playback]\nspeed = 1.5\n").unwrap();
        assert_eq!(parsed.playback.speed, 1.5);
        assert_eq!(parsed.playback.end_tolerance_px, 2.0);
        assert_eq!(parsed.video.tolerance_secs, 0.15);
    }

    #[test]
    fn validate_rejects_bad_focal_position() {
        let mut cfg = Config::default();
        cfg.playback.focal_position = 1.2;
        assert!(cfg.validate().is_err());
    }
}
