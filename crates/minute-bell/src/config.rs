//! Configuration loading and resolution.
//!
//! Settings come from an optional TOML file and are overridden by CLI flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use serde::Deserialize;

use minute_audio::config::PlaybackConfig;

use crate::cli::Args;
use crate::clock::parse_start_at;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_DECLARATION_FILE: &str = "declare_silence.m4a";
pub const DEFAULT_VOLUME_PERCENT: u8 = 100;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Output device substring.
    pub device: Option<String>,
    /// Software output volume, 0..=100.
    pub volume_percent: Option<u8>,
    /// Show the volume check before and during the event (default: true).
    pub show_volume_control: Option<bool>,
    /// Path of the declaration clip; relative paths resolve against the config file.
    pub declaration_path: Option<String>,
    /// Output queue tuning.
    pub playback: Option<PlaybackSection>,
}

/// `[playback]` table.
#[derive(Debug, Default, Deserialize)]
pub struct PlaybackSection {
    pub buffer_seconds: Option<f32>,
    pub refill_max_frames: Option<usize>,
    pub chunk_frames: Option<usize>,
}

/// Fully resolved runtime settings.
#[derive(Clone, Debug)]
pub struct Settings {
    pub device: Option<String>,
    pub volume_percent: u8,
    pub show_volume_control: bool,
    pub declaration_path: PathBuf,
    pub playback: PlaybackConfig,
    pub start_at: Option<NaiveTime>,
}

impl AppConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("parse config {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str::<AppConfig>(raw)?)
    }
}

/// Directory of the running executable, used to locate default files.
pub fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
}

/// Load the explicit config, else `config.toml` beside the executable, else defaults.
///
/// Returns the config and the directory relative paths resolve against.
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let cfg = AppConfig::load(path)?;
        return Ok((cfg, path.parent().map(Path::to_path_buf)));
    }
    let dir = exe_dir();
    if let Some(auto_path) = dir.as_ref().map(|d| d.join(DEFAULT_CONFIG_FILE)) {
        if auto_path.exists() {
            tracing::info!(path = ?auto_path, "using config beside executable");
            return Ok((AppConfig::load(&auto_path)?, dir));
        }
    }
    Ok((AppConfig::default(), dir))
}

/// Combine CLI flags, config values and defaults.
pub fn resolve(args: &Args, cfg: &AppConfig, base_dir: Option<&Path>) -> Result<Settings> {
    let volume_percent = match args.volume {
        Some(v) => v,
        None => volume_from_config(cfg)?,
    };
    let show_volume_control = !args.no_volume_check && cfg.show_volume_control.unwrap_or(true);
    let declaration_path = match args.declaration.as_ref() {
        Some(path) => path.clone(),
        None => declaration_path_from_config(cfg, base_dir),
    };
    let start_at = args.start_at.as_deref().map(parse_start_at).transpose()?;

    Ok(Settings {
        device: normalize_device_name(args.device.clone().or_else(|| cfg.device.clone())),
        volume_percent,
        show_volume_control,
        declaration_path,
        playback: playback_from_config(cfg),
        start_at,
    })
}

fn volume_from_config(cfg: &AppConfig) -> Result<u8> {
    match cfg.volume_percent {
        None => Ok(DEFAULT_VOLUME_PERCENT),
        Some(v) if v <= 100 => Ok(v),
        Some(v) => Err(anyhow!("volume_percent must be 0..=100, got {v}")),
    }
}

fn declaration_path_from_config(cfg: &AppConfig, base_dir: Option<&Path>) -> PathBuf {
    let configured = cfg
        .declaration_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_DECLARATION_FILE);
    let path = PathBuf::from(configured);
    match base_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    }
}

/// Overlay `[playback]` values on the defaults.
pub fn playback_from_config(cfg: &AppConfig) -> PlaybackConfig {
    let mut playback = PlaybackConfig::default();
    if let Some(section) = cfg.playback.as_ref() {
        if let Some(secs) = section.buffer_seconds {
            playback.buffer_seconds = secs;
        }
        if let Some(frames) = section.refill_max_frames {
            playback.refill_max_frames = frames;
        }
        if let Some(frames) = section.chunk_frames {
            playback.chunk_frames = frames;
        }
    }
    playback
}

fn normalize_device_name(device: Option<String>) -> Option<String> {
    device.and_then(|name| {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let cfg = AppConfig::parse(
            r#"
            device = "USB DAC"
            volume_percent = 55
            show_volume_control = false
            declaration_path = "clips/declare.m4a"

            [playback]
            buffer_seconds = 12.5
            chunk_frames = 512
            "#,
        )
        .unwrap();
        assert_eq!(cfg.device.as_deref(), Some("USB DAC"));
        assert_eq!(cfg.volume_percent, Some(55));
        assert_eq!(cfg.show_volume_control, Some(false));
        let playback = playback_from_config(&cfg);
        assert_eq!(playback.buffer_seconds, 12.5);
        assert_eq!(playback.chunk_frames, 512);
        assert_eq!(playback.refill_max_frames, PlaybackConfig::default().refill_max_frames);
    }

    #[test]
    fn parse_rejects_unknown_types() {
        assert!(AppConfig::parse("volume_percent = \"loud\"").is_err());
    }

    #[test]
    fn defaults_without_config() {
        let settings = resolve(&Args::default(), &AppConfig::default(), None).unwrap();
        assert_eq!(settings.volume_percent, DEFAULT_VOLUME_PERCENT);
        assert!(settings.show_volume_control);
        assert_eq!(settings.declaration_path, PathBuf::from(DEFAULT_DECLARATION_FILE));
        assert!(settings.device.is_none());
        assert!(settings.start_at.is_none());
    }

    #[test]
    fn cli_overrides_config() {
        let cfg = AppConfig {
            device: Some("speakers".to_string()),
            volume_percent: Some(20),
            ..AppConfig::default()
        };
        let args = Args {
            device: Some("  headphones ".to_string()),
            volume: Some(90),
            no_volume_check: true,
            start_at: Some("08:59:50".to_string()),
            ..Args::default()
        };
        let settings = resolve(&args, &cfg, None).unwrap();
        assert_eq!(settings.device.as_deref(), Some("headphones"));
        assert_eq!(settings.volume_percent, 90);
        assert!(!settings.show_volume_control);
        assert_eq!(settings.start_at, NaiveTime::from_hms_opt(8, 59, 50));
    }

    #[test]
    fn out_of_range_volume_is_rejected() {
        let cfg = AppConfig {
            volume_percent: Some(150),
            ..AppConfig::default()
        };
        assert!(resolve(&Args::default(), &cfg, None).is_err());
    }

    #[test]
    fn bad_start_time_is_rejected() {
        let args = Args {
            start_at: Some("nine".to_string()),
            ..Args::default()
        };
        assert!(resolve(&args, &AppConfig::default(), None).is_err());
    }

    #[test]
    fn relative_declaration_resolves_against_base_dir() {
        let cfg = AppConfig {
            declaration_path: Some("clips/declare.m4a".to_string()),
            ..AppConfig::default()
        };
        let path = declaration_path_from_config(&cfg, Some(Path::new("/opt/minute")));
        assert_eq!(path, PathBuf::from("/opt/minute/clips/declare.m4a"));

        let abs = AppConfig {
            declaration_path: Some("/srv/declare.m4a".to_string()),
            ..AppConfig::default()
        };
        let path = declaration_path_from_config(&abs, Some(Path::new("/opt/minute")));
        assert_eq!(path, PathBuf::from("/srv/declare.m4a"));
    }

    #[test]
    fn normalize_device_name_trims_and_drops_empty() {
        assert_eq!(normalize_device_name(None), None);
        assert_eq!(normalize_device_name(Some("  ".to_string())), None);
        assert_eq!(
            normalize_device_name(Some("  USB DAC ".to_string())),
            Some("USB DAC".to_string())
        );
    }
}
