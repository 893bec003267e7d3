//! Engine configuration file (JSON) and an mtime-polling watcher for hot reload.
//!
//! Every field has a default, so a partial file is fine; a missing file falls
//! back to `EngineConfig::default()` with a warning. Validation is strict on
//! numeric ranges so the loop can assume positive rates and sizes.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::EaselError;

pub const CONFIG_VERSION: &str = "0.1";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SurfaceConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Clear colour as RGBA.
    #[serde(default = "default_background")]
    pub background: [u8; 4],
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    #[default]
    Fixed,
    Variable,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "default_target_fps")]
    pub target_fps: f64,
    #[serde(default)]
    pub step_mode: StepMode,
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f64,
    #[serde(default = "default_max_accumulator")]
    pub max_accumulator: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            title: default_title(),
            surface: SurfaceConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            scale: default_scale(),
            background: default_background(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            step_mode: StepMode::Fixed,
            fixed_dt: default_fixed_dt(),
            max_accumulator: default_max_accumulator(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, EaselError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        EaselError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;
    parse_config(&raw)
        .map_err(|e| EaselError::Config(format!("{} ({})", e, path.display())))
}

pub fn parse_config(raw: &str) -> Result<EngineConfig, String> {
    let config: EngineConfig =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse config JSON: {e}"))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise defaults. A file that exists but fails
/// to load is still an error.
pub fn load_config_or_default(path: &Path) -> Result<EngineConfig, EaselError> {
    if !path.exists() {
        log::warn!(
            "Config '{}' not found, using built-in defaults",
            path.display()
        );
        return Ok(EngineConfig::default());
    }
    load_config_from_path(path)
}

fn validate_config(config: &EngineConfig) -> Result<(), String> {
    if config.version != CONFIG_VERSION {
        return Err(format!(
            "Config validation failed: unsupported version '{}'",
            config.version
        ));
    }
    let surface = &config.surface;
    if surface.width == 0 || surface.height == 0 {
        return Err(format!(
            "Config validation failed: surface size {}x{} must be non-zero",
            surface.width, surface.height
        ));
    }
    if !(surface.scale > 0.0) {
        return Err(format!(
            "Config validation failed: surface scale {} must be > 0",
            surface.scale
        ));
    }
    let timing = &config.timing;
    if !(timing.target_fps > 0.0) {
        return Err("Config validation failed: target_fps must be > 0".to_string());
    }
    if !(timing.fixed_dt > 0.0) {
        return Err("Config validation failed: fixed_dt must be > 0".to_string());
    }
    if timing.max_accumulator < timing.fixed_dt {
        return Err(format!(
            "Config validation failed: max_accumulator {} is smaller than fixed_dt {}",
            timing.max_accumulator, timing.fixed_dt
        ));
    }
    Ok(())
}

/// Polls a file's modification time. `should_reload` returns true once per
/// observed change, including the file appearing for the first time.
pub struct ConfigWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_title() -> String {
    "Easel".to_string()
}

const fn default_width() -> u32 {
    480
}

const fn default_height() -> u32 {
    320
}

const fn default_scale() -> f32 {
    2.0
}

const fn default_background() -> [u8; 4] {
    [16, 16, 24, 255]
}

const fn default_target_fps() -> f64 {
    60.0
}

const fn default_fixed_dt() -> f64 {
    1.0 / 60.0
}

const fn default_max_accumulator() -> f64 {
    0.25
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "easel_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn empty_object_yields_defaults() {
        let config = parse_config("{}").expect("defaults should validate");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.surface.width, 480);
        assert_eq!(config.surface.height, 320);
        assert_eq!(config.timing.step_mode, StepMode::Fixed);
    }

    #[test]
    fn parses_partial_sections() {
        let config = parse_config(
            r#"{
              "title": "demo",
              "surface": { "scale": 3.0 },
              "timing": { "target_fps": 30.0, "step_mode": "variable" }
            }"#,
        )
        .expect("should parse");
        assert_eq!(config.title, "demo");
        assert_eq!(config.surface.scale, 3.0);
        assert_eq!(config.surface.width, 480);
        assert_eq!(config.timing.target_fps, 30.0);
        assert_eq!(config.timing.step_mode, StepMode::Variable);
    }

    #[test]
    fn rejects_bad_version() {
        let err = parse_config(r#"{ "version": "9.9" }"#).expect_err("bad version");
        assert!(err.contains("unsupported version"));
    }

    #[test]
    fn rejects_non_positive_scale_and_rates() {
        let err = parse_config(r#"{ "surface": { "scale": 0.0 } }"#).expect_err("zero scale");
        assert!(err.contains("scale"));
        let err =
            parse_config(r#"{ "timing": { "target_fps": 0.0 } }"#).expect_err("zero fps");
        assert!(err.contains("target_fps"));
        let err = parse_config(r#"{ "timing": { "fixed_dt": 0.5, "max_accumulator": 0.25 } }"#)
            .expect_err("cap below step");
        assert!(err.contains("max_accumulator"));
    }

    #[test]
    fn load_from_path_reports_config_error() {
        let path = temp_file_path("broken");
        fs::write(&path, "{ not json").expect("write temp file");
        let err = load_config_from_path(&path).expect_err("broken json");
        assert!(matches!(err, EaselError::Config(_)));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        let _ = fs::remove_file(&path);
        let config = load_config_or_default(&path).expect("defaults");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn watcher_detects_newly_created_file() {
        let path = temp_file_path("watcher_create");
        let _ = fs::remove_file(&path);

        let mut watcher = ConfigWatcher::new(path.clone());
        assert!(!watcher.should_reload(), "missing file should not reload");

        fs::write(&path, "{}").expect("write temp file");
        assert!(
            watcher.should_reload(),
            "creating file should trigger reload once"
        );
        assert!(
            !watcher.should_reload(),
            "without changes, second poll should not reload"
        );

        let _ = fs::remove_file(path);
    }
}
