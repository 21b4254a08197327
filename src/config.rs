//! Tool configuration.
//!
//! Handles loading and validating `photocull.toml`. Every value has a stock
//! default; a config file only needs the keys it overrides. Unknown keys are
//! rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [preview]
//! max_dimension = 1280      # Longer edge of viewer/grid previews (px)
//! quality = 0.7             # Preview JPEG quality (0-1]
//! fill_delay_ms = 50        # Pause after each background render
//! progress_every = 5        # Report fill progress every N renders
//!
//! [culling]
//! auto_advance_ms = 250     # Delay before moving on after a rating
//! zoom_level = 2.5          # Magnification used by toggle-zoom
//! max_zoom = 5.0            # Upper bound for pinch zoom
//!
//! [export]
//! resolution = 2048         # Longer edge in px, or "original"
//! quality = 0.9             # Export JPEG quality (0-1]
//! destination = "Selection" # Archive / subfolder name
//! channel = "archive"       # archive | folder | share
//! ```

use crate::export::ChannelKind;
use crate::imaging::{Quality, RenderTarget};
use crate::preview::PreviewSettings;
use crate::session::CullingSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILENAME: &str = "photocull.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `photocull.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CullConfig {
    /// Preview rendering and background fill.
    pub preview: PreviewConfig,
    /// Viewer behaviour while culling.
    pub culling: CullingConfig,
    /// Defaults for the export form.
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub max_dimension: u32,
    pub quality: Quality,
    pub fill_delay_ms: u64,
    pub progress_every: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1280,
            quality: Quality::from_percent(70),
            fill_delay_ms: 50,
            progress_every: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CullingConfig {
    pub auto_advance_ms: u64,
    pub zoom_level: f32,
    pub max_zoom: f32,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            auto_advance_ms: 250,
            zoom_level: 2.5,
            max_zoom: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub resolution: RenderTarget,
    pub quality: Quality,
    pub destination: String,
    pub channel: ChannelKind,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            resolution: RenderTarget::MaxDimension(2048),
            quality: Quality::from_percent(90),
            destination: "Selection".to_string(),
            channel: ChannelKind::Archive,
        }
    }
}

impl CullConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "preview.max_dimension must be greater than zero".into(),
            ));
        }
        if self.preview.progress_every == 0 {
            return Err(ConfigError::Validation(
                "preview.progress_every must be at least 1".into(),
            ));
        }
        if !(self.culling.zoom_level > 1.0) {
            return Err(ConfigError::Validation(
                "culling.zoom_level must be greater than 1".into(),
            ));
        }
        if !(self.culling.max_zoom >= self.culling.zoom_level) {
            return Err(ConfigError::Validation(
                "culling.max_zoom must be at least culling.zoom_level".into(),
            ));
        }
        if self.export.destination.trim().is_empty() {
            return Err(ConfigError::Validation(
                "export.destination must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn preview_settings(&self) -> PreviewSettings {
        PreviewSettings {
            max_dimension: self.preview.max_dimension,
            quality: self.preview.quality,
            fill_delay: Duration::from_millis(self.preview.fill_delay_ms),
            progress_every: self.preview.progress_every.max(1),
        }
    }

    pub fn culling_settings(&self) -> CullingSettings {
        CullingSettings {
            auto_advance: Duration::from_millis(self.culling.auto_advance_ms),
            zoom_level: self.culling.zoom_level,
            max_zoom: self.culling.max_zoom,
        }
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<CullConfig, ConfigError> {
    let config: CullConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from an explicit path, or `photocull.toml` in `dir` if present.
///
/// An explicit path must exist; the implicit file is optional and stock
/// defaults are used without it.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<CullConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let implicit = dir.join(CONFIG_FILENAME);
            if !implicit.exists() {
                return Ok(CullConfig::default());
            }
            implicit
        }
    };
    let content = fs::read_to_string(&path)?;
    parse_config(&content)
}

/// A documented `photocull.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r#"# photocull configuration
# All options are optional - remove anything you don't want to override.

[preview]
# Longer edge of the previews used by the viewer and the grid (px).
max_dimension = 1280
# Preview JPEG quality, in (0, 1].
quality = 0.7
# Pause after each background render so interaction stays responsive (ms).
fill_delay_ms = 50
# Report background fill progress every N rendered previews.
progress_every = 5

[culling]
# Delay before moving to the next photo after giving a rating (ms).
auto_advance_ms = 250
# Magnification used by toggle-zoom.
zoom_level = 2.5
# Upper bound for pinch zoom.
max_zoom = 5.0

[export]
# Longer edge of exported photos in px, or "original" to copy untouched.
resolution = 2048
# Export JPEG quality, in (0, 1].
quality = 0.9
# Name of the zip archive or the subfolder created for the export.
destination = "Selection"
# Default output channel: "archive", "folder" or "share".
channel = "archive"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stock_toml_parses_to_defaults() {
        let parsed = parse_config(stock_config_toml()).unwrap();
        let defaults = CullConfig::default();
        assert_eq!(parsed.preview.max_dimension, defaults.preview.max_dimension);
        assert_eq!(parsed.preview.quality, defaults.preview.quality);
        assert_eq!(parsed.culling.auto_advance_ms, 250);
        assert_eq!(parsed.culling.zoom_level, 2.5);
        assert_eq!(parsed.export.resolution, RenderTarget::MaxDimension(2048));
        assert_eq!(parsed.export.channel, ChannelKind::Archive);
    }

    #[test]
    fn partial_config_overrides_only_given_keys() {
        let config = parse_config("[export]\nresolution = \"original\"\n").unwrap();
        assert_eq!(config.export.resolution, RenderTarget::Original);
        assert_eq!(config.export.destination, "Selection");
        assert_eq!(config.preview.max_dimension, 1280);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = parse_config("[preview]\nmax_dimensions = 10\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        assert!(parse_config("[preview]\nquality = 1.5\n").is_err());
        assert!(parse_config("[export]\nquality = 0.0\n").is_err());
    }

    #[test]
    fn validation_catches_bad_zoom() {
        let result = parse_config("[culling]\nzoom_level = 1.0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        let result = parse_config("[culling]\nzoom_level = 3.0\nmax_zoom = 2.0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_catches_blank_destination() {
        let result = parse_config("[export]\ndestination = \"  \"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn settings_convert_units() {
        let config = CullConfig::default();
        assert_eq!(
            config.preview_settings().fill_delay,
            Duration::from_millis(50)
        );
        assert_eq!(
            config.culling_settings().auto_advance,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.preview.progress_every, 5);
    }

    #[test]
    fn load_reads_implicit_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[export]\ndestination = \"Keepers\"\n",
        )
        .unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.export.destination, "Keepers");
    }

    #[test]
    fn load_missing_explicit_file_errors() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")), tmp.path());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
