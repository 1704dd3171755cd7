//! Configuration for spinner and refresh control
//!
//! Stored as TOML, by default in `<config_dir>/spring/config.toml`.
//! Every field has a default, so partial files are fine.

use crate::animator::SpinnerStyle;
use crate::error::CoreError;
use crate::geometry::{Bounds, LineColor};
use crate::refresher::{DEFAULT_CONTENT_HEIGHT, DEFAULT_INDICATOR_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Standalone spinner appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinnerSettings {
    pub line_width: f64,
    pub line_color: LineColor,
    pub rotate_duration_secs: f64,
    pub stroke_duration_secs: f64,
    /// Start spinning as soon as the spinner is first shown
    pub autostart: bool,
}

impl Default for SpinnerSettings {
    fn default() -> Self {
        Self::from_style(&SpinnerStyle::default())
    }
}

impl SpinnerSettings {
    fn from_style(style: &SpinnerStyle) -> Self {
        Self {
            line_width: style.line_width,
            line_color: style.line_color,
            rotate_duration_secs: style.rotate_duration.as_secs_f64(),
            stroke_duration_secs: style.stroke_duration.as_secs_f64(),
            autostart: false,
        }
    }

    pub fn style(&self) -> SpinnerStyle {
        let fallback = SpinnerStyle::default();
        SpinnerStyle {
            line_width: self.line_width,
            line_color: self.line_color,
            rotate_duration: secs_or(self.rotate_duration_secs, fallback.rotate_duration),
            stroke_duration: secs_or(self.stroke_duration_secs, fallback.stroke_duration),
        }
    }

    fn validate(&self, section: &str) -> Result<(), CoreError> {
        if self.line_width.is_nan() || self.line_width < 0.0 {
            return Err(CoreError::invalid(format!(
                "{section}.line_width must be >= 0, got {}",
                self.line_width
            )));
        }
        positive(section, "rotate_duration_secs", self.rotate_duration_secs)?;
        positive(section, "stroke_duration_secs", self.stroke_duration_secs)
    }
}

/// Refresh control geometry and indicator appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefresherSettings {
    /// Height of the control and of the inset reserved while refreshing
    pub content_height: f64,
    /// Side length of the square indicator
    pub indicator_size: f64,
    pub line_width: f64,
    pub line_color: LineColor,
    pub rotate_duration_secs: f64,
    pub stroke_duration_secs: f64,
}

impl Default for RefresherSettings {
    fn default() -> Self {
        let style = SpinnerStyle::refresher();
        Self {
            content_height: DEFAULT_CONTENT_HEIGHT,
            indicator_size: DEFAULT_INDICATOR_SIZE,
            line_width: style.line_width,
            line_color: style.line_color,
            rotate_duration_secs: style.rotate_duration.as_secs_f64(),
            stroke_duration_secs: style.stroke_duration.as_secs_f64(),
        }
    }
}

impl RefresherSettings {
    pub fn style(&self) -> SpinnerStyle {
        let fallback = SpinnerStyle::refresher();
        SpinnerStyle {
            line_width: self.line_width,
            line_color: self.line_color,
            rotate_duration: secs_or(self.rotate_duration_secs, fallback.rotate_duration),
            stroke_duration: secs_or(self.stroke_duration_secs, fallback.stroke_duration),
        }
    }

    pub fn indicator_bounds(&self) -> Bounds {
        Bounds::new(self.indicator_size, self.indicator_size)
    }

    fn validate(&self) -> Result<(), CoreError> {
        positive("refresher", "content_height", self.content_height)?;
        positive("refresher", "indicator_size", self.indicator_size)?;
        if self.indicator_size > self.content_height {
            return Err(CoreError::invalid(format!(
                "refresher.indicator_size ({}) exceeds content_height ({})",
                self.indicator_size, self.content_height
            )));
        }
        SpinnerSettings {
            line_width: self.line_width,
            line_color: self.line_color,
            rotate_duration_secs: self.rotate_duration_secs,
            stroke_duration_secs: self.stroke_duration_secs,
            autostart: false,
        }
        .validate("refresher")
    }
}

/// Initial frame of a standalone spinner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    pub width: f64,
    pub height: f64,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 40.0,
        }
    }
}

impl FrameSettings {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

/// Complete spring configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub spinner: SpinnerSettings,
    pub refresher: RefresherSettings,
    pub frame: FrameSettings,
}

impl SpringConfig {
    /// `<config_dir>/spring/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("spring").join("config.toml"))
    }

    /// Parse and validate TOML text; `path` is only used in error messages
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, CoreError> {
        let config: SpringConfig =
            toml::from_str(content).map_err(|source| CoreError::ConfigParse {
                path: path.to_path_buf(),
                message: source.message().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, failing on I/O, parse or validation errors
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content, path)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from `path`, falling back to defaults on any error (graceful degradation)
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(CoreError::ConfigRead { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Cannot load config, using defaults");
                Self::default()
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|source| CoreError::ConfigSerialize {
            message: source.to_string(),
            source,
        })
    }

    /// Write the configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let content = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::ConfigWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| CoreError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.spinner.validate("spinner")?;
        self.refresher.validate()?;
        positive("frame", "width", self.frame.width)?;
        positive("frame", "height", self.frame.height)
    }
}

fn positive(section: &str, field: &str, value: f64) -> Result<(), CoreError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::invalid(format!(
            "{section}.{field} must be a positive number, got {value}"
        )))
    }
}

fn secs_or(secs: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(fallback)
}
