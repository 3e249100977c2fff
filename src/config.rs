//! Configuration system

use std::path::Path;
use std::str::FromStr;

pub use serde::{Deserialize, Serialize};

use crate::entities::{Mode, Rgba, Viewport};
use crate::error::BackdropError;
use crate::sprites::DEFAULT_ANGLE_STEP;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` file
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config = toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a `.toml` file
    fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("toml")
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

// ── Theme ────────────────────────────────────────────────────────────────────

/// Sky colour behind the stars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Red,
    Blue,
    Black,
}

impl Theme {
    pub fn background(self) -> Rgba {
        match self {
            Theme::Red => Rgba::rgb(24, 2, 6),
            Theme::Blue => Rgba::rgb(10, 16, 32),
            Theme::Black => Rgba::rgb(0, 0, 0),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Theme::Red),
            "blue" => Ok(Theme::Blue),
            "black" => Ok(Theme::Black),
            other => Err(format!("unknown theme '{other}' (expected red, blue or black)")),
        }
    }
}

// ── Backdrop config ──────────────────────────────────────────────────────────

pub const DEFAULT_FPS: u32 = 30;

/// Largest accepted canvas side, in pixels.
pub const MAX_VIEWPORT_SIDE: u32 = 8192;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub theme: Theme,
    pub fps: u32,
    /// Degrees between cached sprite rotations.
    pub angle_step: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            fps: DEFAULT_FPS,
            angle_step: DEFAULT_ANGLE_STEP,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteConfig {
    /// Spawn this mode as soon as the backdrop starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_mode: Option<Mode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropConfig {
    /// Fixed RNG seed; entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub display: DisplayConfig,
    pub vignette: VignetteConfig,
}

impl Config for BackdropConfig {}

impl BackdropConfig {
    /// Frames per second, never below 1.
    pub fn fps(&self) -> u32 {
        self.display.fps.max(1)
    }

    /// Rotation step in degrees, never below 1.
    pub fn angle_step(&self) -> u32 {
        self.display.angle_step.max(1)
    }

    pub fn background(&self) -> Rgba {
        self.display.theme.background()
    }
}

/// Parse a `WIDTHxHEIGHT` size such as `800x480`.  Each side must be in
/// `1..=MAX_VIEWPORT_SIDE`.
pub fn parse_size(text: &str) -> Result<Viewport, BackdropError> {
    let invalid = || BackdropError::InvalidSize(text.to_string());
    let (w, h) = text
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    let side = 1..=MAX_VIEWPORT_SIDE;
    if !side.contains(&width) || !side.contains(&height) {
        return Err(invalid());
    }
    Ok(Viewport::new(width, height))
}
