//! Border appearance and engine tuning configuration.
//!
//! `Config` is a plain value: the engine reads it once at the start of
//! a refresh tick, and control-plane updates replace fields under a
//! single assignment point on the UI thread, so a tick never observes
//! a torn update. The on-disk form (`FileConfig`) lives in
//! `~/.config/cornice/config.toml` and is read once at startup; the
//! engine itself never writes it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::log::LogConfig;

/// Corner treatment for drawn borders, mirroring the DWM corner
/// preference tokens.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CornerToken {
    /// System default. Drawn sharp; DWM decides for attribute mode.
    #[default]
    Default,
    /// Explicitly square.
    DoNot,
    /// Standard rounding.
    Round,
    /// Subtle rounding.
    RoundSmall,
}

impl CornerToken {
    /// Parses a wire/CLI token, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "donot" => Some(Self::DoNot),
            "round" => Some(Self::Round),
            "roundsmall" => Some(Self::RoundSmall),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::DoNot => "donot",
            Self::Round => "round",
            Self::RoundSmall => "roundsmall",
        }
    }

    /// Pixel radius associated with the token.
    pub fn radius(self) -> f32 {
        match self {
            Self::Default => 8.0,
            Self::DoNot => 0.0,
            Self::Round => 12.0,
            Self::RoundSmall => 6.0,
        }
    }

    /// Whether the overlay draws a rounded stroke. `Default` keeps a
    /// sharp stroke even though it carries a nominal radius; only an
    /// explicit rounding request changes the drawn shape.
    pub fn is_rounded(self) -> bool {
        matches!(self, Self::Round | Self::RoundSmall)
    }
}

/// Requested render mode before OS capability resolution.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ModePreference {
    /// Native per-window border attributes when the OS supports them,
    /// else the composited overlay.
    #[default]
    Auto,
    /// Force per-window DWM border attributes.
    Dwm,
    /// Force the DirectComposition overlay.
    DComp,
}

impl ModePreference {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "dwm" => Some(Self::Dwm),
            "dcomp" => Some(Self::DComp),
            _ => None,
        }
    }
}

/// Runtime configuration, consulted on every refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub color: Color,
    /// Stroke width in pixels. Kept within `(0, 1000)`.
    pub thickness: f32,
    pub corner: CornerToken,
    /// Border only the foreground window and its root family.
    pub foreground_only: bool,
    /// Dirty-area fraction below which a partial redraw is used.
    pub partial_redraw_ratio: f32,
    /// Merge overlapping window rectangles before drawing.
    pub merge_overlapping: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: Color::new(0xFF, 0x00, 0xCC, 0xFF),
            thickness: 3.0,
            corner: CornerToken::Default,
            foreground_only: false,
            partial_redraw_ratio: 0.25,
            merge_overlapping: false,
        }
    }
}

/// Validates a thickness value from any input surface (wire, CLI,
/// config file). The bounds are exclusive: zero-width and kilometer
/// borders are rejected rather than clamped.
pub fn thickness_in_range(value: f32) -> bool {
    value.is_finite() && value > 0.0 && value < 1000.0
}

/// A partial update produced by the control plane or CLI overrides.
/// Absent fields leave the current value untouched.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SettingsUpdate {
    pub color: Option<Color>,
    pub thickness: Option<f32>,
    pub corner: Option<CornerToken>,
    pub foreground_only: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.thickness.is_none()
            && self.corner.is_none()
            && self.foreground_only.is_none()
    }
}

impl Config {
    /// Applies a validated update. Returns whether anything changed;
    /// the scheduler uses this to force a full redraw on style changes.
    pub fn apply(&mut self, update: &SettingsUpdate) -> bool {
        let before = *self;
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(thickness) = update.thickness {
            self.thickness = thickness;
        }
        if let Some(corner) = update.corner {
            self.corner = corner;
        }
        if let Some(foreground_only) = update.foreground_only {
            self.foreground_only = foreground_only;
        }
        *self != before
    }
}

/// On-disk configuration. Colors and corner tokens stay strings here
/// and are resolved (with warnings) into the typed `Config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Border color, `#RRGGBB` or `#AARRGGBB`.
    pub color: String,
    pub thickness: f32,
    /// One of `default`, `donot`, `round`, `roundsmall`.
    pub corner: String,
    pub foreground_only: bool,
    pub partial_redraw_ratio: f32,
    pub merge_overlapping: bool,
    pub logging: LogConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            color: defaults.color.to_hex(),
            thickness: defaults.thickness,
            corner: defaults.corner.as_str().to_string(),
            foreground_only: defaults.foreground_only,
            partial_redraw_ratio: defaults.partial_redraw_ratio,
            merge_overlapping: defaults.merge_overlapping,
            logging: LogConfig::default(),
        }
    }
}

impl FileConfig {
    /// Resolves the string fields into a runtime `Config`, falling
    /// back to defaults (with a warn) for anything malformed.
    pub fn resolve(&self) -> Config {
        let defaults = Config::default();
        let color = Color::from_hex(&self.color).unwrap_or_else(|| {
            crate::log_warn!("config: invalid color {:?}", self.color);
            defaults.color
        });
        let corner = CornerToken::parse(&self.corner).unwrap_or_else(|| {
            crate::log_warn!("config: invalid corner {:?}", self.corner);
            defaults.corner
        });
        let thickness = if thickness_in_range(self.thickness) {
            self.thickness
        } else {
            crate::log_warn!("config: thickness {} out of range", self.thickness);
            defaults.thickness
        };
        Config {
            color,
            thickness,
            corner,
            foreground_only: self.foreground_only,
            partial_redraw_ratio: self.partial_redraw_ratio.clamp(0.0, 1.0),
            merge_overlapping: self.merge_overlapping,
        }
    }
}

/// Returns the config directory: `~/.config/cornice/`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(|h| PathBuf::from(h).join(".config").join("cornice"))
}

/// Returns the config file path: `~/.config/cornice/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Tries to load and parse `config.toml`.
pub fn try_load() -> Result<FileConfig, String> {
    let path = config_path().ok_or("could not determine config path")?;
    let content = std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    toml::from_str(&content).map_err(|e| format!("{}: {e}", path.display()))
}

/// Loads the configuration from disk, falling back to defaults.
///
/// A missing file silently returns defaults; a malformed one is
/// logged and ignored.
pub fn load() -> FileConfig {
    match try_load() {
        Ok(config) => config,
        Err(reason) => {
            if config_path().is_some_and(|p| p.exists()) {
                crate::log_warn!("config load failed: {reason}");
            }
            FileConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();
        assert_eq!(config.color.to_hex(), "#ff00ccff");
        assert_eq!(config.thickness, 3.0);
        assert_eq!(config.corner, CornerToken::Default);
        assert!(!config.foreground_only);
        assert_eq!(config.partial_redraw_ratio, 0.25);
    }

    #[test]
    fn corner_tokens_map_to_radii() {
        assert_eq!(CornerToken::Default.radius(), 8.0);
        assert_eq!(CornerToken::DoNot.radius(), 0.0);
        assert_eq!(CornerToken::Round.radius(), 12.0);
        assert_eq!(CornerToken::RoundSmall.radius(), 6.0);
        assert!(!CornerToken::Default.is_rounded());
        assert!(!CornerToken::DoNot.is_rounded());
        assert!(CornerToken::Round.is_rounded());
        assert!(CornerToken::RoundSmall.is_rounded());
    }

    #[test]
    fn corner_parse_is_case_insensitive() {
        assert_eq!(CornerToken::parse("ROUNDSMALL"), Some(CornerToken::RoundSmall));
        assert_eq!(CornerToken::parse("Round"), Some(CornerToken::Round));
        assert_eq!(CornerToken::parse("bevel"), None);
    }

    #[test]
    fn thickness_bounds_are_exclusive() {
        assert!(!thickness_in_range(0.0));
        assert!(!thickness_in_range(-1.0));
        assert!(!thickness_in_range(1000.0));
        assert!(!thickness_in_range(1000.1));
        assert!(!thickness_in_range(f32::NAN));
        assert!(thickness_in_range(0.5));
        assert!(thickness_in_range(999.9));
    }

    #[test]
    fn apply_reports_changes_and_skips_absent_fields() {
        let mut config = Config::default();
        let update = SettingsUpdate {
            thickness: Some(5.0),
            ..Default::default()
        };
        assert!(config.apply(&update));
        assert_eq!(config.thickness, 5.0);
        assert_eq!(config.color, Config::default().color);

        // Re-applying the same value is not a change.
        assert!(!config.apply(&update));
    }

    #[test]
    fn partial_file_uses_defaults_for_missing_fields() {
        let file: FileConfig = toml::from_str("thickness = 6.5").unwrap();
        assert_eq!(file.thickness, 6.5);
        assert_eq!(file.color, Config::default().color.to_hex());

        let resolved = file.resolve();
        assert_eq!(resolved.thickness, 6.5);
        assert_eq!(resolved.corner, CornerToken::Default);
    }

    #[test]
    fn resolve_rejects_bad_fields_individually() {
        let file = FileConfig {
            color: "notacolor".into(),
            thickness: -4.0,
            corner: "round".into(),
            ..Default::default()
        };
        let resolved = file.resolve();
        assert_eq!(resolved.color, Config::default().color);
        assert_eq!(resolved.thickness, Config::default().thickness);
        assert_eq!(resolved.corner, CornerToken::Round);
    }
}
