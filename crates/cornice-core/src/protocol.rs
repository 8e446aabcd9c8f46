//! Control-plane wire protocol.
//!
//! Messages arrive as plain text (decoded from the host window's
//! UTF-16 data channel). Two families:
//!
//! - Settings: space-separated `key=value` tokens with
//!   case-insensitive keys (`color`, `thickness`, `corner`,
//!   `foregroundonly`). Invalid fields are rejected individually with
//!   a warn; the valid remainder still applies.
//! - Target list: the literal prefix `HWNDS ` followed by
//!   space-separated hex handles. An empty list clears a previously
//!   installed override.

use crate::cache::WindowHandle;
use crate::color::Color;
use crate::config::{CornerToken, SettingsUpdate, thickness_in_range};

/// Prefix selecting the target-list message family.
pub const TARGETS_PREFIX: &str = "HWNDS ";

/// A decoded control-plane message.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    Settings(SettingsUpdate),
    /// Explicit set of windows to border, superseding enumeration
    /// until cleared. Handles are raw; validity is checked by the
    /// receiver, which can ask the OS.
    Targets(Vec<WindowHandle>),
}

/// Parses one control-plane payload.
pub fn parse(text: &str) -> ControlMessage {
    if let Some(rest) = text.strip_prefix(TARGETS_PREFIX) {
        return ControlMessage::Targets(parse_targets(rest));
    }
    if text.trim() == TARGETS_PREFIX.trim_end() {
        // Bare "HWNDS": clear the override.
        return ControlMessage::Targets(Vec::new());
    }
    ControlMessage::Settings(parse_settings(text))
}

/// Parses `key=value` settings tokens. Every invalid field logs a
/// warn and is dropped; valid fields survive.
pub fn parse_settings(text: &str) -> SettingsUpdate {
    let mut update = SettingsUpdate::default();

    for token in text.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            crate::log_warn!("control: malformed token {token:?}");
            continue;
        };

        match key.to_ascii_lowercase().as_str() {
            "color" => match Color::from_hex(value) {
                Some(color) => update.color = Some(color),
                None => crate::log_warn!("control: invalid color {value:?}"),
            },
            "thickness" => match value.parse::<f32>() {
                Ok(v) if thickness_in_range(v) => update.thickness = Some(v),
                _ => crate::log_warn!("control: thickness {value:?} out of range"),
            },
            "corner" => match CornerToken::parse(value) {
                Some(corner) => update.corner = Some(corner),
                None => crate::log_warn!("control: unknown corner {value:?}"),
            },
            "foregroundonly" => match parse_bool(value) {
                Some(flag) => update.foreground_only = Some(flag),
                None => crate::log_warn!("control: invalid foregroundonly {value:?}"),
            },
            other => crate::log_warn!("control: unknown key {other:?}"),
        }
    }

    update
}

/// Accepted boolean spellings for `foregroundonly`, shared with the
/// CLI flag of the same name.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Parses hex handles (`0x` prefix optional). Unparseable tokens are
/// skipped silently, a stale sender is not an error.
fn parse_targets(rest: &str) -> Vec<WindowHandle> {
    rest.split_whitespace()
        .filter_map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u64::from_str_radix(digits, 16).ok().map(|v| v as WindowHandle)
        })
        .collect()
}

/// Retains the handles the receiver considers valid. The predicate is
/// injected so the platform layer can ask the OS while tests stay
/// hermetic.
pub fn filter_targets(
    handles: Vec<WindowHandle>,
    mut is_valid: impl FnMut(WindowHandle) -> bool,
) -> Vec<WindowHandle> {
    handles.into_iter().filter(|&h| is_valid(h)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_update_parses_all_fields() {
        let update = parse_settings("color=#80FF0000 thickness=2.5 corner=round foregroundonly=1");
        assert_eq!(update.color, Color::from_hex("#80ff0000"));
        assert_eq!(update.thickness, Some(2.5));
        assert_eq!(update.corner, Some(CornerToken::Round));
        assert_eq!(update.foreground_only, Some(true));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let update = parse_settings("COLOR=#112233 ForegroundOnly=off");
        assert_eq!(update.color, Color::from_hex("#112233"));
        assert_eq!(update.foreground_only, Some(false));
    }

    #[test]
    fn invalid_fields_are_dropped_individually() {
        let update = parse_settings("thickness=0 color=#00ff00 corner=hexagon");
        assert_eq!(update.thickness, None);
        assert_eq!(update.color, Color::from_hex("#00ff00"));
        assert_eq!(update.corner, None);
    }

    #[test]
    fn out_of_range_thickness_leaves_config_unchanged() {
        let mut config = crate::Config::default();
        let before = config;

        config.apply(&parse_settings("thickness=0"));
        config.apply(&parse_settings("thickness=1000.1"));

        assert_eq!(config, before);
    }

    #[test]
    fn boolean_spellings() {
        for (text, expected) in [
            ("foregroundonly=1", Some(true)),
            ("foregroundonly=true", Some(true)),
            ("foregroundonly=ON", Some(true)),
            ("foregroundonly=0", Some(false)),
            ("foregroundonly=false", Some(false)),
            ("foregroundonly=off", Some(false)),
            ("foregroundonly=maybe", None),
        ] {
            assert_eq!(parse_settings(text).foreground_only, expected, "{text}");
        }
    }

    #[test]
    fn targets_message_parses_hex_handles() {
        let message = parse("HWNDS 0xAB 0xCD");
        assert_eq!(message, ControlMessage::Targets(vec![0xAB, 0xCD]));

        // Prefix is optional per token; junk is skipped.
        let message = parse("HWNDS ab 0Xcd zz");
        assert_eq!(message, ControlMessage::Targets(vec![0xAB, 0xCD]));
    }

    #[test]
    fn invalid_targets_are_filtered_by_the_receiver() {
        let ControlMessage::Targets(handles) = parse("HWNDS 0xAB 0xCD") else {
            panic!("expected targets");
        };
        // 0xAB is no longer a window; 0xCD still is.
        let valid = filter_targets(handles, |h| h == 0xCD);
        assert_eq!(valid, vec![0xCD]);
    }

    #[test]
    fn bare_prefix_clears_the_override() {
        assert_eq!(parse("HWNDS"), ControlMessage::Targets(Vec::new()));
        assert_eq!(parse("HWNDS "), ControlMessage::Targets(Vec::new()));
    }

    #[test]
    fn non_prefixed_text_is_settings() {
        let message = parse("thickness=4");
        assert!(matches!(message, ControlMessage::Settings(u) if u.thickness == Some(4.0)));
    }
}
