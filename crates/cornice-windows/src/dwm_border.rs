//! Native per-window border styling (Windows 11+).
//!
//! In this render mode the compositor overlay stays out of the
//! picture: each tracked window gets its border color and frame
//! thickness set through DWM window attributes, plus the configured
//! corner preference. The cache's applied-style records keep
//! unchanged windows from being re-set every tick.

use cornice_core::{AppliedStyle, Config, Rect, TrackedCache, WindowHandle};
use windows::Win32::Foundation::COLORREF;

use crate::frame;
use crate::window::Window;

/// Pushes the configured style to every window in the snapshot that
/// does not already carry it.
pub fn apply_borders(snapshot: &[(WindowHandle, Rect)], cache: &mut TrackedCache, config: &Config) {
    let style = AppliedStyle {
        color: config.color.to_colorref(),
        thickness: (config.thickness as i32).clamp(1, 1000),
    };

    for &(handle, _) in snapshot {
        if cache.applied(handle) == Some(style) {
            continue;
        }
        let window = Window::from_raw(handle);
        if !window.is_alive() {
            continue;
        }
        if frame::set_border_style(window.hwnd(), COLORREF(style.color), style.thickness) {
            frame::set_corner_preference(window.hwnd(), config.corner);
            cache.set_applied(handle, style);
        } else {
            cornice_core::log_debug!("window {handle:#x} rejected border attributes");
        }
    }
}
