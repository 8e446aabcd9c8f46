//! DWM window attributes: frame bounds, cloaking, border styling.

use std::mem;

use cornice_core::{CornerToken, Rect, ServiceResult};
use windows::Win32::Foundation::{COLORREF, HWND, RECT};
use windows::Win32::Graphics::Dwm::{
    DWMWA_CLOAKED, DWMWA_EXTENDED_FRAME_BOUNDS, DWMWINDOWATTRIBUTE, DwmGetWindowAttribute,
    DwmSetWindowAttribute,
};
use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};
use windows::Win32::System::SystemInformation::OSVERSIONINFOW;
use windows::Win32::UI::WindowsAndMessaging::GetWindowRect;
use windows::core::{s, w};

/// `DWMWA_WINDOW_CORNER_PREFERENCE` attribute (Windows 11 22H2+).
///
/// Wraps the raw value 33 in a `DWMWINDOWATTRIBUTE` since the
/// `windows` crate v0.61 does not yet expose this constant.
const DWMWA_WINDOW_CORNER_PREFERENCE: DWMWINDOWATTRIBUTE = DWMWINDOWATTRIBUTE(33);

/// `DWMWA_BORDER_COLOR` attribute (Windows 11+), raw value 34.
const DWMWA_BORDER_COLOR: DWMWINDOWATTRIBUTE = DWMWINDOWATTRIBUTE(34);

/// `DWMWA_VISIBLE_FRAME_BORDER_THICKNESS` attribute (Windows 11+),
/// raw value 37.
const DWMWA_VISIBLE_FRAME_BORDER_THICKNESS: DWMWINDOWATTRIBUTE = DWMWINDOWATTRIBUTE(37);

/// DWM corner preference values.
const DWMWCP_DEFAULT: u32 = 0;
const DWMWCP_DONOTROUND: u32 = 1;
const DWMWCP_ROUND: u32 = 2;
const DWMWCP_ROUNDSMALL: u32 = 3;

fn to_rect(rc: RECT) -> Rect {
    Rect::new(rc.left, rc.top, rc.right, rc.bottom)
}

/// Returns the visible bounds of a window using DWM extended frame
/// bounds, which exclude the invisible drop-shadow/resize margins.
///
/// Falls back to `GetWindowRect` if DWM is unavailable.
pub fn visible_rect(hwnd: HWND) -> ServiceResult<Rect> {
    let mut frame = RECT::default();
    let result = unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_EXTENDED_FRAME_BOUNDS,
            &mut frame as *mut RECT as *mut _,
            mem::size_of::<RECT>() as u32,
        )
    };

    if result.is_err() {
        unsafe { GetWindowRect(hwnd, &mut frame)? };
    }

    Ok(to_rect(frame))
}

/// Returns the raw window rectangle, shadow margins included.
pub fn raw_rect(hwnd: HWND) -> ServiceResult<Rect> {
    let mut rc = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut rc)? };
    Ok(to_rect(rc))
}

/// Whether the shell has cloaked the window (e.g. it lives on another
/// virtual desktop). Cloaked windows still report as visible.
pub fn is_cloaked(hwnd: HWND) -> bool {
    let mut cloaked: u32 = 0;
    let result = unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_CLOAKED,
            &mut cloaked as *mut u32 as *mut _,
            mem::size_of::<u32>() as u32,
        )
    };
    result.is_ok() && cloaked != 0
}

/// Sets a window's native border color and visible frame thickness.
///
/// Returns `true` if at least one of the two attributes was accepted;
/// older builds reject both and the caller falls back to nothing;
/// mode selection has already ruled this path out there.
pub fn set_border_style(hwnd: HWND, color: COLORREF, thickness: i32) -> bool {
    let set_color = unsafe {
        DwmSetWindowAttribute(
            hwnd,
            DWMWA_BORDER_COLOR,
            &color as *const COLORREF as *const _,
            mem::size_of::<COLORREF>() as u32,
        )
    };
    let set_thickness = unsafe {
        DwmSetWindowAttribute(
            hwnd,
            DWMWA_VISIBLE_FRAME_BORDER_THICKNESS,
            &thickness as *const i32 as *const _,
            mem::size_of::<i32>() as u32,
        )
    };
    set_color.is_ok() || set_thickness.is_ok()
}

/// Applies a rounded-corner preference to a window via DWM.
///
/// Fails silently on Windows 10 where the attribute does not exist.
pub fn set_corner_preference(hwnd: HWND, token: CornerToken) {
    let pref = match token {
        CornerToken::Default => DWMWCP_DEFAULT,
        CornerToken::DoNot => DWMWCP_DONOTROUND,
        CornerToken::Round => DWMWCP_ROUND,
        CornerToken::RoundSmall => DWMWCP_ROUNDSMALL,
    };
    let _ = unsafe {
        DwmSetWindowAttribute(
            hwnd,
            DWMWA_WINDOW_CORNER_PREFERENCE,
            &pref as *const u32 as *const _,
            mem::size_of::<u32>() as u32,
        )
    };
}

type RtlGetVersionFn = unsafe extern "system" fn(*mut OSVERSIONINFOW) -> i32;

/// Whether the OS exposes per-window border attributes (Windows 11,
/// build 22000+).
///
/// Asks `ntdll!RtlGetVersion` directly: unlike `GetVersionExW` it is
/// not subject to manifest-based version lies.
pub fn supports_native_borders() -> bool {
    // SAFETY: ntdll is always loaded; the transmuted signature matches
    // the documented RtlGetVersion prototype.
    unsafe {
        let Ok(ntdll) = GetModuleHandleW(w!("ntdll.dll")) else {
            return false;
        };
        let Some(proc) = GetProcAddress(ntdll, s!("RtlGetVersion")) else {
            return false;
        };
        let rtl_get_version: RtlGetVersionFn = mem::transmute(proc);

        let mut info = OSVERSIONINFOW {
            dwOSVersionInfoSize: mem::size_of::<OSVERSIONINFOW>() as u32,
            ..Default::default()
        };
        if rtl_get_version(&mut info) != 0 {
            return false;
        }
        info.dwMajorVersion > 10 || (info.dwMajorVersion == 10 && info.dwBuildNumber >= 22000)
    }
}
