use cornice_core::Rect;
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN,
};

/// Returns the virtual screen: the bounding rectangle that unions all
/// monitor areas, in pixels. The origin is negative when a monitor
/// sits left of or above the primary one.
///
/// The value mutates on display or DPI changes; the engine re-queries
/// it when the overlay window receives the corresponding broadcast.
pub fn virtual_screen_bounds() -> Rect {
    // SAFETY: GetSystemMetrics is a simple query with no failure mode;
    // it returns 0 for unknown indices.
    unsafe {
        let left = GetSystemMetrics(SM_XVIRTUALSCREEN);
        let top = GetSystemMetrics(SM_YVIRTUALSCREEN);
        let width = GetSystemMetrics(SM_CXVIRTUALSCREEN);
        let height = GetSystemMetrics(SM_CYVIRTUALSCREEN);
        Rect::new(left, top, left + width, top + height)
    }
}
