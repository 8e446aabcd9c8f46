//! Snapshot production: which windows get a border, in z-order.

use cornice_core::{Rect, ServiceResult, WindowHandle};
use windows::Win32::Foundation::{HWND, LPARAM};
use windows::Win32::UI::WindowsAndMessaging::EnumWindows;
use windows::core::BOOL;

use crate::window::Window;

/// An ordered list of `(handle, frame rect)` pairs, top-most first.
/// Ephemeral: produced on demand for one refresh tick.
pub type Snapshot = Vec<(WindowHandle, Rect)>;

/// Determines whether a window should receive a border.
///
/// Mirrors the alt-tab eligibility rules: visible, not minimized, its
/// own root, not a tool window, not a reserved shell surface, and not
/// cloaked onto another virtual desktop. With `foreground_only`, the
/// window must additionally be the foreground window or its root.
fn is_candidate(window: &Window, foreground_only: bool) -> bool {
    if !window.is_visible() || window.is_minimized() {
        return false;
    }
    if !window.is_own_root() {
        return false;
    }
    if window.is_toolwindow() {
        return false;
    }
    if window.is_shell_surface() {
        return false;
    }
    if window.is_cloaked() {
        return false;
    }
    if foreground_only && !window.is_foreground_family() {
        return false;
    }
    true
}

/// Fetches a candidate's frame rect, keeping it only when it overlaps
/// the virtual screen with positive area. A handle that dies between
/// the eligibility check and the geometry query simply drops out.
fn candidate_rect(window: &Window, virtual_screen: &Rect) -> Option<Rect> {
    let rect = window.frame_rect().ok()?;
    rect.intersects(virtual_screen).then_some(rect)
}

struct EnumContext {
    virtual_screen: Rect,
    foreground_only: bool,
    snapshot: Snapshot,
}

/// Takes a snapshot of all border-eligible windows.
///
/// `EnumWindows` visits top-level windows front to back; that order is
/// preserved and is the contract the occlusion pass relies on.
pub fn snapshot(virtual_screen: &Rect, foreground_only: bool) -> ServiceResult<Snapshot> {
    let mut context = EnumContext {
        virtual_screen: *virtual_screen,
        foreground_only,
        snapshot: Vec::new(),
    };

    // SAFETY: EnumWindows calls our callback for each top-level window,
    // synchronously. We pass a pointer to our context as LPARAM (user
    // data); the callback casts it back. The context outlives the call.
    unsafe {
        EnumWindows(
            Some(enum_window_callback),
            LPARAM(&mut context as *mut _ as isize),
        )?;
    }

    Ok(context.snapshot)
}

/// Builds a snapshot from an explicit target list instead of
/// enumeration, as installed by a control-plane `HWNDS` message.
///
/// The sender picked these windows, so the eligibility rules do not
/// apply: only dead handles, windows outside the virtual screen and
/// (under `foreground_only`) windows outside the foreground family
/// are dropped. The sender's order is kept and treated as top-most
/// first.
pub fn snapshot_of_targets(
    targets: &[WindowHandle],
    virtual_screen: &Rect,
    foreground_only: bool,
) -> Snapshot {
    targets
        .iter()
        .filter_map(|&handle| {
            let window = Window::from_raw(handle);
            if !window.is_alive() {
                return None;
            }
            if foreground_only && !window.is_foreground_family() {
                return None;
            }
            candidate_rect(&window, virtual_screen).map(|rect| (handle, rect))
        })
        .collect()
}

/// Callback invoked by `EnumWindows` for each top-level window.
///
/// Returns `TRUE` to continue enumeration.
unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    // SAFETY: lparam is the pointer to our EnumContext, cast in
    // snapshot().
    let context = unsafe { &mut *(lparam.0 as *mut EnumContext) };

    let window = Window::new(hwnd);
    if is_candidate(&window, context.foreground_only)
        && let Some(rect) = candidate_rect(&window, &context.virtual_screen)
    {
        context.snapshot.push((window.raw(), rect));
    }

    BOOL(1) // TRUE, continue enumerating
}
