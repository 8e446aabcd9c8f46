use cornice_core::{Rect, ServiceResult, WindowHandle};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    GA_ROOT, GWL_EXSTYLE, GetAncestor, GetForegroundWindow, GetWindowLongPtrW, IsIconic, IsWindow,
    IsWindowVisible, RealGetWindowClassW, WS_EX_TOOLWINDOW,
};

use crate::frame;

/// Shell-reserved window classes that must never get a border: the
/// taskbar, the desktop manager, and the wallpaper worker.
const SHELL_CLASSES: [&str; 3] = ["Shell_TrayWnd", "Progman", "WorkerW"];

/// A top-level window, wrapping a Win32 `HWND`.
///
/// `HWND` is an opaque handle — a number that identifies a window to
/// the OS. This struct holds that handle and queries the OS lazily;
/// every query can race a window being destroyed, which is why the
/// engine re-validates handles each snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    hwnd: HWND,
}

impl Window {
    /// Creates a new `Window` from a raw `HWND`.
    pub fn new(hwnd: HWND) -> Self {
        Self { hwnd }
    }

    /// Creates a new `Window` from a raw handle value (pointer-sized
    /// integer), e.g. one received over the control plane.
    pub fn from_raw(handle: WindowHandle) -> Self {
        Self {
            hwnd: HWND(handle as *mut _),
        }
    }

    /// Returns the raw window handle.
    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Returns the handle as the core's opaque key type.
    pub fn raw(&self) -> WindowHandle {
        self.hwnd.0 as WindowHandle
    }

    /// Whether the handle still refers to a window at all.
    pub fn is_alive(&self) -> bool {
        // SAFETY: IsWindow is a simple query.
        unsafe { IsWindow(Some(self.hwnd)).as_bool() }
    }

    pub fn is_visible(&self) -> bool {
        // SAFETY: IsWindowVisible is a simple query.
        unsafe { IsWindowVisible(self.hwnd).as_bool() }
    }

    pub fn is_minimized(&self) -> bool {
        // SAFETY: IsIconic is a simple query.
        unsafe { IsIconic(self.hwnd).as_bool() }
    }

    /// Whether this window is its own root, i.e. it has no owner above
    /// it. Owned popups and dialogs get no border of their own.
    pub fn is_own_root(&self) -> bool {
        // SAFETY: GetAncestor reads the window hierarchy.
        unsafe { GetAncestor(self.hwnd, GA_ROOT) == self.hwnd }
    }

    pub fn is_toolwindow(&self) -> bool {
        // SAFETY: GetWindowLongPtrW reads the extended style bits.
        unsafe {
            let ex_style = GetWindowLongPtrW(self.hwnd, GWL_EXSTYLE) as u32;
            (ex_style & WS_EX_TOOLWINDOW.0) == WS_EX_TOOLWINDOW.0
        }
    }

    pub fn is_cloaked(&self) -> bool {
        frame::is_cloaked(self.hwnd)
    }

    /// Returns the window class name.
    pub fn class(&self) -> String {
        // SAFETY: RealGetWindowClassW reads the window class name.
        // 256 is the maximum class name length in Win32.
        unsafe {
            let mut buffer = [0u16; 256];
            let length = RealGetWindowClassW(self.hwnd, &mut buffer);
            String::from_utf16_lossy(&buffer[..length as usize])
        }
    }

    /// Whether the class is one of the shell surfaces we never border.
    pub fn is_shell_surface(&self) -> bool {
        let class = self.class();
        SHELL_CLASSES.iter().any(|&c| class == c)
    }

    /// The window's visible bounds (extended frame, shadow excluded).
    pub fn frame_rect(&self) -> ServiceResult<Rect> {
        frame::visible_rect(self.hwnd)
    }

    /// Whether this window is the foreground window or the root the
    /// foreground window belongs to.
    pub fn is_foreground_family(&self) -> bool {
        // SAFETY: both calls are simple queries.
        unsafe {
            let foreground = GetForegroundWindow();
            if foreground.is_invalid() {
                return false;
            }
            self.hwnd == foreground || GetAncestor(foreground, GA_ROOT) == self.hwnd
        }
    }
}
