/// The DirectComposition renderer.
pub mod compositor;

/// `--console` support.
pub mod console;

/// Out-of-process control-plane transport (sender side).
pub mod control;

/// DPI awareness setup.
pub mod dpi;

/// Native DWM border attributes (Windows 11 render mode).
pub mod dwm_border;

/// The refresh engine and render-mode dispatch.
pub mod engine;

/// Win32 window enumeration and snapshots.
pub mod enumerate;

/// WinEvent hooks and refresh coalescing.
pub mod event_hook;

/// DWM frame bounds and window attributes.
pub mod frame;

/// Virtual-screen metrics.
pub mod monitor;

/// The transparent click-through host window.
pub mod overlay;

/// Service startup, message pump, and teardown.
pub mod service;

/// Tray icon.
pub mod tray;

/// Window type wrapping a Win32 `HWND`.
pub mod window;

pub use service::{RunOptions, StartupError, run};
pub use window::Window;
