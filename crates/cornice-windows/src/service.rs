//! Service entry point: startup, the message pump, and teardown.

use std::sync::Arc;
use std::sync::mpsc;

use cornice_core::{Config, ModePreference, log::LogConfig};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, MSG, TranslateMessage, WM_TIMER,
};

use crate::compositor::{Compositor, CreateError};
use crate::engine::{Engine, EngineMsg, RenderMode, resolve_mode};
use crate::event_hook::{self, RefreshPoster};
use crate::overlay::{OverlayWindow, WM_APP_REFRESH};
use crate::{console, dpi, monitor, tray};

/// Fatal startup failures, each with its process exit code.
#[derive(Debug)]
pub enum StartupError {
    /// Host window class registration or creation failed.
    HostWindow(String),
    /// A graphics device could not be created.
    Device(CreateError),
}

impl StartupError {
    /// Negative exit codes: D3D, D2D, composition, then the host
    /// window.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Device(CreateError::D3D(_)) => -1,
            Self::Device(CreateError::D2D(_)) => -2,
            Self::Device(CreateError::Composition(_)) => -3,
            Self::HostWindow(_) => -4,
        }
    }
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HostWindow(e) => write!(f, "host window creation failed: {e}"),
            Self::Device(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Options resolved from the config file and CLI flags.
pub struct RunOptions {
    pub config: Config,
    pub logging: LogConfig,
    pub mode: ModePreference,
    pub console: bool,
}

/// Runs the border service until the tray Exit or `WM_QUIT`.
pub fn run(options: RunOptions) -> Result<(), StartupError> {
    if options.console {
        console::attach();
    }
    cornice_core::log::init(&options.logging, options.console);
    dpi::enable_dpi_awareness();

    let mode = resolve_mode(options.mode);
    cornice_core::log_info!(
        "cornice starting (PID {}), mode {:?}",
        std::process::id(),
        mode
    );

    let virtual_screen = monitor::virtual_screen_bounds();
    let (inbox_tx, inbox_rx) = mpsc::channel::<EngineMsg>();

    let overlay = OverlayWindow::create(
        &virtual_screen,
        mode == RenderMode::Composited,
        inbox_tx,
    )
    .map_err(|e| StartupError::HostWindow(e.to_string()))?;

    let compositor = if mode == RenderMode::Composited {
        Some(Compositor::new(overlay.hwnd()).map_err(StartupError::Device)?)
    } else {
        None
    };

    let poster = Arc::new(RefreshPoster::new(overlay.hwnd()));
    let _tray = tray::install(overlay.hwnd());

    let mut engine = Engine::new(
        mode,
        options.config,
        overlay,
        compositor,
        inbox_rx,
        Arc::clone(&poster),
    );

    // First borders before the first event arrives.
    engine.tick();

    let mut hooks = event_hook::install(Arc::downgrade(&poster));

    run_message_pump(&mut engine);

    // Shutdown: scheduler off first, then hooks, then the composition
    // tree; the host window goes last with the engine drop.
    poster.disarm();
    hooks.uninstall();
    engine.shutdown();
    cornice_core::log_info!("cornice stopped");

    Ok(())
}

/// The Win32 message pump. Refresh requests and the safety timer are
/// intercepted here; everything else flows to the wndprocs. Blocks
/// until `WM_QUIT`.
fn run_message_pump(engine: &mut Engine) {
    let mut msg = MSG::default();

    // SAFETY: standard message pump; GetMessageW returns 0 on WM_QUIT.
    while unsafe { GetMessageW(&mut msg, None, 0, 0).as_bool() } {
        if msg.message == WM_APP_REFRESH || msg.message == WM_TIMER {
            engine.tick();
            continue;
        }

        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
