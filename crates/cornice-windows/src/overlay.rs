//! The transparent, click-through host window the composition target
//! binds to.
//!
//! The window never takes input: hit tests report transparent and
//! activation requests are refused. Its wndproc handles only the
//! messages the engine cares about. Sent messages (`WM_COPYDATA`,
//! display broadcasts) are forwarded onto the engine's inbox channel,
//! while posted refresh requests and timer ticks are intercepted by
//! the service message pump before dispatch.

use std::cell::RefCell;
use std::sync::Once;
use std::sync::mpsc::Sender;

use cornice_core::{Region, ServiceResult};
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Dwm::DwmFlush;
use windows::Win32::Graphics::Gdi::{CombineRgn, CreateRectRgn, DeleteObject, RGN_OR};
use windows::Win32::System::DataExchange::COPYDATASTRUCT;
use windows::Win32::UI::WindowsAndMessaging::{
    ChangeWindowMessageFilterEx, CreateWindowExW, DefWindowProcW, DestroyWindow, HTTRANSPARENT,
    KillTimer, MA_NOACTIVATE, MSGFLT_ALLOW, MoveWindow, PostMessageW, RegisterClassW, SW_SHOWNA,
    SetTimer, SetWindowRgn, ShowWindow, WM_APP, WM_COPYDATA, WM_DISPLAYCHANGE, WM_DPICHANGED,
    WM_MOUSEACTIVATE, WM_NCHITTEST, WNDCLASSW, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_EX_TRANSPARENT, WS_POPUP,
};
use windows::core::{PCWSTR, w};

use crate::engine::EngineMsg;

/// Posted by the event hooks and the control plane to request one
/// refresh tick.
pub const WM_APP_REFRESH: u32 = WM_APP + 1;

/// Tray icon callback message.
pub const WM_APP_TRAY: u32 = WM_APP + 2;

/// Identifier of the periodic safety timer.
pub const SAFETY_TIMER_ID: usize = 1;

/// Safety tick interval. Event hooks carry the real-time updates;
/// this catches anything they miss (e.g. a hung hook chain).
const SAFETY_TIMER_MS: u32 = 150;

/// Window class of the overlay host; also how the out-of-process
/// sender finds a running engine.
pub const CLASS_NAME: PCWSTR = w!("CorniceOverlayHost");

static REGISTER_CLASS: Once = Once::new();

// Thread-local inbox sender for the wndproc. Sent messages are
// delivered on the window's own thread, so no lock is needed.
thread_local! {
    static ENGINE_SENDER: RefCell<Option<Sender<EngineMsg>>> = const { RefCell::new(None) };
}

fn ensure_class_registered() {
    REGISTER_CLASS.call_once(|| {
        let wc = WNDCLASSW {
            lpfnWndProc: Some(overlay_wnd_proc),
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };
        unsafe {
            RegisterClassW(&wc);
        }
    });
}

/// The overlay host window.
pub struct OverlayWindow {
    hwnd: HWND,
}

impl OverlayWindow {
    /// Creates the host window sized to the virtual screen.
    ///
    /// `visible` is false in the window-attribute render mode, where
    /// the window exists only as a message target for the control
    /// plane and timers.
    pub fn create(
        virtual_screen: &cornice_core::Rect,
        visible: bool,
        inbox: Sender<EngineMsg>,
    ) -> ServiceResult<Self> {
        ensure_class_registered();

        ENGINE_SENDER.with(|cell| {
            *cell.borrow_mut() = Some(inbox);
        });

        let ex = WS_EX_TRANSPARENT | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE;
        // SAFETY: standard window creation; the class was registered
        // above and the wndproc stays valid for the program lifetime.
        let hwnd = unsafe {
            CreateWindowExW(
                ex,
                CLASS_NAME,
                PCWSTR::null(),
                WS_POPUP,
                virtual_screen.left,
                virtual_screen.top,
                virtual_screen.width(),
                virtual_screen.height(),
                None,
                None,
                None,
                None,
            )?
        };

        // Let lower-integrity senders deliver WM_COPYDATA; the overlay
        // is the engine's only inbound channel.
        unsafe {
            ChangeWindowMessageFilterEx(hwnd, WM_COPYDATA, MSGFLT_ALLOW, None)?;
        }

        if visible {
            // SW_SHOWNA: show without stealing activation.
            unsafe {
                let _ = ShowWindow(hwnd, SW_SHOWNA);
            }
        }

        unsafe {
            SetTimer(Some(hwnd), SAFETY_TIMER_ID, SAFETY_TIMER_MS, None);
        }

        Ok(Self { hwnd })
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Repositions the window after a display-topology change.
    pub fn move_to(&self, virtual_screen: &cornice_core::Rect) {
        // SAFETY: MoveWindow with a valid HWND.
        unsafe {
            let _ = MoveWindow(
                self.hwnd,
                virtual_screen.left,
                virtual_screen.top,
                virtual_screen.width(),
                virtual_screen.height(),
                false,
            );
        }
    }

    /// Installs the visible-bands region as the window's clipping
    /// region. Everything drawn outside it is clipped by the system
    /// compositor, which is what makes occlusion authoritative.
    pub fn set_region(&self, region: &Region) {
        // SAFETY: regions are combined into `accumulated`, whose
        // ownership passes to the system at SetWindowRgn; the per-rect
        // regions are deleted here.
        unsafe {
            let accumulated = CreateRectRgn(0, 0, 0, 0);
            for rect in region.rects() {
                let piece = CreateRectRgn(rect.left, rect.top, rect.right, rect.bottom);
                let _ = CombineRgn(Some(accumulated), Some(accumulated), Some(piece), RGN_OR);
                let _ = DeleteObject(piece.into());
            }
            SetWindowRgn(self.hwnd, Some(accumulated), false);
            // Flush DWM to reduce perceived latency of region changes.
            let _ = DwmFlush();
        }
    }

    /// Removes the clipping region entirely.
    pub fn clear_region(&self) {
        unsafe {
            SetWindowRgn(self.hwnd, None, false);
        }
    }
}

impl Drop for OverlayWindow {
    fn drop(&mut self) {
        ENGINE_SENDER.with(|cell| {
            *cell.borrow_mut() = None;
        });
        unsafe {
            let _ = KillTimer(Some(self.hwnd), SAFETY_TIMER_ID);
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

/// Forwards a message onto the engine inbox and schedules a refresh
/// so the inbox is drained promptly.
fn forward(hwnd: HWND, msg: EngineMsg) {
    ENGINE_SENDER.with(|cell| {
        if let Some(sender) = cell.borrow().as_ref() {
            let _ = sender.send(msg);
        }
    });
    unsafe {
        let _ = PostMessageW(Some(hwnd), WM_APP_REFRESH, WPARAM(0), LPARAM(0));
    }
}

/// Decodes a `WM_COPYDATA` payload: UTF-16 text, trailing NULs
/// stripped.
fn decode_copydata(cds: &COPYDATASTRUCT) -> Option<String> {
    if cds.lpData.is_null() || cds.cbData == 0 {
        return None;
    }
    // SAFETY: the system guarantees lpData/cbData describe readable
    // memory for the duration of the message call.
    let units = unsafe {
        std::slice::from_raw_parts(cds.lpData as *const u16, cds.cbData as usize / 2)
    };
    let len = units
        .iter()
        .rposition(|&u| u != 0)
        .map_or(0, |last| last + 1);
    Some(String::from_utf16_lossy(&units[..len]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cds_for(units: &mut Vec<u16>) -> COPYDATASTRUCT {
        COPYDATASTRUCT {
            dwData: 0,
            cbData: (units.len() * 2) as u32,
            lpData: units.as_mut_ptr() as *mut _,
        }
    }

    #[test]
    fn copydata_payload_strips_trailing_nuls() {
        let mut units: Vec<u16> = "thickness=4\0\0".encode_utf16().collect();
        let cds = cds_for(&mut units);
        assert_eq!(decode_copydata(&cds).as_deref(), Some("thickness=4"));
    }

    #[test]
    fn empty_copydata_payload_is_rejected() {
        let cds = COPYDATASTRUCT {
            dwData: 0,
            cbData: 0,
            lpData: std::ptr::null_mut(),
        };
        assert_eq!(decode_copydata(&cds), None);
    }

    #[test]
    fn all_nul_payload_decodes_to_empty_string() {
        let mut units = vec![0u16; 4];
        let cds = cds_for(&mut units);
        assert_eq!(decode_copydata(&cds).as_deref(), Some(""));
    }
}

/// WNDPROC for the overlay host.
unsafe extern "system" fn overlay_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_COPYDATA => {
            // SAFETY: lparam carries a COPYDATASTRUCT pointer for the
            // duration of this (sent) message.
            let cds = unsafe { &*(lparam.0 as *const COPYDATASTRUCT) };
            if let Some(text) = decode_copydata(cds) {
                cornice_core::log_debug!("control message: {text}");
                forward(hwnd, EngineMsg::Control(cornice_core::protocol::parse(&text)));
            }
            LRESULT(1)
        }
        WM_DISPLAYCHANGE | WM_DPICHANGED => {
            forward(hwnd, EngineMsg::DisplayChanged);
            LRESULT(0)
        }
        // Never take part in hit testing: clicks fall through to
        // whatever is underneath the border pixels.
        WM_NCHITTEST => LRESULT(HTTRANSPARENT as i32 as isize),
        // Refuse activation.
        WM_MOUSEACTIVATE => LRESULT(MA_NOACTIVATE as isize),
        WM_APP_TRAY => {
            crate::tray::handle_callback(hwnd, lparam);
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
