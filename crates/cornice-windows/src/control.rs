//! Out-of-process control-plane transport.
//!
//! The engine side of the protocol lives in the overlay wndproc; this
//! module is the sender side used by the CLI: find the running
//! engine's host window by class and deliver a UTF-16 payload over
//! `WM_COPYDATA`.

use cornice_core::ServiceResult;
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::System::DataExchange::COPYDATASTRUCT;
use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, SendMessageW, WM_COPYDATA};
use windows::core::PCWSTR;

use crate::overlay;

/// Finds the host window of a running engine, if any.
pub fn engine_window() -> Option<HWND> {
    // SAFETY: FindWindowW searches top-level windows by class name.
    unsafe {
        FindWindowW(overlay::CLASS_NAME, PCWSTR::null())
            .ok()
            .filter(|hwnd| !hwnd.is_invalid())
    }
}

/// Sends one control-plane message to the running engine.
///
/// The payload crosses the process boundary as UTF-16 including the
/// terminating NUL, which the receiver strips.
pub fn send_text(text: &str) -> ServiceResult<()> {
    let Some(target) = engine_window() else {
        return Err("no running cornice engine found".into());
    };

    let mut payload: Vec<u16> = text.encode_utf16().collect();
    payload.push(0);

    let cds = COPYDATASTRUCT {
        dwData: 0,
        cbData: (payload.len() * std::mem::size_of::<u16>()) as u32,
        lpData: payload.as_mut_ptr() as *mut _,
    };

    // SAFETY: SendMessageW blocks until the receiver handled the
    // message, so the payload buffer outlives its use.
    unsafe {
        SendMessageW(
            target,
            WM_COPYDATA,
            Some(WPARAM(0)),
            Some(LPARAM(&cds as *const COPYDATASTRUCT as isize)),
        );
    }

    Ok(())
}
