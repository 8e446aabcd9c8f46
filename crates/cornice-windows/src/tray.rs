//! Notification-area icon with a minimal Exit menu.

use std::mem;

use windows::Win32::Foundation::{HWND, LPARAM, POINT};
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW, Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, IDI_APPLICATION, LoadIconW, MF_STRING,
    PostQuitMessage, SetForegroundWindow, TPM_RETURNCMD, TPM_RIGHTBUTTON, TrackPopupMenu,
    WM_CONTEXTMENU, WM_RBUTTONUP,
};
use windows::core::w;

use crate::overlay::WM_APP_TRAY;

const TRAY_ICON_ID: u32 = 1;
const MENU_EXIT: usize = 1;

/// The installed tray icon, removed on drop.
pub struct TrayIcon {
    nid: NOTIFYICONDATAW,
}

/// Adds the icon to the notification area, routing its callbacks to
/// the overlay host window as `WM_APP_TRAY`.
pub fn install(hwnd: HWND) -> Option<TrayIcon> {
    // SAFETY: stock application icon; NOTIFYICONDATAW is fully
    // initialised before the shell call.
    unsafe {
        let icon = LoadIconW(None, IDI_APPLICATION).ok()?;

        let mut nid = NOTIFYICONDATAW {
            cbSize: mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: TRAY_ICON_ID,
            uFlags: NIF_MESSAGE | NIF_TIP | NIF_ICON,
            uCallbackMessage: WM_APP_TRAY,
            hIcon: icon,
            ..Default::default()
        };
        let tip = w!("cornice border overlay");
        let tip_units = tip.as_wide();
        nid.szTip[..tip_units.len()].copy_from_slice(tip_units);

        if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
            cornice_core::log_warn!("failed to add tray icon");
            return None;
        }
        Some(TrayIcon { nid })
    }
}

impl Drop for TrayIcon {
    fn drop(&mut self) {
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
        }
    }
}

/// Handles a tray callback delivered to the overlay wndproc. A
/// right-click opens the context menu; Exit quits the message loop,
/// which drives the whole shutdown sequence.
pub fn handle_callback(hwnd: HWND, lparam: LPARAM) {
    let event = lparam.0 as u32;
    if event != WM_RBUTTONUP && event != WM_CONTEXTMENU {
        return;
    }

    // SAFETY: menu lifetime is local to this call; SetForegroundWindow
    // is required so the menu dismisses when focus moves elsewhere.
    unsafe {
        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);

        let Ok(menu) = CreatePopupMenu() else {
            return;
        };
        let _ = AppendMenuW(menu, MF_STRING, MENU_EXIT, w!("Exit cornice"));
        let _ = SetForegroundWindow(hwnd);
        let cmd = TrackPopupMenu(
            menu,
            TPM_RETURNCMD | TPM_RIGHTBUTTON,
            pt.x,
            pt.y,
            None,
            hwnd,
            None,
        );
        let _ = DestroyMenu(menu);

        if cmd.0 as usize == MENU_EXIT {
            PostQuitMessage(0);
        }
    }
}
