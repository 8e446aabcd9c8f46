//! System-wide WinEvent hooks feeding the refresh scheduler.
//!
//! Hook callbacks never touch engine state. They hold a weak handle
//! to a [`RefreshPoster`], which collapses bursts of events into at
//! most one pending `WM_APP_REFRESH` in the overlay's message queue.
//! The engine clears the pending flag at the start of each tick, so
//! an event storm costs one reconcile per tick, not one per event.

use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::{OnceLock, Weak};

use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::Accessibility::{HWINEVENTHOOK, SetWinEventHook, UnhookWinEvent};
use windows::Win32::UI::WindowsAndMessaging::{
    EVENT_OBJECT_CREATE, EVENT_OBJECT_DESTROY, EVENT_OBJECT_HIDE, EVENT_OBJECT_LOCATIONCHANGE,
    EVENT_OBJECT_REORDER, EVENT_OBJECT_SHOW, EVENT_SYSTEM_FOREGROUND, EVENT_SYSTEM_MINIMIZEEND,
    EVENT_SYSTEM_MINIMIZESTART, PostMessageW, WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS,
};

use crate::overlay::WM_APP_REFRESH;

/// Object ID indicating the event applies to the window itself,
/// not a child element like a scrollbar or menu item.
const OBJID_WINDOW: i32 = 0;

/// Posts coalesced refresh requests to the overlay window.
///
/// `post` is safe from any thread: `PostMessageW` is the lock-free
/// producer side of the UI thread's queue.
pub struct RefreshPoster {
    hwnd: AtomicIsize,
    pending: AtomicBool,
}

impl RefreshPoster {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd: AtomicIsize::new(hwnd.0 as isize),
            pending: AtomicBool::new(false),
        }
    }

    /// Requests a refresh. Collapses into an already-pending request.
    pub fn post(&self) {
        if self.pending.swap(true, Ordering::AcqRel) {
            return;
        }
        let hwnd = self.hwnd.load(Ordering::Acquire);
        if hwnd == 0 {
            return;
        }
        // SAFETY: PostMessageW is thread-safe; a stale HWND makes it
        // fail, which we ignore.
        unsafe {
            let _ = PostMessageW(
                Some(HWND(hwnd as *mut _)),
                WM_APP_REFRESH,
                WPARAM(0),
                LPARAM(0),
            );
        }
    }

    /// Called by the engine at the start of a tick: events arriving
    /// from here on warrant a new refresh.
    pub fn begin_tick(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Stops further posts, for shutdown.
    pub fn disarm(&self) {
        self.hwnd.store(0, Ordering::Release);
    }
}

/// Weak handle for the hook callback, written once at install time,
/// upgraded on every event. After the engine drops its `Arc`, the
/// upgrade fails and late events are discarded.
static POSTER: OnceLock<Weak<RefreshPoster>> = OnceLock::new();

/// The installed hooks. Uninstallation is idempotent: `uninstall`
/// drains the list, and `Drop` runs it again harmlessly.
pub struct EventHooks {
    hooks: Vec<HWINEVENTHOOK>,
}

/// Installs one hook per event class of interest, skipping our own
/// process so the overlay never feeds back into itself.
pub fn install(poster: Weak<RefreshPoster>) -> EventHooks {
    let _ = POSTER.set(poster);

    let ranges: [(u32, u32); 6] = [
        (EVENT_OBJECT_SHOW, EVENT_OBJECT_HIDE),
        (EVENT_OBJECT_LOCATIONCHANGE, EVENT_OBJECT_LOCATIONCHANGE),
        (EVENT_SYSTEM_MINIMIZESTART, EVENT_SYSTEM_MINIMIZEEND),
        (EVENT_OBJECT_DESTROY, EVENT_OBJECT_DESTROY),
        (EVENT_SYSTEM_FOREGROUND, EVENT_SYSTEM_FOREGROUND),
        (EVENT_OBJECT_REORDER, EVENT_OBJECT_REORDER),
    ];

    let mut hooks = Vec::with_capacity(ranges.len());
    for (min, max) in ranges {
        // SAFETY: SetWinEventHook registers our callback for system-wide
        // window events. WINEVENT_OUTOFCONTEXT means the callback runs in
        // our process. WINEVENT_SKIPOWNPROCESS ignores our own windows.
        let hook = unsafe {
            SetWinEventHook(
                min,
                max,
                None,
                Some(win_event_proc),
                0,
                0,
                WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
            )
        };
        if hook.is_invalid() {
            cornice_core::log_warn!("failed to set WinEvent hook for {min:#x}..{max:#x}");
        } else {
            hooks.push(hook);
        }
    }

    EventHooks { hooks }
}

impl EventHooks {
    /// Removes every installed hook. Safe to call more than once.
    pub fn uninstall(&mut self) {
        for hook in self.hooks.drain(..) {
            // SAFETY: UnhookWinEvent on a valid hook handle; each
            // handle is unhooked exactly once because drain empties
            // the list.
            unsafe {
                let _ = UnhookWinEvent(hook);
            }
        }
    }
}

impl Drop for EventHooks {
    fn drop(&mut self) {
        self.uninstall();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A disarmed poster never reaches PostMessageW, so the coalescing
    // flag can be exercised without a window.
    fn disarmed() -> RefreshPoster {
        let poster = RefreshPoster::new(HWND(std::ptr::null_mut()));
        poster.disarm();
        poster
    }

    #[test]
    fn redundant_posts_collapse_until_the_next_tick() {
        let poster = disarmed();
        assert!(!poster.pending.load(Ordering::Acquire));

        poster.post();
        poster.post();
        assert!(poster.pending.load(Ordering::Acquire));

        poster.begin_tick();
        assert!(!poster.pending.load(Ordering::Acquire));
    }
}

/// The WinEvent callback.
///
/// Runs out of engine context; its only job is to post a refresh
/// request and return immediately.
unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    _id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    // Object events must refer to an actual window; child-object noise
    // (carets, scrollbars, list items) is discarded. System events
    // (foreground, minimize) pass as-is.
    if event >= EVENT_OBJECT_CREATE && (id_object != OBJID_WINDOW || hwnd.is_invalid()) {
        return;
    }

    if let Some(weak) = POSTER.get()
        && let Some(poster) = weak.upgrade()
    {
        poster.post();
    }
}
