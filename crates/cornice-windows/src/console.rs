//! `--console` support: attach a console so log echo is visible.

use windows::Win32::System::Console::AllocConsole;

/// Allocates a console for this (windows-subsystem) process. Harmless
/// if a console already exists: the allocation just fails.
pub fn attach() {
    // SAFETY: AllocConsole has no preconditions.
    unsafe {
        let _ = AllocConsole();
    }
}
