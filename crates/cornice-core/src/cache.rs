//! Last-known state for every window the engine currently borders.

use std::collections::HashMap;

use crate::Rect;

/// Opaque OS window handle used as a stable key.
///
/// On the Windows platform this is the `HWND` value widened to a
/// pointer-sized integer; core code never sees an `HWND`. Handles can
/// become invalid at any moment; the platform layer filters dead
/// ones out of snapshots before they reach the cache.
pub type WindowHandle = usize;

/// Style last pushed to the OS for one window. Only used by the
/// window-attribute render mode, where re-setting an unchanged
/// attribute every tick would be wasted DWM round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedStyle {
    /// Border color as a `COLORREF` (0x00BBGGRR).
    pub color: u32,
    /// Border thickness in whole pixels.
    pub thickness: i32,
}

#[derive(Debug, Clone)]
pub struct TrackedEntry {
    pub rect: Rect,
    pub applied: Option<AppliedStyle>,
}

/// What changed between the previous cache state and a snapshot.
#[derive(Debug, Default)]
pub struct DiffReport {
    pub added: Vec<(WindowHandle, Rect)>,
    pub removed: Vec<(WindowHandle, Rect)>,
    /// `(handle, old_rect, new_rect)` for windows whose geometry changed.
    pub moved: Vec<(WindowHandle, Rect, Rect)>,
    pub unchanged: Vec<WindowHandle>,
}

impl DiffReport {
    /// True when the window set and every geometry is identical.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }

    /// Axis-aligned union of every rectangle touched by this diff,
    /// each inflated by the band thickness `t` so the erase covers
    /// the border halo, not just the window footprint.
    ///
    /// `None` when nothing changed.
    pub fn dirty_rect(&self, t: i32) -> Option<Rect> {
        let mut dirty = Rect::new(0, 0, 0, 0);
        for (_, rect) in &self.added {
            dirty = dirty.union(&rect.inflate(t));
        }
        for (_, rect) in &self.removed {
            dirty = dirty.union(&rect.inflate(t));
        }
        for (_, old, new) in &self.moved {
            dirty = dirty.union(&old.inflate(t));
            dirty = dirty.union(&new.inflate(t));
        }
        if dirty.is_empty() { None } else { Some(dirty) }
    }
}

/// Mapping from window handle to its last-known geometry and applied
/// style. Iteration order carries no meaning: the renderer always
/// works from a fresh z-ordered snapshot, never from cache order.
#[derive(Debug, Default)]
pub struct TrackedCache {
    entries: HashMap<WindowHandle, TrackedEntry>,
}

impl TrackedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the cache in line with a snapshot and reports the diff.
    ///
    /// Every handle in the snapshot is upserted; every handle absent
    /// from the snapshot is dropped. Applied styles survive for
    /// handles that stay. Reconciling the same snapshot twice is
    /// idempotent and yields an empty diff the second time.
    pub fn reconcile(&mut self, snapshot: &[(WindowHandle, Rect)]) -> DiffReport {
        let mut report = DiffReport::default();

        for &(handle, rect) in snapshot {
            match self.entries.get_mut(&handle) {
                Some(entry) => {
                    if entry.rect != rect {
                        report.moved.push((handle, entry.rect, rect));
                        entry.rect = rect;
                    } else {
                        report.unchanged.push(handle);
                    }
                }
                None => {
                    self.entries.insert(
                        handle,
                        TrackedEntry {
                            rect,
                            applied: None,
                        },
                    );
                    report.added.push((handle, rect));
                }
            }
        }

        let keep: std::collections::HashSet<WindowHandle> =
            snapshot.iter().map(|&(h, _)| h).collect();
        self.entries.retain(|handle, entry| {
            let stays = keep.contains(handle);
            if !stays {
                report.removed.push((*handle, entry.rect));
            }
            stays
        });

        report
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Read-only iteration, for diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = (WindowHandle, &TrackedEntry)> {
        self.entries.iter().map(|(h, e)| (*h, e))
    }

    pub fn applied(&self, handle: WindowHandle) -> Option<AppliedStyle> {
        self.entries.get(&handle).and_then(|e| e.applied)
    }

    /// Records the style pushed to the OS for `handle`. Ignored for
    /// untracked handles.
    pub fn set_applied(&mut self, handle: WindowHandle, style: AppliedStyle) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.applied = Some(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: i32, top: i32) -> Rect {
        Rect::new(left, top, left + 100, top + 100)
    }

    #[test]
    fn key_set_follows_the_latest_snapshot() {
        let mut cache = TrackedCache::new();
        cache.reconcile(&[(1, rect(0, 0)), (2, rect(200, 0))]);
        cache.reconcile(&[(2, rect(200, 0)), (3, rect(400, 0))]);

        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert!(cache.contains(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let snapshot = [(1, rect(0, 0)), (2, rect(200, 0))];
        let mut cache = TrackedCache::new();

        let first = cache.reconcile(&snapshot);
        assert_eq!(first.added.len(), 2);

        let second = cache.reconcile(&snapshot);
        assert!(second.is_empty());
        assert_eq!(second.unchanged.len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn moved_windows_report_old_and_new_rects() {
        let mut cache = TrackedCache::new();
        cache.reconcile(&[(1, rect(0, 0))]);
        let report = cache.reconcile(&[(1, rect(50, 20))]);

        assert_eq!(report.moved, vec![(1, rect(0, 0), rect(50, 20))]);
        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn vanished_handle_is_gone_after_one_reconcile() {
        let mut cache = TrackedCache::new();
        cache.reconcile(&[(1, rect(0, 0))]);
        let report = cache.reconcile(&[]);

        assert_eq!(report.removed, vec![(1, rect(0, 0))]);
        assert!(cache.is_empty());
    }

    #[test]
    fn applied_style_survives_reconcile() {
        let mut cache = TrackedCache::new();
        cache.reconcile(&[(1, rect(0, 0))]);
        let style = AppliedStyle {
            color: 0x00_00_CC_FF,
            thickness: 3,
        };
        cache.set_applied(1, style);

        cache.reconcile(&[(1, rect(10, 10))]);
        assert_eq!(cache.applied(1), Some(style));

        cache.reconcile(&[]);
        assert_eq!(cache.applied(1), None);
    }

    #[test]
    fn dirty_rect_unions_old_and_new_positions() {
        let mut cache = TrackedCache::new();
        cache.reconcile(&[(1, Rect::new(0, 0, 100, 100))]);
        let report = cache.reconcile(&[(1, Rect::new(300, 0, 400, 100))]);

        let dirty = report.dirty_rect(4).unwrap();
        assert_eq!(dirty, Rect::new(-4, -4, 404, 104));
    }

    #[test]
    fn dirty_rect_is_none_without_changes() {
        let snapshot = [(1, rect(0, 0))];
        let mut cache = TrackedCache::new();
        cache.reconcile(&snapshot);
        let report = cache.reconcile(&snapshot);
        assert_eq!(report.dirty_rect(4), None);
    }
}
