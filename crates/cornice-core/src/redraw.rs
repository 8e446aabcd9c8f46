//! Redraw planning: skip, partial, or full.

use crate::Rect;

/// What the renderer should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawPlan {
    /// Nothing changed; leave the surface alone.
    Skip,
    /// Erase and repaint only the given surface-local rectangle.
    Partial(Rect),
    /// Clear and repaint the whole surface.
    Full,
}

/// Decides the redraw strategy for one tick.
///
/// A style change (color, thickness, corner) invalidates every drawn
/// pixel, so it forces a full pass regardless of the geometry diff.
/// Otherwise: no dirty rectangle means skip; a dirty rectangle whose
/// area stays below `ratio` of the surface is repainted partially;
/// anything larger goes full because a big partial erase costs about
/// the same as a clear.
pub fn plan(
    dirty: Option<Rect>,
    style_changed: bool,
    surface_w: i32,
    surface_h: i32,
    ratio: f32,
) -> RedrawPlan {
    if style_changed {
        return RedrawPlan::Full;
    }
    let Some(dirty) = dirty else {
        return RedrawPlan::Skip;
    };

    // Clamp to the surface; off-screen movement can push the dirty
    // union outside it, and a begin-draw on an out-of-bounds rect
    // fails.
    let surface = Rect::new(0, 0, surface_w, surface_h);
    let Some(clamped) = dirty.intersect(&surface) else {
        return RedrawPlan::Skip;
    };

    let surface_area = surface.area();
    if surface_area > 0 && (clamped.area() as f64) < f64::from(ratio) * surface_area as f64 {
        RedrawPlan::Partial(clamped)
    } else {
        RedrawPlan::Full
    }
}

/// Collapses overlapping rectangles into their bounding boxes.
///
/// Optional draw-time optimization (`merge_overlapping`): heavily
/// overlapped stacks collapse into one stroke each instead of n.
/// First-fit single pass; order of the input is preserved for the
/// survivors.
pub fn merge_overlapping(rects: &[Rect]) -> Vec<Rect> {
    let mut merged: Vec<Rect> = Vec::with_capacity(rects.len());
    for rect in rects {
        if rect.is_empty() {
            continue;
        }
        match merged.iter_mut().find(|m| m.intersects(rect)) {
            Some(m) => *m = m.union(rect),
            None => merged.push(*rect),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_change_forces_full() {
        assert_eq!(plan(None, true, 1920, 1080, 0.25), RedrawPlan::Full);
        assert_eq!(
            plan(Some(Rect::new(0, 0, 1, 1)), true, 1920, 1080, 0.25),
            RedrawPlan::Full
        );
    }

    #[test]
    fn no_dirt_skips() {
        assert_eq!(plan(None, false, 1920, 1080, 0.25), RedrawPlan::Skip);
    }

    #[test]
    fn small_dirty_rect_goes_partial() {
        let dirty = Rect::new(100, 100, 300, 300);
        assert_eq!(
            plan(Some(dirty), false, 1920, 1080, 0.25),
            RedrawPlan::Partial(dirty)
        );
    }

    #[test]
    fn large_dirty_rect_goes_full() {
        let dirty = Rect::new(0, 0, 1900, 1000);
        assert_eq!(plan(Some(dirty), false, 1920, 1080, 0.25), RedrawPlan::Full);
    }

    #[test]
    fn ratio_zero_never_goes_partial() {
        let dirty = Rect::new(0, 0, 1, 1);
        assert_eq!(plan(Some(dirty), false, 1920, 1080, 0.0), RedrawPlan::Full);
    }

    #[test]
    fn dirty_rect_is_clamped_to_the_surface() {
        let dirty = Rect::new(-50, -50, 100, 100);
        assert_eq!(
            plan(Some(dirty), false, 1920, 1080, 0.25),
            RedrawPlan::Partial(Rect::new(0, 0, 100, 100))
        );
    }

    #[test]
    fn fully_offscreen_dirt_skips() {
        let dirty = Rect::new(-200, -200, -100, -100);
        assert_eq!(plan(Some(dirty), false, 1920, 1080, 0.25), RedrawPlan::Skip);
    }

    #[test]
    fn merge_joins_overlapping_rects_only() {
        let rects = [
            Rect::new(0, 0, 100, 100),
            Rect::new(50, 50, 150, 150),
            Rect::new(400, 400, 500, 500),
        ];
        let merged = merge_overlapping(&rects);
        assert_eq!(
            merged,
            vec![Rect::new(0, 0, 150, 150), Rect::new(400, 400, 500, 500)]
        );
    }

    #[test]
    fn merge_drops_empty_rects() {
        let rects = [Rect::new(0, 0, 0, 0), Rect::new(1, 1, 2, 2)];
        assert_eq!(merge_overlapping(&rects), vec![Rect::new(1, 1, 2, 2)]);
    }
}
