//! Z-order-aware clipping for border bands.
//!
//! The overlay paints borders for every tracked window, but a border
//! must never show through a window stacked above its owner. Instead
//! of clipping each draw call, the engine computes the union of the
//! *visible* border bands once per refresh and installs it as the
//! overlay window's region; drawing stays unclipped and the region is
//! authoritative.

use crate::{Rect, Region};

/// Integer band thickness for region arithmetic: `ceil(thickness)`
/// with a floor of 1. Drawing still uses the float value, so a
/// fractional thickness keeps its visual width.
pub fn band_thickness(thickness: f32) -> i32 {
    let t = thickness.ceil() as i32;
    t.max(1)
}

/// The four bands surrounding `rect` on the outside by `t` pixels.
///
/// The top and bottom bands extend horizontally by `t` so the corner
/// squares are covered; the left and right bands extend vertically
/// the same way. The bands overlap at the corners, which the region
/// algebra absorbs.
pub fn border_bands(rect: &Rect, t: i32) -> [Rect; 4] {
    [
        // top
        Rect::new(rect.left - t, rect.top - t, rect.right + t, rect.top),
        // bottom
        Rect::new(rect.left - t, rect.bottom, rect.right + t, rect.bottom + t),
        // left
        Rect::new(rect.left - t, rect.top - t, rect.left, rect.bottom + t),
        // right
        Rect::new(rect.right, rect.top - t, rect.right + t, rect.bottom + t),
    ]
}

/// Builds the visible border region for `rects`, which must be
/// ordered top-most first (the OS enumeration order).
///
/// Walking from the front of the z-order backwards, each window
/// contributes the parts of its bands not yet covered by a higher
/// window, then adds its own inflated footprint to the covered set.
/// The inflation includes the border halo so a lower window's band
/// cannot bleed through the gap hugging a higher one.
pub fn build_clip_region(rects: &[Rect], thickness: f32) -> Region {
    let t = band_thickness(thickness);

    let mut visible = Region::new();
    let mut covered = Region::new();

    for rect in rects {
        for band in border_bands(rect, t) {
            let mut piece = Region::from_rect(band);
            piece.subtract_region(&covered);
            visible.add_region(&piece);
        }
        covered.add_rect(&rect.inflate(t));
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Union area of one window's bands: the inflated footprint minus
    /// the window itself.
    fn band_area(rect: &Rect, t: i32) -> i64 {
        rect.inflate(t).area() - rect.area()
    }

    #[test]
    fn adjacent_windows_keep_all_bands() {
        // Two windows far enough apart that their halos do not touch.
        let r1 = Rect::new(100, 100, 300, 300);
        let r2 = Rect::new(400, 100, 600, 300);
        let region = build_clip_region(&[r1, r2], 4.0);

        assert_eq!(region.area(), band_area(&r1, 4) + band_area(&r2, 4));
        for r in [r1, r2] {
            for band in border_bands(&r, 4) {
                assert!(region.covers(&band), "missing band {band:?}");
            }
        }
    }

    #[test]
    fn fully_overlapped_window_contributes_nothing() {
        // r2 sits entirely inside r1's inflated footprint, so every
        // one of its bands is occluded.
        let r1 = Rect::new(100, 100, 500, 500);
        let r2 = Rect::new(120, 120, 480, 480);
        let region = build_clip_region(&[r1, r2], 4.0);

        assert_eq!(region.area(), band_area(&r1, 4));
        for band in border_bands(&r2, 4) {
            assert!(!region.intersects_rect(&band));
        }
    }

    #[test]
    fn partial_overlap_clips_the_hidden_strip() {
        let r1 = Rect::new(100, 100, 400, 300);
        let r2 = Rect::new(300, 200, 600, 500);
        let region = build_clip_region(&[r1, r2], 2.0);

        // The part of r2's left band inside r1's inflated halo is
        // removed; the rest of the band survives.
        assert!(!region.contains_point(299, 250));
        assert!(region.contains_point(299, 350));
        // r1's bands are untouched.
        for band in border_bands(&r1, 2) {
            assert!(region.covers(&band));
        }
    }

    #[test]
    fn visible_region_is_subset_of_all_bands() {
        let rects = [
            Rect::new(0, 0, 200, 200),
            Rect::new(150, 150, 400, 400),
            Rect::new(-50, 100, 120, 500),
        ];
        let region = build_clip_region(&rects, 3.0);

        let mut all_bands = Region::new();
        for r in &rects {
            for band in border_bands(r, 3) {
                all_bands.add_rect(&band);
            }
        }
        for r in region.rects() {
            assert!(all_bands.covers(r));
        }
    }

    #[test]
    fn lower_bands_never_enter_higher_halos() {
        let rects = [
            Rect::new(0, 0, 200, 200),
            Rect::new(150, 150, 400, 400),
            Rect::new(100, 50, 350, 300),
        ];
        let t = 3;
        let region = build_clip_region(&rects, t as f32);

        // Pixels covered by rects[0]'s halo can only come from
        // rects[0]'s own bands; verify against each lower window.
        let halo = rects[0].inflate(t);
        let mut lower = Region::new();
        for r in &rects[1..] {
            for band in border_bands(r, t) {
                lower.add_rect(&band);
            }
        }
        for r in &rects[..1] {
            for band in border_bands(r, t) {
                lower.subtract_rect(&band);
            }
        }
        // Whatever remains of the lower bands inside the halo must
        // not be visible.
        for piece in lower.rects() {
            if let Some(inside) = piece.intersect(&halo) {
                assert!(!region.intersects_rect(&inside));
            }
        }
    }

    #[test]
    fn thickness_is_ceiled_with_floor_one() {
        assert_eq!(band_thickness(0.0), 1);
        assert_eq!(band_thickness(0.4), 1);
        assert_eq!(band_thickness(2.0), 2);
        assert_eq!(band_thickness(2.1), 3);
    }
}
