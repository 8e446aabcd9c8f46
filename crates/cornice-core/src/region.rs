//! Integer region algebra over disjoint rectangle sets.
//!
//! The occlusion pass needs exact set operations (union, difference)
//! on pixel rectangles. A region is kept as a list of pairwise
//! disjoint rectangles; every operation preserves that invariant.
//! Rectangle counts stay small (a handful of border bands per
//! window), so the quadratic combine cost is irrelevant.

use crate::Rect;

/// A set of pixels represented as disjoint rectangles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.add_rect(&rect);
        region
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The disjoint rectangles making up the region. Order is not
    /// meaningful.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Total number of pixels covered.
    pub fn area(&self) -> i64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Adds a rectangle, keeping stored rectangles disjoint: the
    /// incoming rectangle is first carved down to the parts not
    /// already covered.
    pub fn add_rect(&mut self, rect: &Rect) {
        if rect.is_empty() {
            return;
        }
        let mut pieces = vec![*rect];
        for existing in &self.rects {
            let mut next = Vec::with_capacity(pieces.len());
            for piece in &pieces {
                next.extend(subtract_rect(piece, existing));
            }
            pieces = next;
            if pieces.is_empty() {
                return;
            }
        }
        self.rects.extend(pieces);
    }

    /// Removes every pixel of `rect` from the region.
    pub fn subtract_rect(&mut self, rect: &Rect) {
        if rect.is_empty() || self.rects.is_empty() {
            return;
        }
        let mut next = Vec::with_capacity(self.rects.len());
        for r in &self.rects {
            next.extend(subtract_rect(r, rect));
        }
        self.rects = next;
    }

    pub fn add_region(&mut self, other: &Region) {
        for r in &other.rects {
            self.add_rect(r);
        }
    }

    pub fn subtract_region(&mut self, other: &Region) {
        for r in &other.rects {
            self.subtract_rect(r);
        }
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }

    /// Whether `rect` is fully covered by the region.
    pub fn covers(&self, rect: &Rect) -> bool {
        let mut remainder = vec![*rect];
        for r in &self.rects {
            let mut next = Vec::with_capacity(remainder.len());
            for piece in &remainder {
                next.extend(subtract_rect(piece, r));
            }
            remainder = next;
            if remainder.is_empty() {
                return true;
            }
        }
        remainder.is_empty()
    }

    /// Whether any pixel of `rect` is in the region.
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Bounding rectangle, or `None` for the empty region.
    pub fn bounds(&self) -> Option<Rect> {
        self.rects
            .iter()
            .copied()
            .reduce(|acc, r| acc.union(&r))
    }
}

/// `a − b` as up to four disjoint rectangles.
///
/// Splits `a` into the strips above, below, left of, and right of the
/// overlap. Returns `a` untouched when the rectangles are disjoint.
fn subtract_rect(a: &Rect, b: &Rect) -> Vec<Rect> {
    let Some(overlap) = a.intersect(b) else {
        return vec![*a];
    };
    if overlap == *a {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(4);
    if overlap.top > a.top {
        out.push(Rect::new(a.left, a.top, a.right, overlap.top));
    }
    if overlap.bottom < a.bottom {
        out.push(Rect::new(a.left, overlap.bottom, a.right, a.bottom));
    }
    if overlap.left > a.left {
        out.push(Rect::new(a.left, overlap.top, overlap.left, overlap.bottom));
    }
    if overlap.right < a.right {
        out.push(Rect::new(overlap.right, overlap.top, a.right, overlap.bottom));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(region: &Region) {
        let rects = region.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn add_overlapping_rects_keeps_exact_area() {
        let mut region = Region::new();
        region.add_rect(&Rect::new(0, 0, 100, 100));
        region.add_rect(&Rect::new(50, 50, 150, 150));

        assert_disjoint(&region);
        // 100*100 + 100*100 - 50*50 overlap
        assert_eq!(region.area(), 17_500);
    }

    #[test]
    fn add_contained_rect_is_a_no_op() {
        let mut region = Region::from_rect(Rect::new(0, 0, 100, 100));
        region.add_rect(&Rect::new(10, 10, 20, 20));
        assert_eq!(region.area(), 10_000);
        assert_eq!(region.rects().len(), 1);
    }

    #[test]
    fn subtract_punches_a_hole() {
        let mut region = Region::from_rect(Rect::new(0, 0, 100, 100));
        region.subtract_rect(&Rect::new(25, 25, 75, 75));

        assert_disjoint(&region);
        assert_eq!(region.area(), 10_000 - 2_500);
        assert!(!region.contains_point(50, 50));
        assert!(region.contains_point(10, 10));
    }

    #[test]
    fn subtract_disjoint_rect_changes_nothing() {
        let mut region = Region::from_rect(Rect::new(0, 0, 10, 10));
        region.subtract_rect(&Rect::new(20, 20, 30, 30));
        assert_eq!(region.area(), 100);
    }

    #[test]
    fn covers_respects_partial_overlap() {
        let mut region = Region::new();
        region.add_rect(&Rect::new(0, 0, 50, 100));
        region.add_rect(&Rect::new(50, 0, 100, 100));

        assert!(region.covers(&Rect::new(20, 20, 80, 80)));
        assert!(!region.covers(&Rect::new(90, 90, 110, 110)));
    }

    #[test]
    fn rect_difference_produces_expected_strips() {
        let pieces = subtract_rect(&Rect::new(0, 0, 10, 10), &Rect::new(3, 3, 7, 7));
        let total: i64 = pieces.iter().map(Rect::area).sum();
        assert_eq!(total, 100 - 16);
        assert_eq!(pieces.len(), 4);
    }
}
