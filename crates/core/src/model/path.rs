//! Path geometry shared by the path operators, clipping and paint events.

use rust_decimal::Decimal;

use crate::error::Result;
use crate::utils::{Matrix, Point, Rect, apply_matrix_pt, get_bound, intersect_rect};

/// Path segment for graphics operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(Point),
    /// Line to point (x, y)
    LineTo(Point),
    /// Cubic bezier curve: two control points, then the end point
    CurveTo(Point, Point, Point),
    /// Close path
    ClosePath,
}

impl PathSegment {
    /// Map every point of the segment through `m`.
    pub fn transform(&self, m: Matrix) -> Result<Self> {
        Ok(match *self {
            Self::MoveTo(p) => Self::MoveTo(apply_matrix_pt(m, p)?),
            Self::LineTo(p) => Self::LineTo(apply_matrix_pt(m, p)?),
            Self::CurveTo(p1, p2, p3) => Self::CurveTo(
                apply_matrix_pt(m, p1)?,
                apply_matrix_pt(m, p2)?,
                apply_matrix_pt(m, p3)?,
            ),
            Self::ClosePath => Self::ClosePath,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = Point> {
        let pts: [Option<Point>; 3] = match *self {
            Self::MoveTo(p) | Self::LineTo(p) => [Some(p), None, None],
            Self::CurveTo(p1, p2, p3) => [Some(p1), Some(p2), Some(p3)],
            Self::ClosePath => [None, None, None],
        };
        pts.into_iter().flatten()
    }
}

/// Transform a whole path.
pub fn transform_path(path: &[PathSegment], m: Matrix) -> Result<Vec<PathSegment>> {
    path.iter().map(|seg| seg.transform(m)).collect()
}

/// Control-point bounding box of a path, `None` if it has no points.
pub fn path_bbox(path: &[PathSegment]) -> Option<Rect> {
    get_bound(path.iter().flat_map(PathSegment::points))
}

/// Winding rule used for filling and clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonZero => "nonzero",
            Self::EvenOdd => "evenodd",
        }
    }
}

/// One clip operation, in device space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRegion {
    pub path: Vec<PathSegment>,
    pub rule: FillRule,
    pub bbox: Rect,
}

/// The current clipping path: the intersection of every region applied
/// since the state was created. No regions means the whole device space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipPath {
    pub regions: Vec<ClipRegion>,
    bounds: Option<Rect>,
    empty: bool,
}

impl ClipPath {
    /// Intersect with a device-space path. An empty path clips everything.
    pub fn intersect(&mut self, path: Vec<PathSegment>, rule: FillRule) {
        let Some(bbox) = path_bbox(&path) else {
            self.empty = true;
            return;
        };
        match self.bounds {
            None if !self.empty => self.bounds = Some(bbox),
            Some(current) => match intersect_rect(current, bbox) {
                Some(r) => self.bounds = Some(r),
                None => self.empty = true,
            },
            None => {}
        }
        self.regions.push(ClipRegion { path, rule, bbox });
    }

    /// Bounding box of the clip, `None` while unclipped.
    pub const fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn is_unbounded(&self) -> bool {
        self.regions.is_empty() && !self.empty
    }

    /// Whether nothing can be painted.
    pub const fn is_empty(&self) -> bool {
        self.empty
    }
}

/// A rectangle as a closed path.
pub fn rect_path(x: Decimal, y: Decimal, x1: Decimal, y1: Decimal) -> Vec<PathSegment> {
    vec![
        PathSegment::MoveTo((x, y)),
        PathSegment::LineTo((x1, y)),
        PathSegment::LineTo((x1, y1)),
        PathSegment::LineTo((x, y1)),
        PathSegment::ClosePath,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_clip_intersection_narrows_bounds() {
        let mut clip = ClipPath::default();
        assert!(clip.is_unbounded());
        clip.intersect(rect_path(dec!(0), dec!(0), dec!(10), dec!(10)), FillRule::NonZero);
        clip.intersect(rect_path(dec!(5), dec!(5), dec!(20), dec!(20)), FillRule::EvenOdd);
        assert_eq!(clip.bounds(), Some((dec!(5), dec!(5), dec!(10), dec!(10))));
        assert_eq!(clip.regions.len(), 2);
        assert!(!clip.is_empty());
    }

    #[test]
    fn test_disjoint_clip_is_empty() {
        let mut clip = ClipPath::default();
        clip.intersect(rect_path(dec!(0), dec!(0), dec!(1), dec!(1)), FillRule::NonZero);
        clip.intersect(rect_path(dec!(5), dec!(5), dec!(6), dec!(6)), FillRule::NonZero);
        assert!(clip.is_empty());
    }

    #[test]
    fn test_transform_segment() {
        let m = (dec!(2), dec!(0), dec!(0), dec!(2), dec!(1), dec!(1));
        let seg = PathSegment::CurveTo(
            (dec!(0), dec!(0)),
            (dec!(1), dec!(0)),
            (dec!(1), dec!(1)),
        );
        assert_eq!(
            seg.transform(m).unwrap(),
            PathSegment::CurveTo(
                (dec!(1), dec!(1)),
                (dec!(3), dec!(1)),
                (dec!(3), dec!(3)),
            )
        );
    }
}
