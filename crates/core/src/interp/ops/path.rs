//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n, W, W*
//!
//! Path construction:
//! - m: Move to
//! - l: Line to
//! - c, v, y: Bezier curves (cubic variants)
//! - h: Close subpath
//! - re: Rectangle shorthand
//!
//! Path painting:
//! - S/s: Stroke (s closes first)
//! - f/F/f*: Fill (F is legacy, f* uses even-odd rule)
//! - B/B*/b/b*: Fill then stroke
//! - n: End path (no-op, often with clipping)
//!
//! Clipping:
//! - W/W*: Set clipping path (non-zero/even-odd), applied by the next
//!   painting operator

use crate::error::{PdfError, Result};
use crate::interp::device::{EventKind, EventPayload, PathInfo};
use crate::interp::interpreter::{PDFStreamProcessor, PathBuilder};
use crate::model::path::{FillRule, PathSegment, path_bbox, transform_path};
use crate::utils::{Point, add};

#[allow(non_snake_case)]
impl PDFStreamProcessor<'_> {
    fn require_current_point(&self, operator: &str) -> Result<Point> {
        self.path
            .current_point
            .ok_or_else(|| PdfError::InvalidValue(format!("{operator}: no current point")))
    }

    // ========================================================================
    // Path Construction Operators
    // ========================================================================

    /// Begins a new subpath at the given point.
    ///
    /// PDF operator: `m`
    pub fn do_m(&mut self, p: Point) -> Result<()> {
        self.path.segments.push(PathSegment::MoveTo(p));
        self.path.current_point = Some(p);
        self.path.subpath_start = Some(p);
        Ok(())
    }

    /// Appends a straight line segment from the current point.
    ///
    /// PDF operator: `l`
    pub fn do_l(&mut self, p: Point) -> Result<()> {
        self.require_current_point("l")?;
        self.path.segments.push(PathSegment::LineTo(p));
        self.path.current_point = Some(p);
        Ok(())
    }

    /// Appends a cubic Bezier curve to the path.
    ///
    /// PDF operator: `c`
    pub fn do_c(&mut self, p1: Point, p2: Point, p3: Point) -> Result<()> {
        self.require_current_point("c")?;
        self.path.segments.push(PathSegment::CurveTo(p1, p2, p3));
        self.path.current_point = Some(p3);
        Ok(())
    }

    /// Appends a cubic Bezier curve with the current point as first control point.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, p2: Point, p3: Point) -> Result<()> {
        let p1 = self.require_current_point("v")?;
        self.path.segments.push(PathSegment::CurveTo(p1, p2, p3));
        self.path.current_point = Some(p3);
        Ok(())
    }

    /// Appends a cubic Bezier curve with the endpoint as second control point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, p1: Point, p3: Point) -> Result<()> {
        self.require_current_point("y")?;
        self.path.segments.push(PathSegment::CurveTo(p1, p3, p3));
        self.path.current_point = Some(p3);
        Ok(())
    }

    /// Closes the current subpath.
    ///
    /// PDF operator: `h`
    pub fn do_h(&mut self) -> Result<()> {
        if self.path.current_point.is_some() {
            self.path.segments.push(PathSegment::ClosePath);
            self.path.current_point = self.path.subpath_start;
        }
        Ok(())
    }

    /// Appends a rectangle as a complete closed subpath.
    ///
    /// PDF operator: `re`
    pub fn do_re(&mut self, origin: Point, size: Point) -> Result<()> {
        let (x, y) = origin;
        let (x1, y1) = (add(x, size.0)?, add(y, size.1)?);
        self.path.segments.extend([
            PathSegment::MoveTo((x, y)),
            PathSegment::LineTo((x1, y)),
            PathSegment::LineTo((x1, y1)),
            PathSegment::LineTo((x, y1)),
            PathSegment::ClosePath,
        ]);
        self.path.current_point = Some(origin);
        self.path.subpath_start = Some(origin);
        Ok(())
    }

    // ========================================================================
    // Path Painting Operators
    // ========================================================================

    /// Consume the pending path: emit it when painted, apply a pending clip.
    fn paint_path(&mut self, close: bool, stroke: bool, fill: Option<FillRule>) -> Result<()> {
        let PathBuilder { mut segments, .. } = std::mem::take(&mut self.path);
        let clip = self.pending_clip.take();
        if close && !segments.is_empty() && segments.last() != Some(&PathSegment::ClosePath) {
            segments.push(PathSegment::ClosePath);
        }
        let device = transform_path(&segments, self.gstate.ctm)?;

        if !device.is_empty() && (stroke || fill.is_some()) {
            let bbox = path_bbox(&device);
            self.emit(
                EventKind::Path,
                EventPayload::Path(PathInfo {
                    segments: device.clone(),
                    stroke,
                    fill,
                    bbox,
                }),
            );
        }

        if let Some(rule) = clip {
            self.gstate.clip.intersect(device, rule);
            let (bounds, empty) = (self.gstate.clip.bounds(), self.gstate.clip.is_empty());
            self.emit(EventKind::ClipChange, EventPayload::Clip { rule, bounds, empty });
        }
        Ok(())
    }

    /// Strokes the current path.
    ///
    /// PDF operator: `S`
    pub fn do_S(&mut self) -> Result<()> {
        self.paint_path(false, true, None)
    }

    /// Closes and strokes the current path.
    ///
    /// PDF operator: `s`
    pub fn do_s(&mut self) -> Result<()> {
        self.paint_path(true, true, None)
    }

    /// Fills the current path using nonzero winding rule.
    ///
    /// PDF operator: `f`
    pub fn do_f(&mut self) -> Result<()> {
        self.paint_path(false, false, Some(FillRule::NonZero))
    }

    /// Fill path (legacy operator, same as `f`).
    ///
    /// PDF operator: `F`
    pub fn do_F(&mut self) -> Result<()> {
        self.do_f()
    }

    /// Fills the current path using even-odd rule.
    ///
    /// PDF operator: `f*`
    pub fn do_f_star(&mut self) -> Result<()> {
        self.paint_path(false, false, Some(FillRule::EvenOdd))
    }

    /// Fills and strokes the current path using nonzero winding rule.
    ///
    /// PDF operator: `B`
    pub fn do_B(&mut self) -> Result<()> {
        self.paint_path(false, true, Some(FillRule::NonZero))
    }

    /// Fills and strokes the current path using even-odd rule.
    ///
    /// PDF operator: `B*`
    pub fn do_B_star(&mut self) -> Result<()> {
        self.paint_path(false, true, Some(FillRule::EvenOdd))
    }

    /// Closes, fills, and strokes the current path using nonzero winding rule.
    ///
    /// PDF operator: `b`
    pub fn do_b(&mut self) -> Result<()> {
        self.paint_path(true, true, Some(FillRule::NonZero))
    }

    /// Closes, fills, and strokes the current path using even-odd rule.
    ///
    /// PDF operator: `b*`
    pub fn do_b_star(&mut self) -> Result<()> {
        self.paint_path(true, true, Some(FillRule::EvenOdd))
    }

    /// Ends the path without filling or stroking.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) -> Result<()> {
        self.paint_path(false, false, None)
    }

    // ========================================================================
    // Clipping Path Operators
    // ========================================================================

    /// Marks the path for clipping with the nonzero winding rule.
    ///
    /// PDF operator: `W`
    pub fn do_W(&mut self) -> Result<()> {
        self.pending_clip = Some(FillRule::NonZero);
        Ok(())
    }

    /// Marks the path for clipping with the even-odd rule.
    ///
    /// PDF operator: `W*`
    pub fn do_W_star(&mut self) -> Result<()> {
        self.pending_clip = Some(FillRule::EvenOdd);
        Ok(())
    }
}
