//! Miscellaneous routines shared by the interpreter.
//!
//! Provides:
//! - Geometric types (Point, Rect, Matrix) over exact decimals
//! - Checked matrix transformation operations
//! - Text escaping helpers for markup output

use std::borrow::Cow;

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{PdfError, Result};

/// A 2D point (x, y).
pub type Point = (Decimal, Decimal);

/// A rectangle defined by (x0, y0, x1, y1) where (x0, y0) is typically bottom-left
/// and (x1, y1) is top-right.
pub type Rect = (Decimal, Decimal, Decimal, Decimal);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (Decimal, Decimal, Decimal, Decimal, Decimal, Decimal);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (
    Decimal::ONE,
    Decimal::ZERO,
    Decimal::ZERO,
    Decimal::ONE,
    Decimal::ZERO,
    Decimal::ZERO,
);

/// Checked multiplication; overflow is reported instead of panicking.
#[inline]
pub fn mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).ok_or(PdfError::NumericOverflow)
}

/// Checked addition.
#[inline]
pub fn add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or(PdfError::NumericOverflow)
}

/// Checked division. Division by zero counts as overflow.
#[inline]
pub fn div(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_div(b).ok_or(PdfError::NumericOverflow)
}

/// `a*b + c*d + e`, checked.
#[inline]
fn dot(a: Decimal, b: Decimal, c: Decimal, d: Decimal, e: Decimal) -> Result<Decimal> {
    add(add(mul(a, b)?, mul(c, d)?)?, e)
}

/// Multiplies two matrices: result = m1 * m0.
///
/// Row-vector convention: a point is transformed by m1 first, then by m0.
/// `cm` therefore computes `mult_matrix(operand, ctm)`.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Result<Matrix> {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    Ok((
        dot(a0, a1, c0, b1, Decimal::ZERO)?,
        dot(b0, a1, d0, b1, Decimal::ZERO)?,
        dot(a0, c1, c0, d1, Decimal::ZERO)?,
        dot(b0, c1, d0, d1, Decimal::ZERO)?,
        dot(a0, e1, c0, f1, e0)?,
        dot(b0, e1, d0, f1, f0)?,
    ))
}

/// Translates a matrix by (x, y) inside the projection.
///
/// The matrix is changed so that its origin is at the specified point in its own
/// coordinate system. This is what advancing the text matrix by a glyph does.
pub fn translate_matrix(m: Matrix, v: Point) -> Result<Matrix> {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    Ok((a, b, c, d, dot(x, a, y, c, e)?, dot(x, b, y, d, f)?))
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Result<Point> {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    Ok((dot(a, x, c, y, e)?, dot(b, x, d, y, f)?))
}

/// Computes the bounding box of a set of points.
///
/// Returns `None` for an empty input.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> Option<Rect> {
    let mut iter = pts.into_iter();
    let (x, y) = iter.next()?;
    let mut bound = (x, y, x, y);
    for (x, y) in iter {
        bound.0 = bound.0.min(x);
        bound.1 = bound.1.min(y);
        bound.2 = bound.2.max(x);
        bound.3 = bound.3.max(y);
    }
    Some(bound)
}

/// Intersects two rectangles, returning `None` when they do not overlap.
pub fn intersect_rect(r0: Rect, r1: Rect) -> Option<Rect> {
    let x0 = r0.0.max(r1.0);
    let y0 = r0.1.max(r1.1);
    let x1 = r0.2.min(r1.2);
    let y1 = r0.3.min(r1.3);
    (x0 <= x1 && y0 <= y1).then_some((x0, y0, x1, y1))
}

/// Lossy view of a matrix for display and rendering consumers.
pub fn matrix_to_f64(m: Matrix) -> [f64; 6] {
    let (a, b, c, d, e, f) = m;
    [a, b, c, d, e, f].map(|v| v.to_f64().unwrap_or(0.0))
}

/// Encodes a string for SGML/XML/HTML by escaping special characters.
///
/// Returns `Cow::Borrowed` if no escaping needed (zero allocation),
/// or `Cow::Owned` with escaped string (single allocation).
pub fn enc(x: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mult_matrix_identity() {
        let identity = MATRIX_IDENTITY;
        assert_eq!(mult_matrix(identity, identity).unwrap(), identity);
    }

    #[test]
    fn test_mult_matrix_translation_then_scale() {
        let translate = (dec!(1), dec!(0), dec!(0), dec!(1), dec!(10), dec!(20));
        let scale = (dec!(2), dec!(0), dec!(0), dec!(2), dec!(0), dec!(0));
        // Translate first, then scale.
        let m = mult_matrix(translate, scale).unwrap();
        assert_eq!(m, (dec!(2), dec!(0), dec!(0), dec!(2), dec!(20), dec!(40)));
    }

    #[test]
    fn test_repeated_decimal_transforms_do_not_drift() {
        let step = (dec!(1), dec!(0), dec!(0), dec!(1), dec!(0.1), dec!(0.1));
        let mut m = MATRIX_IDENTITY;
        for _ in 0..1000 {
            m = mult_matrix(step, m).unwrap();
        }
        assert_eq!(m.4, dec!(100.0));
        assert_eq!(m.5, dec!(100.0));
    }

    #[test]
    fn test_apply_matrix_pt_identity() {
        let identity = MATRIX_IDENTITY;
        assert_eq!(
            apply_matrix_pt(identity, (dec!(5), dec!(10))).unwrap(),
            (dec!(5), dec!(10))
        );
    }

    #[test]
    fn test_translate_matrix_uses_own_axes() {
        let m = (dec!(2), dec!(0), dec!(0), dec!(2), dec!(5), dec!(5));
        let t = translate_matrix(m, (dec!(3), dec!(1))).unwrap();
        assert_eq!(t, (dec!(2), dec!(0), dec!(0), dec!(2), dec!(11), dec!(7)));
    }

    #[test]
    fn test_overflow_is_reported() {
        let huge = (Decimal::MAX, dec!(0), dec!(0), Decimal::MAX, dec!(0), dec!(0));
        assert_eq!(mult_matrix(huge, huge), Err(PdfError::NumericOverflow));
    }

    #[test]
    fn test_intersect_rect() {
        let r0 = (dec!(0), dec!(0), dec!(10), dec!(10));
        let r1 = (dec!(5), dec!(5), dec!(15), dec!(15));
        assert_eq!(
            intersect_rect(r0, r1),
            Some((dec!(5), dec!(5), dec!(10), dec!(10)))
        );
        let r2 = (dec!(20), dec!(20), dec!(30), dec!(30));
        assert_eq!(intersect_rect(r0, r2), None);
    }
}
