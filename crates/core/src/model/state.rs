//! PDF Graphics and Text State.
//!
//! Every field is value-typed: cloning a state (on `q`, or for an event
//! snapshot) never shares mutable data with the live state. Fonts are
//! immutable and shared through `Arc`.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::color::{Color, PDFColorSpace};
use super::objects::PDFObject;
use super::path::ClipPath;
use crate::interp::font::PDFFont;
use crate::utils::{MATRIX_IDENTITY, Matrix};

/// A loaded font together with the resource name it was selected by.
#[derive(Clone)]
pub struct FontRef {
    /// Resource name (e.g., "F1")
    pub name: String,
    pub font: Arc<dyn PDFFont>,
}

impl FontRef {
    pub fn new(name: impl Into<String>, font: Arc<dyn PDFFont>) -> Self {
        Self {
            name: name.into(),
            font,
        }
    }
}

impl PartialEq for FontRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.font, &other.font)
    }
}

impl fmt::Debug for FontRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRef")
            .field("name", &self.name)
            .field("subtype", &self.font.subtype())
            .finish()
    }
}

/// PDF Text State - text positioning and rendering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFTextState {
    /// Current font (None until `Tf`)
    pub font: Option<FontRef>,
    /// Font size in text space units
    pub fontsize: Decimal,
    /// Character spacing (Tc)
    pub charspace: Decimal,
    /// Word spacing (Tw), applied to the single-byte code 32
    pub wordspace: Decimal,
    /// Horizontal scaling percentage (100 = normal)
    pub scaling: Decimal,
    /// Text leading (TL)
    pub leading: Decimal,
    /// Text rendering mode (0-7)
    pub render: u8,
    /// Text rise (superscript/subscript offset)
    pub rise: Decimal,
    /// Text knockout flag (ExtGState TK)
    pub knockout: bool,
    /// Text matrix (Tm)
    pub matrix: Matrix,
    /// Text line matrix (Tlm)
    pub linematrix: Matrix,
}

impl PDFTextState {
    /// Create a new text state with default values.
    pub fn new() -> Self {
        Self {
            font: None,
            fontsize: Decimal::ZERO,
            charspace: Decimal::ZERO,
            wordspace: Decimal::ZERO,
            scaling: Decimal::ONE_HUNDRED,
            leading: Decimal::ZERO,
            render: 0,
            rise: Decimal::ZERO,
            knockout: true,
            matrix: MATRIX_IDENTITY,
            linematrix: MATRIX_IDENTITY,
        }
    }

    /// Reset text matrix and line matrix to defaults.
    ///
    /// Called at the start of each text object (BT operator).
    pub fn reset(&mut self) {
        self.matrix = MATRIX_IDENTITY;
        self.linematrix = MATRIX_IDENTITY;
    }

    /// Horizontal scaling as a factor (Th).
    pub fn hscale(&self) -> Decimal {
        self.scaling / Decimal::ONE_HUNDRED
    }
}

impl Default for PDFTextState {
    fn default() -> Self {
        Self::new()
    }
}

/// Line dash pattern: dash array plus phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashPattern {
    pub array: Vec<Decimal>,
    pub phase: Decimal,
}

/// PDF Graphics State - the full rendering context.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFGraphicState {
    /// Current transformation matrix
    pub ctm: Matrix,
    /// Current clipping path, in device space
    pub clip: ClipPath,

    /// Line width for stroke operations, in user space
    pub linewidth: Decimal,
    /// Line cap style (0, 1, or 2)
    pub linecap: u8,
    /// Line join style (0, 1, or 2)
    pub linejoin: u8,
    /// Miter limit for line joins
    pub miterlimit: Decimal,
    pub dash: DashPattern,
    /// Rendering intent name
    pub intent: String,
    /// Flatness tolerance
    pub flatness: Decimal,
    /// Automatic stroke adjustment (ExtGState SA)
    pub stroke_adjust: bool,

    /// Stroking color
    pub scolor: Color,
    /// Stroking color space
    pub scs: PDFColorSpace,
    /// Non-stroking (fill) color
    pub ncolor: Color,
    /// Non-stroking color space
    pub ncs: PDFColorSpace,

    /// Blend mode name
    pub blend_mode: String,
    /// Soft mask dictionary; `None` is the `/None` mask
    pub soft_mask: Option<PDFObject>,
    /// Stroking alpha (CA)
    pub stroke_alpha: Decimal,
    /// Non-stroking alpha (ca)
    pub fill_alpha: Decimal,
    pub overprint_stroke: bool,
    pub overprint_fill: bool,
    pub overprint_mode: u8,

    pub text: PDFTextState,
}

impl PDFGraphicState {
    /// Create new graphics state with default values.
    pub fn new() -> Self {
        Self::with_ctm(MATRIX_IDENTITY)
    }

    /// Initial state of a run that starts in the given page space.
    pub fn with_ctm(ctm: Matrix) -> Self {
        Self {
            ctm,
            clip: ClipPath::default(),
            linewidth: Decimal::ONE,
            linecap: 0,
            linejoin: 0,
            miterlimit: Decimal::TEN,
            dash: DashPattern::default(),
            intent: "RelativeColorimetric".to_string(),
            flatness: Decimal::ONE,
            stroke_adjust: false,
            scolor: Color::default(),
            scs: PDFColorSpace::device_gray(),
            ncolor: Color::default(),
            ncs: PDFColorSpace::device_gray(),
            blend_mode: "Normal".to_string(),
            soft_mask: None,
            stroke_alpha: Decimal::ONE,
            fill_alpha: Decimal::ONE,
            overprint_stroke: false,
            overprint_fill: false,
            overprint_mode: 0,
            text: PDFTextState::new(),
        }
    }
}

impl Default for PDFGraphicState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let gs = PDFGraphicState::new();
        assert_eq!(gs.linewidth, dec!(1));
        assert_eq!(gs.miterlimit, dec!(10));
        assert_eq!(gs.text.rise, dec!(0));
        assert_eq!(gs.text.scaling, dec!(100));
        assert_eq!(gs.ncs.name, "DeviceGray");
        assert!(gs.clip.is_unbounded());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut gs = PDFGraphicState::new();
        let saved = gs.clone();
        gs.text.rise = dec!(3);
        gs.dash.array.push(dec!(2));
        assert_eq!(saved.text.rise, dec!(0));
        assert!(saved.dash.array.is_empty());
        assert_ne!(saved, gs);
    }

    #[test]
    fn test_bt_reset() {
        let mut ts = PDFTextState::new();
        ts.matrix = (dec!(2), dec!(0), dec!(0), dec!(2), dec!(5), dec!(5));
        ts.reset();
        assert_eq!(ts.matrix, MATRIX_IDENTITY);
        assert_eq!(ts.hscale(), dec!(1));
    }
}
