//! Text operators.
//!
//! Handles: BT, ET, Tc, Tw, Tz, TL, Tf, Tr, Ts, Td, TD, Tm, T*, Tj, TJ, ', ", d0, d1
//!
//! Text object:
//! - BT/ET: Begin/end text object
//!
//! Text state:
//! - Tc: Character spacing
//! - Tw: Word spacing
//! - Tz: Horizontal scaling
//! - TL: Leading
//! - Tf: Font and size
//! - Tr: Rendering mode
//! - Ts: Rise (baseline offset)
//!
//! Text positioning:
//! - Td/TD: Move to next line (TD also sets leading)
//! - Tm: Set text matrix directly
//! - T*: Move to next line using current leading
//!
//! Text showing:
//! - Tj: Show string
//! - TJ: Show with individual glyph positioning
//! - ': Move to next line and show
//! - ": Set spacing, move to next line, and show
//!
//! Type 3 glyph metrics:
//! - d0/d1: Declare glyph width (and bounding box), only inside a glyph procedure

use std::sync::Arc;

use rust_decimal::Decimal;
use smol_str::SmolStr;

use crate::error::{PdfError, Result};
use crate::interp::device::{EventKind, EventPayload, GlyphInfo};
use crate::interp::interpreter::{GlyphMetrics, NestedRun, PDFStreamProcessor};
use crate::model::objects::{PDFObject, PDFString};
use crate::model::state::FontRef;
use crate::utils::{Matrix, Point, add, div, mul, mult_matrix, translate_matrix};

#[allow(non_snake_case)]
impl PDFStreamProcessor<'_> {
    // ========================================================================
    // Text Object Operators
    // ========================================================================

    /// BT - Begin text object.
    ///
    /// Initializes the text matrix (Tm) and text line matrix (Tlm) to identity.
    pub fn do_BT(&mut self) -> Result<()> {
        self.gstate.text.reset();
        Ok(())
    }

    /// ET - End text object.
    pub fn do_ET(&mut self) -> Result<()> {
        Ok(())
    }

    // ========================================================================
    // Text State Operators
    // ========================================================================

    /// Tc - Set character spacing.
    pub fn do_Tc(&mut self, charspace: Decimal) -> Result<()> {
        self.gstate.text.charspace = charspace;
        Ok(())
    }

    /// Tw - Set word spacing.
    pub fn do_Tw(&mut self, wordspace: Decimal) -> Result<()> {
        self.gstate.text.wordspace = wordspace;
        Ok(())
    }

    /// Tz - Set horizontal scaling, as a percentage.
    pub fn do_Tz(&mut self, scaling: Decimal) -> Result<()> {
        self.gstate.text.scaling = scaling;
        Ok(())
    }

    /// TL - Set text leading.
    pub fn do_TL(&mut self, leading: Decimal) -> Result<()> {
        self.gstate.text.leading = leading;
        Ok(())
    }

    /// Tf - Set text font and size.
    ///
    /// fontid is the name of a font resource in the Font subdictionary.
    pub fn do_Tf(&mut self, fontid: &str, fontsize: Decimal) -> Result<()> {
        let entry = self.lookup_resource("Font", fontid)?;
        let font = self.load_font(fontid, entry.objref, &entry.object)?;
        self.gstate.text.font = Some(FontRef::new(fontid, font));
        self.gstate.text.fontsize = fontsize;
        Ok(())
    }

    /// Tr - Set text rendering mode.
    ///
    /// Rendering modes: 0=fill, 1=stroke, 2=fill+stroke, 3=invisible,
    /// 4-7 add clipping to modes 0-3.
    pub fn do_Tr(&mut self, render: i64) -> Result<()> {
        self.gstate.text.render = u8::try_from(render)
            .ok()
            .filter(|r| *r <= 7)
            .ok_or_else(|| PdfError::InvalidValue(format!("Tr: bad rendering mode {render}")))?;
        Ok(())
    }

    /// Ts - Set text rise (superscript/subscript offset).
    pub fn do_Ts(&mut self, rise: Decimal) -> Result<()> {
        self.gstate.text.rise = rise;
        Ok(())
    }

    // ========================================================================
    // Text Positioning Operators
    // ========================================================================

    /// Td - Move to start of next line, offset from the start of the
    /// current line by (tx, ty).
    pub fn do_Td(&mut self, offset: Point) -> Result<()> {
        let linematrix = translate_matrix(self.gstate.text.linematrix, offset)?;
        self.gstate.text.linematrix = linematrix;
        self.gstate.text.matrix = linematrix;
        Ok(())
    }

    /// TD - Move to next line and set leading to -ty.
    pub fn do_TD(&mut self, offset: Point) -> Result<()> {
        self.do_Td(offset)?;
        self.gstate.text.leading = -offset.1;
        Ok(())
    }

    /// Tm - Set text matrix and text line matrix.
    pub fn do_Tm(&mut self, matrix: Matrix) -> Result<()> {
        self.gstate.text.matrix = matrix;
        self.gstate.text.linematrix = matrix;
        Ok(())
    }

    /// T* - Move to start of next line using the current leading.
    pub fn do_T_star(&mut self) -> Result<()> {
        self.do_Td((Decimal::ZERO, -self.gstate.text.leading))
    }

    // ========================================================================
    // Text Showing Operators
    // ========================================================================

    fn current_font(&self) -> Result<FontRef> {
        self.gstate
            .text
            .font
            .clone()
            .ok_or_else(|| PdfError::InvalidValue("no font selected".into()))
    }

    /// Trm = [Tfs*Th 0 0 Tfs 0 Trise] x Tm x CTM
    fn text_rendering_matrix(&self) -> Result<Matrix> {
        let ts = &self.gstate.text;
        let size = (
            mul(ts.fontsize, ts.hscale())?,
            Decimal::ZERO,
            Decimal::ZERO,
            ts.fontsize,
            Decimal::ZERO,
            ts.rise,
        );
        mult_matrix(mult_matrix(size, ts.matrix)?, self.gstate.ctm)
    }

    /// Show one string: one glyph event per character code, advancing
    /// the text matrix after each.
    fn show_string(&mut self, operator: &str, font: &FontRef, bytes: &[u8]) -> Result<()> {
        let hscale = self.gstate.text.hscale();
        for code in font.font.decode(bytes) {
            let trm = self.text_rendering_matrix()?;
            let ts = &self.gstate.text;
            let mut advance = add(mul(font.font.char_width(code.code), ts.fontsize)?, ts.charspace)?;
            if code.is_word_space() {
                advance = add(advance, ts.wordspace)?;
            }
            let advance = mul(advance, hscale)?;
            let fontsize = ts.fontsize;

            self.emit(
                EventKind::Glyph,
                EventPayload::Glyph(GlyphInfo {
                    code: code.code,
                    unicode: font.font.to_unichr(code.code),
                    font: font.name.clone(),
                    fontsize,
                    trm,
                    advance,
                }),
            );

            if self.config().execute_type3_glyphs {
                if let Some(proc_stream) = font.font.char_proc(code.code) {
                    let ctm = mult_matrix(font.font.font_matrix(), trm)?;
                    let data = proc_stream.data_bytes();
                    let resources = font.font.resources().cloned();
                    let run = NestedRun::Glyph {
                        code: code.code,
                        font: Arc::as_ptr(&font.font) as *const () as usize,
                        proc_id: data.as_ptr() as usize,
                    };
                    if let Err(e) = self.run_nested(run, data, resources, ctm) {
                        self.report(Some(operator), e);
                    }
                }
            }

            self.gstate.text.matrix =
                translate_matrix(self.gstate.text.matrix, (advance, Decimal::ZERO))?;
        }
        Ok(())
    }

    /// TJ - Show text with individual glyph positioning.
    ///
    /// Numbers move the next glyph left by n/1000 of the font size.
    pub fn do_TJ(&mut self, seq: &[PDFObject]) -> Result<()> {
        if let Some(bad) = seq
            .iter()
            .find(|item| !matches!(item, PDFObject::Number(_) | PDFObject::String(_)))
        {
            return Err(PdfError::TypeMismatch {
                operator: SmolStr::new_static("TJ"),
                index: 0,
                expected: "array of strings and numbers",
                got: bad.type_name(),
            });
        }
        let font = self.current_font()?;
        for item in seq {
            match item {
                PDFObject::Number(n) => {
                    let ts = &self.gstate.text;
                    let shift = div(mul(mul(*n, ts.fontsize)?, ts.hscale())?, Decimal::ONE_THOUSAND)?;
                    self.gstate.text.matrix =
                        translate_matrix(self.gstate.text.matrix, (-shift, Decimal::ZERO))?;
                }
                PDFObject::String(s) => self.show_string("TJ", &font, s.as_bytes())?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Tj - Show text string.
    pub fn do_Tj(&mut self, s: &PDFString) -> Result<()> {
        let font = self.current_font()?;
        self.show_string("Tj", &font, s.as_bytes())
    }

    /// ' - Move to next line and show text.
    ///
    /// Equivalent to: T* (string) Tj
    pub fn do_quote(&mut self, s: &PDFString) -> Result<()> {
        let font = self.current_font()?;
        self.do_T_star()?;
        self.show_string("'", &font, s.as_bytes())
    }

    /// " - Set word/char spacing, move to next line, and show text.
    pub fn do_doublequote(&mut self, aw: Decimal, ac: Decimal, s: &PDFString) -> Result<()> {
        let font = self.current_font()?;
        self.gstate.text.wordspace = aw;
        self.gstate.text.charspace = ac;
        self.do_T_star()?;
        self.show_string("\"", &font, s.as_bytes())
    }

    // ========================================================================
    // Type 3 Glyph Metrics
    // ========================================================================

    fn require_glyph(&self, operator: &str) -> Result<()> {
        if self.in_glyph() {
            Ok(())
        } else {
            Err(PdfError::InvalidValue(format!(
                "{operator} outside a Type 3 glyph procedure"
            )))
        }
    }

    /// d0 - Set glyph width for a colored Type 3 glyph.
    pub fn do_d0(&mut self, width: Point) -> Result<()> {
        self.require_glyph("d0")?;
        self.glyph_metrics = Some(GlyphMetrics { width, bbox: None });
        Ok(())
    }

    /// d1 - Set glyph width and bounding box for an uncolored Type 3 glyph.
    pub fn do_d1(&mut self, width: Point, ll: Point, ur: Point) -> Result<()> {
        self.require_glyph("d1")?;
        self.glyph_metrics = Some(GlyphMetrics {
            width,
            bbox: Some((ll.0, ll.1, ur.0, ur.1)),
        });
        Ok(())
    }
}
