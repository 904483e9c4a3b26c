//! Graphics state operators.
//!
//! Handles: q, Q, cm, w, J, j, M, d, ri, i, gs
//!
//! These operators manage the graphics state stack and transformation matrix.
//! - q/Q: Push/pop graphics state
//! - cm: Concatenate transformation matrix
//! - w, J, j, M, d: Line styling (width, cap, join, miter limit, dash)
//! - ri, i: Rendering intent and flatness
//! - gs: Set parameters from graphics state dictionary

use rust_decimal::Decimal;

use crate::error::{PdfError, Result};
use crate::interp::interpreter::PDFStreamProcessor;
use crate::model::objects::{PDFDict, PDFObject};
use crate::model::state::{DashPattern, FontRef, PDFGraphicState};
use crate::utils::{Matrix, mult_matrix};

fn style_code(operator: &str, value: i64, max: u8) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| PdfError::InvalidValue(format!("{operator}: {value} is out of range 0..={max}")))
}

fn dash_from(operator: &str, array: &[PDFObject], phase: Decimal) -> Result<DashPattern> {
    let array = array
        .iter()
        .map(PDFObject::as_number)
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.for_operand(operator, 0))?;
    if array.iter().any(Decimal::is_sign_negative) {
        return Err(PdfError::InvalidValue(format!("{operator}: negative dash length")));
    }
    Ok(DashPattern { array, phase })
}

#[allow(non_snake_case)]
impl PDFStreamProcessor<'_> {
    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) -> Result<()> {
        self.gstack.push(self.gstate.clone());
        Ok(())
    }

    /// Restores the graphics state from the stack.
    ///
    /// A restore without a matching save in the same stream leaves the
    /// state untouched and fails with `StackUnderflow`.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) -> Result<()> {
        if self.gstack.len() <= self.gstack_floor {
            return Err(PdfError::StackUnderflow);
        }
        if let Some(state) = self.gstack.pop() {
            self.gstate = state;
        }
        Ok(())
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, matrix: Matrix) -> Result<()> {
        self.gstate.ctm = mult_matrix(matrix, self.gstate.ctm)?;
        Ok(())
    }

    /// Sets the line width, in user space units.
    ///
    /// PDF operator: `w`
    pub fn do_w(&mut self, linewidth: Decimal) -> Result<()> {
        self.gstate.linewidth = linewidth;
        Ok(())
    }

    /// PDF operator: `J`
    pub fn do_J(&mut self, linecap: i64) -> Result<()> {
        self.gstate.linecap = style_code("J", linecap, 2)?;
        Ok(())
    }

    /// PDF operator: `j`
    pub fn do_j(&mut self, linejoin: i64) -> Result<()> {
        self.gstate.linejoin = style_code("j", linejoin, 2)?;
        Ok(())
    }

    /// PDF operator: `M`
    pub fn do_M(&mut self, miterlimit: Decimal) -> Result<()> {
        self.gstate.miterlimit = miterlimit;
        Ok(())
    }

    /// Sets the line dash pattern in the graphics state.
    ///
    /// PDF operator: `d`
    pub fn do_d(&mut self, array: &[PDFObject], phase: Decimal) -> Result<()> {
        self.gstate.dash = dash_from("d", array, phase)?;
        Ok(())
    }

    /// PDF operator: `ri`
    pub fn do_ri(&mut self, intent: &str) -> Result<()> {
        self.gstate.intent = intent.to_string();
        Ok(())
    }

    /// PDF operator: `i`
    pub fn do_i(&mut self, flatness: Decimal) -> Result<()> {
        self.gstate.flatness = flatness;
        Ok(())
    }

    /// Sets parameters from a graphics state parameter dictionary.
    ///
    /// The dictionary is applied to a copy of the state, so a bad entry
    /// leaves the current state untouched.
    ///
    /// PDF operator: `gs`
    pub fn do_gs(&mut self, name: &str) -> Result<()> {
        let entry = self.lookup_resource("ExtGState", name)?;
        let dict = entry.object.as_dict()?.clone();
        let mut state = self.gstate.clone();
        self.apply_extgstate(&mut state, &dict)?;
        self.gstate = state;
        Ok(())
    }

    fn apply_extgstate(&mut self, state: &mut PDFGraphicState, dict: &PDFDict) -> Result<()> {
        let mut stroke_overprint_set = false;
        let mut fill_overprint_set = false;
        for (key, raw) in dict {
            let value = self.resolve(raw);
            let bad = |e: PdfError| match e {
                PdfError::TypeError { expected, got } => {
                    PdfError::InvalidValue(format!("ExtGState /{key}: expected {expected}, got {got}"))
                }
                other => other,
            };
            match key.as_str() {
                "LW" => state.linewidth = value.as_number().map_err(bad)?,
                "LC" => state.linecap = style_code("gs", value.as_int().map_err(bad)?, 2)?,
                "LJ" => state.linejoin = style_code("gs", value.as_int().map_err(bad)?, 2)?,
                "ML" => state.miterlimit = value.as_number().map_err(bad)?,
                "D" => {
                    let parts = value.as_array().map_err(bad)?;
                    let [array, phase] = parts.as_slice() else {
                        return Err(PdfError::InvalidValue(
                            "ExtGState /D: expected [array phase]".into(),
                        ));
                    };
                    let array = self.resolve(array);
                    state.dash = dash_from(
                        "gs",
                        array.as_array().map_err(bad)?,
                        self.resolve(phase).as_number().map_err(bad)?,
                    )?;
                }
                "RI" => state.intent = value.as_name().map_err(bad)?.to_string(),
                "FL" => state.flatness = value.as_number().map_err(bad)?,
                "SA" => state.stroke_adjust = value.as_bool().map_err(bad)?,
                "BM" => {
                    let mode = match &value {
                        PDFObject::Array(modes) => modes
                            .first()
                            .ok_or_else(|| PdfError::InvalidValue("ExtGState /BM: empty array".into()))?
                            .as_name()
                            .map_err(bad)?,
                        other => other.as_name().map_err(bad)?,
                    };
                    state.blend_mode = mode.to_string();
                }
                "SMask" => {
                    state.soft_mask = match &value {
                        PDFObject::Name(n) if n == "None" => None,
                        PDFObject::Dict(_) | PDFObject::Stream(_) => Some(value.clone()),
                        other => {
                            return Err(PdfError::InvalidValue(format!(
                                "ExtGState /SMask: unexpected {}",
                                other.type_name()
                            )));
                        }
                    };
                }
                "CA" => state.stroke_alpha = value.as_number().map_err(bad)?,
                "ca" => state.fill_alpha = value.as_number().map_err(bad)?,
                "OP" => {
                    state.overprint_stroke = value.as_bool().map_err(bad)?;
                    stroke_overprint_set = true;
                }
                "op" => {
                    state.overprint_fill = value.as_bool().map_err(bad)?;
                    fill_overprint_set = true;
                }
                "OPM" => {
                    state.overprint_mode = style_code("gs", value.as_int().map_err(bad)?, 1)?;
                }
                "Font" => {
                    let parts = value.as_array().map_err(bad)?;
                    let [font_obj, size] = parts.as_slice() else {
                        return Err(PdfError::InvalidValue(
                            "ExtGState /Font: expected [font size]".into(),
                        ));
                    };
                    let objref = match font_obj {
                        PDFObject::Ref(r) => Some(*r),
                        _ => None,
                    };
                    let label = match objref {
                        Some(r) => format!("{} {} R", r.objid, r.genno),
                        None => format!("{key}@{}", self.depth),
                    };
                    let font = self.load_font(&label, objref, font_obj)?;
                    state.text.font = Some(FontRef::new(label, font));
                    state.text.fontsize = self.resolve(size).as_number().map_err(bad)?;
                }
                "TK" => state.text.knockout = value.as_bool().map_err(bad)?,
                _ => {}
            }
        }
        // OP alone governs both stroking and non-stroking overprint
        if stroke_overprint_set && !fill_overprint_set {
            state.overprint_fill = state.overprint_stroke;
        }
        Ok(())
    }
}
