//! XObject, inline image and shading operators.
//!
//! Handles: Do, BI, ID, EI, sh
//!
//! XObjects:
//! - Do: Invoke named XObject (Form or Image)
//!
//! Inline images:
//! - BI/ID/EI: the lexer folds the whole `BI ... ID ... EI` sequence into a
//!   single image token, dispatched as `EI` with the image as its operand.
//!   `BI` and `ID` only reach the registry when they appear out of place.
//!
//! Shading:
//! - sh: Paint the shading named in the Shading resource

use tracing::trace;

use crate::error::{PdfError, Result};
use crate::interp::device::{EventKind, EventPayload, ImageInfo};
use crate::interp::interpreter::{NestedRun, PDFStreamProcessor};
use crate::model::objects::{PDFObject, PDFStream};
use crate::utils::{MATRIX_IDENTITY, Matrix, Rect, mult_matrix};

#[allow(non_snake_case)]
impl PDFStreamProcessor<'_> {
    fn form_matrix(&self, xobj: &PDFStream) -> Result<Matrix> {
        let Some(obj) = xobj.get("Matrix") else {
            return Ok(MATRIX_IDENTITY);
        };
        match self.resolve(obj).as_number_array()?.as_slice() {
            &[a, b, c, d, e, f] => Ok((a, b, c, d, e, f)),
            other => Err(PdfError::InvalidValue(format!(
                "form /Matrix has {} elements",
                other.len()
            ))),
        }
    }

    fn form_bbox(&self, xobj: &PDFStream) -> Result<Option<Rect>> {
        let Some(obj) = xobj.get("BBox") else {
            return Ok(None);
        };
        match self.resolve(obj).as_number_array()?.as_slice() {
            &[x0, y0, x1, y1] => Ok(Some((x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)))),
            other => Err(PdfError::InvalidValue(format!(
                "form /BBox has {} elements",
                other.len()
            ))),
        }
    }

    // ========================================================================
    // XObject Operators
    // ========================================================================

    /// Do - Invoke named XObject (images or form XObjects).
    ///
    /// Forms run as a nested stream with the form matrix concatenated to
    /// the CTM and the form's own resources in front of the current ones.
    ///
    /// PDF operator: `Do`
    pub fn do_Do(&mut self, xobjid: &str) -> Result<()> {
        let entry = self.lookup_resource("XObject", xobjid)?;
        let xobj = match entry.object {
            PDFObject::Stream(xobj) => xobj,
            other => {
                return Err(PdfError::TypeError {
                    expected: "stream",
                    got: other.type_name(),
                });
            }
        };
        let subtype = xobj
            .get("Subtype")
            .map(|s| self.resolve(s))
            .unwrap_or(PDFObject::Null);

        match subtype.as_name().unwrap_or("") {
            "Form" => {
                let matrix = self.form_matrix(&xobj)?;
                let bbox = self.form_bbox(&xobj)?;
                let resources = match xobj.get("Resources").map(|r| self.resolve(r)) {
                    Some(PDFObject::Dict(d)) => Some(d),
                    _ => None,
                };
                let ctm = mult_matrix(matrix, self.gstate.ctm)?;
                let run = NestedRun::Form {
                    name: xobjid.to_string(),
                    objref: entry.objref,
                    matrix,
                    bbox,
                };
                self.run_nested(run, xobj.data_bytes(), resources, ctm)
            }
            "Image" => {
                self.emit(
                    EventKind::Image,
                    EventPayload::Image(ImageInfo {
                        name: xobjid.to_string(),
                        inline: false,
                        stream: *xobj,
                    }),
                );
                Ok(())
            }
            other => {
                trace!(xobject = xobjid, subtype = other, "xobject ignored");
                Ok(())
            }
        }
    }

    // ========================================================================
    // Inline Image Operators
    // ========================================================================

    /// BI - Begin inline image.
    ///
    /// Only dispatched for a `BI` the lexer could not pair with `ID`.
    pub fn do_BI(&mut self) -> Result<()> {
        Err(PdfError::InvalidValue("BI without inline image data".into()))
    }

    /// ID - Begin inline image data.
    pub fn do_ID(&mut self) -> Result<()> {
        Err(PdfError::InvalidValue("ID outside an inline image".into()))
    }

    /// EI - End inline image; receives the complete image.
    pub fn do_EI(&mut self, image: &PDFStream) -> Result<()> {
        let name = format!("inline{}", self.inline_images);
        self.inline_images += 1;
        self.emit(
            EventKind::Image,
            EventPayload::Image(ImageInfo {
                name,
                inline: true,
                stream: image.clone(),
            }),
        );
        Ok(())
    }

    // ========================================================================
    // Shading Operator
    // ========================================================================

    /// sh - Paint shading pattern.
    ///
    /// PDF operator: `sh`
    pub fn do_sh(&mut self, name: &str) -> Result<()> {
        let entry = self.lookup_resource("Shading", name)?;
        self.emit(
            EventKind::Shading,
            EventPayload::Shading {
                name: name.to_string(),
                shading: entry.object,
            },
        );
        Ok(())
    }
}
