//! Marked content and compatibility operators.
//!
//! Handles: MP, DP, BMC, BDC, EMC, BX, EX
//!
//! - BMC/BDC: Begin marked content sequence (BDC with a property list)
//! - EMC: End marked content sequence
//! - MP/DP: Marked content point (DP with a property list)
//! - BX/EX: Compatibility section; unknown operators inside are ignored
//!
//! A property list operand is either an inline dictionary or the name of
//! an entry in the Properties resource.

use crate::error::{PdfError, Result};
use crate::interp::device::{EventKind, EventPayload};
use crate::interp::interpreter::{MarkedFrame, PDFStreamProcessor};
use crate::model::objects::{PDFDict, PDFObject};

#[allow(non_snake_case)]
impl PDFStreamProcessor<'_> {
    fn property_list(&self, props: &PDFObject) -> Result<PDFDict> {
        let obj = match props {
            PDFObject::Name(name) => self.lookup_resource("Properties", name)?.object,
            other => self.resolve(other),
        };
        match obj {
            PDFObject::Dict(d) => Ok(d),
            other => Err(PdfError::TypeError {
                expected: "property list dictionary",
                got: other.type_name(),
            }),
        }
    }

    fn begin_marked(&mut self, tag: &str, props: Option<PDFDict>) {
        self.mcstack.push(MarkedFrame {
            tag: tag.to_string(),
            props: props.clone(),
        });
        self.emit(
            EventKind::MarkedContentBegin,
            EventPayload::MarkedContent {
                tag: tag.to_string(),
                props,
            },
        );
    }

    /// PDF operator: `MP`
    pub fn do_MP(&mut self, tag: &str) -> Result<()> {
        self.emit(
            EventKind::MarkedContentPoint,
            EventPayload::MarkedContent {
                tag: tag.to_string(),
                props: None,
            },
        );
        Ok(())
    }

    /// PDF operator: `DP`
    pub fn do_DP(&mut self, tag: &str, props: &PDFObject) -> Result<()> {
        let props = self.property_list(props)?;
        self.emit(
            EventKind::MarkedContentPoint,
            EventPayload::MarkedContent {
                tag: tag.to_string(),
                props: Some(props),
            },
        );
        Ok(())
    }

    /// Begins a marked-content sequence.
    ///
    /// PDF operator: `BMC`
    pub fn do_BMC(&mut self, tag: &str) -> Result<()> {
        self.begin_marked(tag, None);
        Ok(())
    }

    /// Begins a marked-content sequence with a property list.
    ///
    /// The section is opened even when the property list cannot be
    /// resolved, so the matching `EMC` still balances.
    ///
    /// PDF operator: `BDC`
    pub fn do_BDC(&mut self, tag: &str, props: &PDFObject) -> Result<()> {
        match self.property_list(props) {
            Ok(props) => {
                self.begin_marked(tag, Some(props));
                Ok(())
            }
            Err(e) => {
                self.begin_marked(tag, None);
                Err(e)
            }
        }
    }

    /// Ends the innermost marked-content sequence opened in this stream.
    ///
    /// PDF operator: `EMC`
    pub fn do_EMC(&mut self) -> Result<()> {
        if self.mcstack.len() <= self.mc_floor {
            return Err(PdfError::MarkedContentMismatch(
                "EMC without an open section".into(),
            ));
        }
        if let Some(frame) = self.mcstack.pop() {
            self.emit(
                EventKind::MarkedContentEnd,
                EventPayload::MarkedContent {
                    tag: frame.tag,
                    props: frame.props,
                },
            );
        }
        Ok(())
    }

    /// PDF operator: `BX`
    pub fn do_BX(&mut self) -> Result<()> {
        self.compat_depth += 1;
        Ok(())
    }

    /// PDF operator: `EX`
    pub fn do_EX(&mut self) -> Result<()> {
        self.compat_depth = self.compat_depth.saturating_sub(1);
        Ok(())
    }
}
