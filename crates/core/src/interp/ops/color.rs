//! Color operators.
//!
//! Handles: CS, cs, SC, SCN, sc, scn, G, g, RG, rg, K, k
//!
//! - CS/cs: Select color space (stroke/non-stroke)
//! - SC/SCN/sc/scn: Set color in current color space
//! - G/g: DeviceGray (stroke/non-stroke)
//! - RG/rg: DeviceRGB (stroke/non-stroke)
//! - K/k: DeviceCMYK (stroke/non-stroke)

use rust_decimal::Decimal;
use smol_str::SmolStr;

use crate::error::{PdfError, Result};
use crate::interp::interpreter::PDFStreamProcessor;
use crate::interp::operands::Operands;
use crate::interp::registry::Arity;
use crate::model::color::{Color, PDFColorSpace, PREDEFINED_COLORSPACE};
use crate::model::objects::PDFObject;

#[allow(non_snake_case)]
impl PDFStreamProcessor<'_> {
    /// Resolve a colour space operand: a family name, or a key of the
    /// ColorSpace resource dictionary.
    fn resolve_colorspace(&self, name: &str) -> Result<PDFColorSpace> {
        if name == "Pattern" {
            return Ok(PDFColorSpace::pattern(None));
        }
        if let Some(cs) = PREDEFINED_COLORSPACE.get(name) {
            return Ok(cs.clone());
        }
        let entry = self.lookup_resource("ColorSpace", name)?;
        let mut cs = self.parse_colorspace(&entry.object)?;
        cs.resource = Some(name.to_string());
        Ok(cs)
    }

    /// Build a colour space from its definition (a name or an array).
    pub(crate) fn parse_colorspace(&self, spec: &PDFObject) -> Result<PDFColorSpace> {
        let spec = self.resolve(spec);
        let (family, params) = match &spec {
            PDFObject::Name(name) => (name.as_str(), &[][..]),
            PDFObject::Array(items) => match items.split_first() {
                Some((first, rest)) => (first.as_name()?, rest),
                None => return Err(PdfError::InvalidValue("empty colour space array".into())),
            },
            other => {
                return Err(PdfError::TypeError {
                    expected: "name or array",
                    got: other.type_name(),
                });
            }
        };
        let param = |i: usize| {
            params
                .get(i)
                .map(|p| self.resolve(p))
                .ok_or_else(|| PdfError::InvalidValue(format!("{family}: missing parameter {i}")))
        };
        match family {
            "ICCBased" => {
                let profile = param(0)?;
                let n = match profile.as_stream()?.get("N") {
                    Some(n) => self.resolve(n).as_int()?,
                    None => 3,
                };
                let n = usize::try_from(n)
                    .ok()
                    .filter(|n| matches!(n, 1 | 3 | 4))
                    .ok_or_else(|| PdfError::InvalidValue(format!("ICCBased: bad /N {n}")))?;
                Ok(PDFColorSpace::new("ICCBased", n))
            }
            "DeviceN" => {
                let names = param(0)?;
                Ok(PDFColorSpace::new("DeviceN", names.as_array()?.len()))
            }
            "Pattern" => {
                let base = match params.first() {
                    Some(base) => Some(self.parse_colorspace(base)?),
                    None => None,
                };
                Ok(PDFColorSpace::pattern(base))
            }
            "Indexed" | "I" => Ok(PDFColorSpace::new("Indexed", 1)),
            "G" => Ok(PDFColorSpace::device_gray()),
            "RGB" => Ok(PDFColorSpace::device_rgb()),
            "CMYK" => Ok(PDFColorSpace::device_cmyk()),
            other => PREDEFINED_COLORSPACE
                .get(other)
                .cloned()
                .ok_or_else(|| PdfError::InvalidValue(format!("unknown colour space {other}"))),
        }
    }

    /// Components (and pattern name) for the given colour space.
    fn color_operands(cs: &PDFColorSpace, args: &Operands<'_>) -> Result<Color> {
        let mismatch = |expected: usize| PdfError::ArityMismatch {
            operator: SmolStr::new(args.operator()),
            expected: Arity::Exact(expected),
            got: args.len(),
        };
        if cs.is_pattern() {
            let ncomps = cs.base.as_ref().map_or(0, |b| b.ncomponents);
            if args.len() != ncomps + 1 {
                return Err(mismatch(ncomps + 1));
            }
            let name = args.name(ncomps)?.to_string();
            let comps = (0..ncomps)
                .map(|i| args.number(i))
                .collect::<Result<Vec<Decimal>>>()?;
            return Ok(if comps.is_empty() {
                Color::PatternColored(name)
            } else {
                Color::PatternUncolored(comps, name)
            });
        }
        if args.len() != cs.ncomponents {
            return Err(mismatch(cs.ncomponents));
        }
        Ok(cs.color_from(args.numbers()?))
    }

    /// Selects the stroking color space.
    ///
    /// PDF operator: `CS`
    pub fn do_CS(&mut self, name: &str) -> Result<()> {
        let cs = self.resolve_colorspace(name)?;
        self.gstate.scolor = cs.initial_color();
        self.gstate.scs = cs;
        Ok(())
    }

    /// Selects the non-stroking color space.
    ///
    /// PDF operator: `cs`
    pub fn do_cs(&mut self, name: &str) -> Result<()> {
        let cs = self.resolve_colorspace(name)?;
        self.gstate.ncolor = cs.initial_color();
        self.gstate.ncs = cs;
        Ok(())
    }

    /// Sets the stroking color in the current stroking color space.
    ///
    /// PDF operator: `SC`
    pub fn do_SC(&mut self, args: &Operands<'_>) -> Result<()> {
        self.gstate.scolor = Self::color_operands(&self.gstate.scs, args)?;
        Ok(())
    }

    /// Like `SC`, also accepting pattern names.
    ///
    /// PDF operator: `SCN`
    pub fn do_SCN(&mut self, args: &Operands<'_>) -> Result<()> {
        self.do_SC(args)
    }

    /// PDF operator: `sc`
    pub fn do_sc(&mut self, args: &Operands<'_>) -> Result<()> {
        self.gstate.ncolor = Self::color_operands(&self.gstate.ncs, args)?;
        Ok(())
    }

    /// PDF operator: `scn`
    pub fn do_scn(&mut self, args: &Operands<'_>) -> Result<()> {
        self.do_sc(args)
    }

    /// Sets the gray level for stroking operations.
    ///
    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: Decimal) -> Result<()> {
        self.gstate.scs = PDFColorSpace::device_gray();
        self.gstate.scolor = Color::Gray(gray);
        Ok(())
    }

    /// Sets the gray level for non-stroking operations.
    ///
    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: Decimal) -> Result<()> {
        self.gstate.ncs = PDFColorSpace::device_gray();
        self.gstate.ncolor = Color::Gray(gray);
        Ok(())
    }

    /// PDF operator: `RG`
    pub fn do_RG(&mut self, r: Decimal, g: Decimal, b: Decimal) -> Result<()> {
        self.gstate.scs = PDFColorSpace::device_rgb();
        self.gstate.scolor = Color::Rgb(r, g, b);
        Ok(())
    }

    /// PDF operator: `rg`
    pub fn do_rg(&mut self, r: Decimal, g: Decimal, b: Decimal) -> Result<()> {
        self.gstate.ncs = PDFColorSpace::device_rgb();
        self.gstate.ncolor = Color::Rgb(r, g, b);
        Ok(())
    }

    /// PDF operator: `K`
    pub fn do_K(&mut self, c: Decimal, m: Decimal, y: Decimal, k: Decimal) -> Result<()> {
        self.gstate.scs = PDFColorSpace::device_cmyk();
        self.gstate.scolor = Color::Cmyk(c, m, y, k);
        Ok(())
    }

    /// PDF operator: `k`
    pub fn do_k(&mut self, c: Decimal, m: Decimal, y: Decimal, k: Decimal) -> Result<()> {
        self.gstate.ncs = PDFColorSpace::device_cmyk();
        self.gstate.ncolor = Color::Cmyk(c, m, y, k);
        Ok(())
    }
}
