//! Font capability consumed by the text operators.
//!
//! The interpreter needs only a narrow view of a font: how to split a
//! shown string into character codes, each code's horizontal advance, an
//! optional Unicode mapping, and for Type 3 fonts the glyph procedures.
//! Hosts with a full font engine implement [`FontLoader`] themselves; the
//! [`DefaultFontLoader`] reads the metrics straight from the font dictionary.

use std::sync::Arc;

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use super::resources::{ObjectResolver, resolve_object};
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject, PDFStream};
use crate::parser::lexer::{ContentLexer, Keyword, PSToken};
use crate::utils::{Matrix, mul};

/// One character code read from a shown string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharCode {
    pub code: u32,
    /// Number of bytes the code occupied
    pub nbytes: u8,
}

impl CharCode {
    /// Word spacing applies only to the single-byte code 32.
    pub const fn is_word_space(self) -> bool {
        self.nbytes == 1 && self.code == 32
    }
}

/// Glyph space to text space for fonts other than Type 3.
pub const FONT_MATRIX_DEFAULT: Matrix = (
    Decimal::from_parts(1, 0, 0, false, 3),
    Decimal::ZERO,
    Decimal::ZERO,
    Decimal::from_parts(1, 0, 0, false, 3),
    Decimal::ZERO,
    Decimal::ZERO,
);

/// PDF Font trait - what the text operators need from a font.
pub trait PDFFont: Send + Sync {
    /// Font dictionary /Subtype (e.g., "Type1", "Type0", "Type3").
    fn subtype(&self) -> &str;

    /// Get the font name (BaseFont) if available.
    fn fontname(&self) -> Option<&str> {
        None
    }

    fn is_multibyte(&self) -> bool {
        false
    }

    /// Split a string operand into character codes.
    fn decode(&self, bytes: &[u8]) -> Vec<CharCode> {
        bytes
            .iter()
            .map(|&b| CharCode {
                code: u32::from(b),
                nbytes: 1,
            })
            .collect()
    }

    /// Horizontal advance of `code` in text space for a font size of 1.
    fn char_width(&self, code: u32) -> Decimal;

    /// Convert a code to Unicode character(s).
    fn to_unichr(&self, code: u32) -> Option<String>;

    fn font_matrix(&self) -> Matrix {
        FONT_MATRIX_DEFAULT
    }

    /// Glyph procedure of a Type 3 font.
    fn char_proc(&self, _code: u32) -> Option<&PDFStream> {
        None
    }

    /// Resources of a Type 3 font's glyph procedures.
    fn resources(&self) -> Option<&PDFDict> {
        None
    }
}

/// Builds fonts from font dictionaries.
pub trait FontLoader: Send + Sync {
    fn load(
        &self,
        name: &str,
        spec: &PDFDict,
        resolver: Option<&dyn ObjectResolver>,
    ) -> Result<Arc<dyn PDFFont>>;
}

/// Reads widths and encodings directly from the font dictionary.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFontLoader;

impl FontLoader for DefaultFontLoader {
    fn load(
        &self,
        name: &str,
        spec: &PDFDict,
        resolver: Option<&dyn ObjectResolver>,
    ) -> Result<Arc<dyn PDFFont>> {
        let subtype = spec
            .get("Subtype")
            .map(|s| resolve_object(s, resolver))
            .and_then(|s| s.as_name().ok().map(str::to_string))
            .unwrap_or_else(|| "Type1".to_string());
        let tounicode = spec
            .get("ToUnicode")
            .map(|obj| resolve_object(obj, resolver))
            .and_then(|obj| obj.as_stream().ok().map(|s| parse_tounicode(s.get_data())))
            .unwrap_or_default();
        match subtype.as_str() {
            "Type0" => Ok(Arc::new(CompositeFont::from_dict(spec, tounicode, resolver)?)),
            "Type3" => Ok(Arc::new(Type3Font::from_dict(name, spec, tounicode, resolver)?)),
            _ => Ok(Arc::new(SimpleFont::from_dict(subtype, spec, tounicode, resolver)?)),
        }
    }
}

fn base_font(spec: &PDFDict, resolver: Option<&dyn ObjectResolver>) -> Option<String> {
    let obj = resolve_object(spec.get("BaseFont")?, resolver);
    obj.as_name().ok().map(str::to_string)
}

fn number_list(obj: &PDFObject, resolver: Option<&dyn ObjectResolver>) -> Result<Vec<Decimal>> {
    let obj = resolve_object(obj, resolver);
    obj.as_array()?
        .iter()
        .map(|item| resolve_object(item, resolver).as_number())
        .collect()
}

fn to_code(value: Decimal) -> Result<u32> {
    if !value.fract().is_zero() {
        return Err(PdfError::InvalidValue(format!("bad character code {value}")));
    }
    value
        .to_u32()
        .ok_or_else(|| PdfError::InvalidValue(format!("bad character code {value}")))
}

/// Largest CID a /W entry may describe.
const MAX_CID: u32 = 0xFFFF;

/// Largest number of codes one `bfrange` entry may map.
const MAX_BFRANGE_SPAN: u32 = 0xFFFF;

/// Parse a CIDFont /W array.
///
/// Handles both `c [w1 w2 ...]` and `cfirst clast w` entries.
pub fn parse_cid_widths(
    seq: &[PDFObject],
    resolver: Option<&dyn ObjectResolver>,
) -> FxHashMap<u32, Decimal> {
    let mut widths = FxHashMap::default();
    let mut pending: Vec<Decimal> = Vec::new();
    for item in seq {
        match resolve_object(item, resolver) {
            PDFObject::Array(arr) => {
                if let Some(first) = pending.pop().and_then(|c| to_code(c).ok()) {
                    for (i, w) in arr.iter().enumerate() {
                        let Some(code) = u32::try_from(i)
                            .ok()
                            .and_then(|i| first.checked_add(i))
                            .filter(|c| *c <= MAX_CID)
                        else {
                            break;
                        };
                        if let Ok(width) = resolve_object(w, resolver).as_number() {
                            widths.insert(code, width);
                        }
                    }
                }
                pending.clear();
            }
            PDFObject::Number(n) => {
                pending.push(n);
                if pending.len() == 3 {
                    let (c1, c2, w) = (pending[0], pending[1], pending[2]);
                    if let (Ok(first), Ok(last)) = (to_code(c1), to_code(c2))
                        && first <= last
                        && last <= MAX_CID
                    {
                        for code in first..=last {
                            widths.insert(code, w);
                        }
                    }
                    pending.clear();
                }
            }
            _ => pending.clear(),
        }
    }
    widths
}

/// Type1, TrueType and MMType1 fonts: one byte per code.
#[derive(Debug, Clone)]
pub struct SimpleFont {
    subtype: String,
    basefont: Option<String>,
    first_char: u32,
    widths: Vec<Decimal>,
    missing_width: Decimal,
    tounicode: FxHashMap<u32, String>,
}

impl SimpleFont {
    pub fn from_dict(
        subtype: String,
        spec: &PDFDict,
        tounicode: FxHashMap<u32, String>,
        resolver: Option<&dyn ObjectResolver>,
    ) -> Result<Self> {
        let first_char = match spec.get("FirstChar") {
            Some(obj) => to_code(resolve_object(obj, resolver).as_number()?)?,
            None => 0,
        };
        let widths = match spec.get("Widths") {
            Some(obj) => number_list(obj, resolver)?,
            None => Vec::new(),
        };
        let missing_width = spec
            .get("FontDescriptor")
            .map(|d| resolve_object(d, resolver))
            .and_then(|d| d.as_dict().ok().and_then(|d| d.get("MissingWidth").cloned()))
            .and_then(|w| resolve_object(&w, resolver).as_number().ok())
            .unwrap_or(Decimal::ZERO);
        Ok(Self {
            subtype,
            basefont: base_font(spec, resolver),
            first_char,
            widths,
            missing_width,
            tounicode,
        })
    }
}

impl PDFFont for SimpleFont {
    fn subtype(&self) -> &str {
        &self.subtype
    }

    fn fontname(&self) -> Option<&str> {
        self.basefont.as_deref()
    }

    fn char_width(&self, code: u32) -> Decimal {
        let w = code
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.missing_width);
        w / Decimal::ONE_THOUSAND
    }

    fn to_unichr(&self, code: u32) -> Option<String> {
        if let Some(s) = self.tounicode.get(&code) {
            return Some(s.clone());
        }
        let b = u8::try_from(code).ok()?;
        (b.is_ascii_graphic() || b == b' ').then(|| char::from(b).to_string())
    }
}

/// Type0 font over a CIDFont with two-byte codes (Identity encoding).
#[derive(Debug, Clone)]
pub struct CompositeFont {
    basefont: Option<String>,
    widths: FxHashMap<u32, Decimal>,
    default_width: Decimal,
    tounicode: FxHashMap<u32, String>,
}

impl CompositeFont {
    pub fn from_dict(
        spec: &PDFDict,
        tounicode: FxHashMap<u32, String>,
        resolver: Option<&dyn ObjectResolver>,
    ) -> Result<Self> {
        let descendant = spec
            .get("DescendantFonts")
            .map(|d| resolve_object(d, resolver))
            .and_then(|d| d.as_array().ok().and_then(|a| a.first().cloned()))
            .map(|d| resolve_object(&d, resolver))
            .and_then(|d| d.as_dict().ok().cloned())
            .unwrap_or_default();
        let widths = match descendant.get("W").map(|w| resolve_object(w, resolver)) {
            Some(PDFObject::Array(seq)) => parse_cid_widths(&seq, resolver),
            _ => FxHashMap::default(),
        };
        let default_width = match descendant.get("DW") {
            Some(dw) => resolve_object(dw, resolver).as_number()?,
            None => Decimal::ONE_THOUSAND,
        };
        Ok(Self {
            basefont: base_font(spec, resolver),
            widths,
            default_width,
            tounicode,
        })
    }
}

impl PDFFont for CompositeFont {
    fn subtype(&self) -> &str {
        "Type0"
    }

    fn fontname(&self) -> Option<&str> {
        self.basefont.as_deref()
    }

    fn is_multibyte(&self) -> bool {
        true
    }

    /// Two bytes per code; a trailing odd byte forms a one-byte code.
    fn decode(&self, bytes: &[u8]) -> Vec<CharCode> {
        bytes
            .chunks(2)
            .map(|chunk| match *chunk {
                [hi, lo] => CharCode {
                    code: u32::from(u16::from_be_bytes([hi, lo])),
                    nbytes: 2,
                },
                [b] => CharCode {
                    code: u32::from(b),
                    nbytes: 1,
                },
                _ => CharCode { code: 0, nbytes: 0 },
            })
            .collect()
    }

    fn char_width(&self, code: u32) -> Decimal {
        self.widths.get(&code).copied().unwrap_or(self.default_width) / Decimal::ONE_THOUSAND
    }

    fn to_unichr(&self, code: u32) -> Option<String> {
        self.tounicode.get(&code).cloned()
    }
}

/// Type 3 font: glyphs are content-stream procedures.
#[derive(Debug, Clone)]
pub struct Type3Font {
    name: String,
    font_matrix: Matrix,
    first_char: u32,
    widths: Vec<Decimal>,
    /// Code to glyph name, from /Encoding /Differences
    encoding: FxHashMap<u32, String>,
    char_procs: FxHashMap<String, PDFStream>,
    resources: Option<PDFDict>,
    tounicode: FxHashMap<u32, String>,
}

impl Type3Font {
    pub fn from_dict(
        name: &str,
        spec: &PDFDict,
        tounicode: FxHashMap<u32, String>,
        resolver: Option<&dyn ObjectResolver>,
    ) -> Result<Self> {
        let font_matrix = match spec.get("FontMatrix") {
            Some(obj) => match number_list(obj, resolver)?[..] {
                [a, b, c, d, e, f] => (a, b, c, d, e, f),
                _ => return Err(PdfError::InvalidValue("FontMatrix needs 6 numbers".into())),
            },
            None => FONT_MATRIX_DEFAULT,
        };
        let first_char = match spec.get("FirstChar") {
            Some(obj) => to_code(resolve_object(obj, resolver).as_number()?)?,
            None => 0,
        };
        let widths = match spec.get("Widths") {
            Some(obj) => number_list(obj, resolver)?,
            None => Vec::new(),
        };

        let mut encoding = FxHashMap::default();
        let enc = spec.get("Encoding").map(|e| resolve_object(e, resolver));
        let diffs = match enc {
            Some(PDFObject::Dict(enc)) => enc.get("Differences").map(|d| resolve_object(d, resolver)),
            _ => None,
        };
        if let Some(PDFObject::Array(diffs)) = diffs {
            let mut code = 0u32;
            for item in diffs {
                match item {
                    PDFObject::Number(n) => code = to_code(n)?,
                    PDFObject::Name(glyph) => {
                        encoding.insert(code, glyph);
                        code = code.saturating_add(1);
                    }
                    _ => {}
                }
            }
        }

        let mut char_procs = FxHashMap::default();
        if let Some(PDFObject::Dict(procs)) =
            spec.get("CharProcs").map(|p| resolve_object(p, resolver))
        {
            for (glyph, proc_obj) in procs {
                if let PDFObject::Stream(stream) = resolve_object(&proc_obj, resolver) {
                    char_procs.insert(glyph, *stream);
                }
            }
        }

        let resources = spec
            .get("Resources")
            .map(|r| resolve_object(r, resolver))
            .and_then(|r| r.as_dict().ok().cloned());

        Ok(Self {
            name: name.to_string(),
            font_matrix,
            first_char,
            widths,
            encoding,
            char_procs,
            resources,
            tounicode,
        })
    }
}

impl PDFFont for Type3Font {
    fn subtype(&self) -> &str {
        "Type3"
    }

    fn fontname(&self) -> Option<&str> {
        Some(&self.name)
    }

    /// Widths are in glyph space; FontMatrix maps them to text space.
    fn char_width(&self, code: u32) -> Decimal {
        let w = code
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(Decimal::ZERO);
        mul(w, self.font_matrix.0).unwrap_or(Decimal::ZERO)
    }

    fn to_unichr(&self, code: u32) -> Option<String> {
        if let Some(s) = self.tounicode.get(&code) {
            return Some(s.clone());
        }
        let glyph = self.encoding.get(&code)?;
        let mut chars = glyph.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c.to_string()),
            _ => None,
        }
    }

    fn font_matrix(&self) -> Matrix {
        self.font_matrix
    }

    fn char_proc(&self, code: u32) -> Option<&PDFStream> {
        let glyph = self.encoding.get(&code)?;
        self.char_procs.get(glyph)
    }

    fn resources(&self) -> Option<&PDFDict> {
        self.resources.as_ref()
    }
}

fn code_from_bytes(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Decode UTF-16BE bytes to a String.
fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parse the `bfchar`/`bfrange` sections of a ToUnicode CMap.
///
/// Everything else in the CMap is ignored. Malformed entries are skipped.
pub fn parse_tounicode(data: &[u8]) -> FxHashMap<u32, String> {
    let mut map = FxHashMap::default();
    let mut lexer = ContentLexer::new(data);
    let mut operands: Vec<PSToken> = Vec::new();
    let mut array: Option<Vec<PSToken>> = None;

    while let Some(token) = lexer.next_token() {
        let Ok((_, token)) = token else {
            continue;
        };
        match token {
            PSToken::Keyword(Keyword::ArrayStart) => array = Some(Vec::new()),
            PSToken::Keyword(Keyword::ArrayEnd) => {
                if let Some(items) = array.take() {
                    operands.push(PSToken::Literal(String::new()));
                    operands.extend(items);
                    operands.push(PSToken::Literal(String::new()));
                }
            }
            PSToken::Keyword(Keyword::Operator(op)) => {
                match op.as_str() {
                    "endbfchar" => bfchar(&operands, &mut map),
                    "endbfrange" => bfrange(&operands, &mut map),
                    _ => {}
                }
                operands.clear();
            }
            other => match array.as_mut() {
                Some(items) => items.push(other),
                None => operands.push(other),
            },
        }
    }
    map
}

fn bfchar(operands: &[PSToken], map: &mut FxHashMap<u32, String>) {
    for pair in operands.chunks_exact(2) {
        if let [PSToken::String(src), PSToken::String(dst)] = pair {
            map.insert(code_from_bytes(src.as_bytes()), decode_utf16be(dst.as_bytes()));
        }
    }
}

/// Arrays arrive bracketed by empty literals.
fn bfrange(operands: &[PSToken], map: &mut FxHashMap<u32, String>) {
    let mut i = 0;
    while i + 2 < operands.len() {
        let (PSToken::String(lo), PSToken::String(hi)) = (&operands[i], &operands[i + 1]) else {
            i += 1;
            continue;
        };
        let (lo, hi) = (code_from_bytes(lo.as_bytes()), code_from_bytes(hi.as_bytes()));
        let usable = hi >= lo && hi - lo <= MAX_BFRANGE_SPAN;
        match &operands[i + 2] {
            PSToken::String(_) if !usable => i += 3,
            PSToken::String(dst) => {
                let base = dst.as_bytes().to_vec();
                for (offset, code) in (lo..=hi).enumerate() {
                    let mut bytes = base.clone();
                    if let Some(last) = bytes.last_mut() {
                        *last = last.wrapping_add(offset as u8);
                    }
                    map.insert(code, decode_utf16be(&bytes));
                }
                i += 3;
            }
            PSToken::Literal(marker) if marker.is_empty() => {
                let mut j = i + 3;
                let mut code = usable.then_some(lo);
                while j < operands.len() {
                    match &operands[j] {
                        PSToken::String(dst) => {
                            if let Some(c) = code.filter(|c| *c <= hi) {
                                map.insert(c, decode_utf16be(dst.as_bytes()));
                                code = c.checked_add(1);
                            }
                        }
                        PSToken::Literal(m) if m.is_empty() => break,
                        _ => {}
                    }
                    j += 1;
                }
                i = j + 1;
            }
            _ => i += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dict(entries: Vec<(&str, PDFObject)>) -> PDFDict {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn nums(values: &[i64]) -> PDFObject {
        PDFObject::Array(values.iter().map(|&v| PDFObject::from(v)).collect())
    }

    #[test]
    fn test_simple_font_widths() {
        let spec = dict(vec![
            ("Subtype", PDFObject::name("Type1")),
            ("BaseFont", PDFObject::name("Helvetica")),
            ("FirstChar", PDFObject::from(65i64)),
            ("Widths", nums(&[600, 700])),
        ]);
        let font = DefaultFontLoader.load("F1", &spec, None).unwrap();
        assert_eq!(font.subtype(), "Type1");
        assert_eq!(font.fontname(), Some("Helvetica"));
        assert_eq!(font.char_width(65), dec!(0.6));
        assert_eq!(font.char_width(66), dec!(0.7));
        assert_eq!(font.char_width(67), Decimal::ZERO);
        assert_eq!(font.to_unichr(65).as_deref(), Some("A"));
    }

    #[test]
    fn test_cid_widths_both_forms() {
        let seq = vec![
            PDFObject::from(1i64),
            nums(&[500, 600]),
            PDFObject::from(10i64),
            PDFObject::from(12i64),
            PDFObject::from(250i64),
        ];
        let widths = parse_cid_widths(&seq, None);
        assert_eq!(widths.get(&1), Some(&dec!(500)));
        assert_eq!(widths.get(&2), Some(&dec!(600)));
        assert_eq!(widths.get(&11), Some(&dec!(250)));
        assert_eq!(widths.len(), 5);
    }

    #[test]
    fn test_cid_widths_reject_oversized_ranges() {
        let seq = vec![
            PDFObject::from(0i64),
            PDFObject::from(4294967295i64),
            PDFObject::from(500i64),
            PDFObject::from(20i64),
            PDFObject::from(10i64),
            PDFObject::from(300i64),
            PDFObject::from(65535i64),
            nums(&[700, 800]),
        ];
        let widths = parse_cid_widths(&seq, None);
        assert_eq!(widths.len(), 1);
        assert_eq!(widths.get(&65535), Some(&dec!(700)));
    }

    #[test]
    fn test_composite_font_decodes_two_bytes() {
        let cid = dict(vec![("W", PDFObject::Array(vec![PDFObject::from(258i64), nums(&[250])]))]);
        let spec = dict(vec![
            ("Subtype", PDFObject::name("Type0")),
            ("DescendantFonts", PDFObject::Array(vec![PDFObject::Dict(cid)])),
        ]);
        let font = DefaultFontLoader.load("F2", &spec, None).unwrap();
        let codes = font.decode(&[0x01, 0x02, 0x00, 0x20]);
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].code, 258);
        assert!(!codes[1].is_word_space());
        assert_eq!(font.char_width(258), dec!(0.25));
        assert_eq!(font.char_width(1), Decimal::ONE);
    }

    #[test]
    fn test_tounicode_bfchar_and_bfrange() {
        let cmap = b"begincmap 2 beginbfchar <01> <0041> <02> <00420043> endbfchar \
            1 beginbfrange <10> <12> <0061> endbfrange \
            1 beginbfrange <20> <21> [<0058> <0059>] endbfrange endcmap";
        let map = parse_tounicode(cmap);
        assert_eq!(map.get(&1).map(String::as_str), Some("A"));
        assert_eq!(map.get(&2).map(String::as_str), Some("BC"));
        assert_eq!(map.get(&0x11).map(String::as_str), Some("b"));
        assert_eq!(map.get(&0x12).map(String::as_str), Some("c"));
        assert_eq!(map.get(&0x21).map(String::as_str), Some("Y"));
    }

    #[test]
    fn test_tounicode_bfrange_at_code_space_end() {
        let map = parse_tounicode(b"1 beginbfrange <FFFFFFFF> <FFFFFFFF> [<0041> <0042>] endbfrange");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&0xFFFF_FFFF).map(String::as_str), Some("A"));
    }

    #[test]
    fn test_tounicode_oversized_bfrange_skipped() {
        let cmap = b"2 beginbfrange <00000000> <FFFFFFFF> <0000> <0030> <002F> <0041> endbfrange \
            1 beginbfchar <05> <0045> endbfchar";
        let map = parse_tounicode(cmap);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&5).map(String::as_str), Some("E"));
    }

    #[test]
    fn test_type3_font() {
        let proc_stream = PDFStream::new(PDFDict::new(), b"1000 0 d0 0 0 m 10 10 l S".to_vec());
        let spec = dict(vec![
            ("Subtype", PDFObject::name("Type3")),
            (
                "FontMatrix",
                PDFObject::Array(vec![
                    PDFObject::Number(dec!(0.01)),
                    PDFObject::from(0i64),
                    PDFObject::from(0i64),
                    PDFObject::Number(dec!(0.01)),
                    PDFObject::from(0i64),
                    PDFObject::from(0i64),
                ]),
            ),
            ("FirstChar", PDFObject::from(97i64)),
            ("Widths", nums(&[50])),
            (
                "Encoding",
                PDFObject::Dict(dict(vec![(
                    "Differences",
                    PDFObject::Array(vec![PDFObject::from(97i64), PDFObject::name("a")]),
                )])),
            ),
            (
                "CharProcs",
                PDFObject::Dict(dict(vec![("a", PDFObject::from(proc_stream))])),
            ),
        ]);
        let font = DefaultFontLoader.load("T3", &spec, None).unwrap();
        assert_eq!(font.char_width(97), dec!(0.5));
        assert!(font.char_proc(97).is_some());
        assert!(font.char_proc(98).is_none());
        assert_eq!(font.to_unichr(97).as_deref(), Some("a"));
    }
}
