//! Operand and resource values.
//!
//! `PDFObject` is the closed set of values that can appear as operator
//! operands or inside resource dictionaries. Numbers are exact decimals so
//! that repeated transforms do not accumulate binary rounding error.

use std::fmt;

use bytes::Bytes;
use indexmap::IndexMap;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{PdfError, Result};

/// Dictionary type: keys are always names (stored without the solidus).
pub type PDFDict = IndexMap<String, PDFObject>;

/// Lexical form a string was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringEncoding {
    /// `( ... )` with backslash escapes
    Literal,
    /// `< ... >` hexadecimal digits
    Hex,
}

/// A byte string together with the lexical form it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PDFString {
    pub bytes: Vec<u8>,
    pub encoding: StringEncoding,
}

impl PDFString {
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding: StringEncoding::Literal,
        }
    }

    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding: StringEncoding::Hex,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Serialize back to content-stream syntax.
    ///
    /// Literal strings escape only `(`, `)` and `\`, so a token such as
    /// `(a\(b)` reproduces its source bytes exactly.
    pub fn to_pdf_syntax(&self) -> Vec<u8> {
        match self.encoding {
            StringEncoding::Literal => {
                let mut out = Vec::with_capacity(self.bytes.len() + 2);
                out.push(b'(');
                for &b in &self.bytes {
                    if matches!(b, b'(' | b')' | b'\\') {
                        out.push(b'\\');
                    }
                    out.push(b);
                }
                out.push(b')');
                out
            }
            StringEncoding::Hex => {
                let mut out = Vec::with_capacity(self.bytes.len() * 2 + 2);
                out.push(b'<');
                for &b in &self.bytes {
                    out.extend_from_slice(format!("{b:02X}").as_bytes());
                }
                out.push(b'>');
                out
            }
        }
    }
}

/// PDF indirect object reference. Resolution belongs to the document layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// Stream - dictionary attributes + opaque (already decoded) payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: PDFDict,
    data: Bytes,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: PDFDict, data: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            data: data.into(),
        }
    }

    /// Payload bytes.
    pub fn get_data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Payload as shared bytes (no copy).
    pub fn data_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Check if stream contains a key.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }
}

/// Operand value - the fundamental value type of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Exact decimal number (integers and reals share this variant)
    Number(Decimal),
    /// Byte string
    String(PDFString),
    /// Name object (e.g., /Type, /Font), stored without the solidus
    Name(String),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(PDFDict),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn number(value: impl Into<Decimal>) -> Self {
        Self::Number(value.into())
    }

    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as boolean
    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(self.type_error("bool")),
        }
    }

    /// Get as exact number
    pub const fn as_number(&self) -> Result<Decimal> {
        match self {
            Self::Number(n) => Ok(*n),
            _ => Err(self.type_error("number")),
        }
    }

    /// Get as integer; fractional numbers are rejected.
    pub fn as_int(&self) -> Result<i64> {
        let n = self.as_number()?;
        if !n.fract().is_zero() {
            return Err(PdfError::TypeError {
                expected: "integer",
                got: "real",
            });
        }
        n.to_i64().ok_or(PdfError::NumericOverflow)
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(self.type_error("name")),
        }
    }

    /// Get as string value
    pub const fn as_string(&self) -> Result<&PDFString> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(self.type_error("string")),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(self.type_error("array")),
        }
    }

    /// Get as dictionary; a stream answers with its attribute dictionary.
    pub fn as_dict(&self) -> Result<&PDFDict> {
        match self {
            Self::Dict(d) => Ok(d),
            Self::Stream(s) => Ok(&s.attrs),
            _ => Err(self.type_error("dict")),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(self.type_error("stream")),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(self.type_error("ref")),
        }
    }

    /// Array of numbers, e.g. a matrix or bounding box.
    pub fn as_number_array(&self) -> Result<Vec<Decimal>> {
        self.as_array()?.iter().map(Self::as_number).collect()
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Name(_) => "name",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }

    const fn type_error(&self, expected: &'static str) -> PdfError {
        PdfError::TypeError {
            expected,
            got: self.type_name(),
        }
    }
}

impl From<Decimal> for PDFObject {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PDFObject {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<bool> for PDFObject {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<PDFDict> for PDFObject {
    fn from(value: PDFDict) -> Self {
        Self::Dict(value)
    }
}

impl From<PDFStream> for PDFObject {
    fn from(value: PDFStream) -> Self {
        Self::Stream(Box::new(value))
    }
}

impl fmt::Display for PDFObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", n.normalize()),
            Self::String(s) => f.write_str(&String::from_utf8_lossy(&s.to_pdf_syntax())),
            Self::Name(n) => write!(f, "/{n}"),
            Self::Array(arr) => {
                f.write_str("[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Dict(d) => {
                f.write_str("<<")?;
                for (k, v) in d {
                    write!(f, " /{k} {v}")?;
                }
                f.write_str(" >>")
            }
            Self::Stream(s) => write!(f, "stream({} bytes)", s.get_data().len()),
            Self::Ref(r) => write!(f, "{} {} R", r.objid, r.genno),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_literal_string_escapes_parentheses() {
        let s = PDFString::literal(b"a(b)c\\".to_vec());
        assert_eq!(s.to_pdf_syntax(), b"(a\\(b\\)c\\\\)".to_vec());
    }

    #[test]
    fn test_hex_string_syntax() {
        let s = PDFString::hex(vec![0x48, 0x0f]);
        assert_eq!(s.to_pdf_syntax(), b"<480F>".to_vec());
    }

    #[test]
    fn test_as_int_rejects_fraction() {
        assert_eq!(PDFObject::Number(dec!(3)).as_int(), Ok(3));
        assert!(PDFObject::Number(dec!(3.5)).as_int().is_err());
    }

    #[test]
    fn test_type_error_names_variant() {
        let err = PDFObject::name("F1").as_number().unwrap_err();
        assert_eq!(
            err,
            PdfError::TypeError {
                expected: "number",
                got: "name"
            }
        );
    }

    #[test]
    fn test_dict_equality_ignores_order() {
        let mut a = PDFDict::new();
        a.insert("A".into(), PDFObject::from(1i64));
        a.insert("B".into(), PDFObject::from(2i64));
        let mut b = PDFDict::new();
        b.insert("B".into(), PDFObject::from(2i64));
        b.insert("A".into(), PDFObject::from(1i64));
        assert_eq!(PDFObject::Dict(a), PDFObject::Dict(b));
    }

    #[test]
    fn test_display() {
        let obj = PDFObject::Array(vec![
            PDFObject::Number(dec!(1.50)),
            PDFObject::name("X"),
            PDFObject::Null,
        ]);
        assert_eq!(obj.to_string(), "[1.5 /X null]");
    }
}
