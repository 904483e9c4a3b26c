//! Content stream parser.
//!
//! Assembles lexer tokens into operands (arrays, dictionaries and
//! procedures are built here) and operator mnemonics, and cuts inline
//! images (`BI ... ID ... EI`) out of the byte stream so their payload is
//! never tokenized.

use std::collections::VecDeque;

use bytes::Bytes;
use num_traits::ToPrimitive;
use smol_str::SmolStr;

use super::lexer::{ContentLexer, Keyword, PSToken};
use crate::error::{PdfError, Result};
use crate::model::color::INLINE_COLORSPACE_ABBREV;
use crate::model::objects::{PDFDict, PDFObject, PDFStream};

/// Token types produced by PDFContentParser.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentToken {
    /// An operand (number, string, name, array, dict, ...)
    Operand(PDFObject),
    /// An operator mnemonic (BT, ET, Tj, ...)
    Keyword(SmolStr),
    /// A complete inline image: expanded dictionary plus raw payload
    InlineImage(PDFStream),
}

/// Context frame for tracking array/dict/proc construction
#[derive(Debug)]
enum Context {
    Array(usize, Vec<PDFObject>),
    Dict(usize, Vec<PDFObject>),
    Proc(usize, Vec<PDFObject>),
}

/// Parser for PDF content streams.
///
/// Every item carries the byte offset of the token that produced it. An
/// `Err(PdfError::MalformedToken)` item is recoverable; an
/// `Err(PdfError::UnexpectedEof)` item means the data is truncated and is
/// always the last item.
pub struct PDFContentParser {
    lexer: ContentLexer,
    /// Context stack for nested arrays/dicts/procs
    context_stack: Vec<Context>,
    /// Operands collected between `BI` and `ID`
    inline_operands: Vec<PDFObject>,
    /// Offset of the pending `BI`, if any
    inline_start: Option<usize>,
    /// Items produced ahead of time
    pending: VecDeque<(usize, Result<ContentToken>)>,
    finished: bool,
}

impl PDFContentParser {
    /// Create a new content parser from one or more content streams.
    pub fn new(segments: Vec<Bytes>) -> Self {
        Self {
            lexer: ContentLexer::from_segments(segments),
            context_stack: Vec::new(),
            inline_operands: Vec::new(),
            inline_start: None,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(vec![Bytes::copy_from_slice(data)])
    }

    /// Get next token with its position.
    pub fn next_with_pos(&mut self) -> Option<(usize, Result<ContentToken>)> {
        if let Some(item) = self.pending.pop_front() {
            return Some(item);
        }
        if self.finished {
            return None;
        }
        loop {
            let (pos, token) = match self.lexer.next_token() {
                Some(Ok(t)) => t,
                Some(Err(PdfError::UnexpectedEof)) => {
                    self.finished = true;
                    return Some((self.lexer.total_len(), Err(PdfError::UnexpectedEof)));
                }
                Some(Err(e)) => {
                    let pos = match &e {
                        PdfError::MalformedToken { pos, .. } => *pos,
                        _ => self.lexer.tell(),
                    };
                    return Some((pos, Err(e)));
                }
                None => return self.finish(),
            };

            let value = match token {
                PSToken::Number(n) => PDFObject::Number(n),
                PSToken::Bool(b) => PDFObject::Bool(b),
                PSToken::Null => PDFObject::Null,
                PSToken::String(s) => PDFObject::String(s),
                PSToken::Literal(name) => PDFObject::Name(name),
                PSToken::Keyword(kw) => match self.handle_keyword(pos, kw) {
                    Some(item) => return Some(item),
                    None => continue,
                },
            };

            if let Some(value) = self.place(value) {
                return Some((pos, Ok(ContentToken::Operand(value))));
            }
        }
    }

    /// Route an operand into the innermost open container. Returns the
    /// value back when it belongs on the operand stack.
    fn place(&mut self, value: PDFObject) -> Option<PDFObject> {
        if let Some(ctx) = self.context_stack.last_mut() {
            match ctx {
                Context::Array(_, items) | Context::Dict(_, items) | Context::Proc(_, items) => {
                    items.push(value)
                }
            }
            return None;
        }
        if self.inline_start.is_some() {
            self.inline_operands.push(value);
            return None;
        }
        Some(value)
    }

    fn handle_keyword(&mut self, pos: usize, kw: Keyword) -> Option<(usize, Result<ContentToken>)> {
        match kw {
            Keyword::ArrayStart => {
                self.context_stack.push(Context::Array(pos, Vec::new()));
                None
            }
            Keyword::DictStart => {
                self.context_stack.push(Context::Dict(pos, Vec::new()));
                None
            }
            Keyword::BraceOpen => {
                self.context_stack.push(Context::Proc(pos, Vec::new()));
                None
            }
            Keyword::ArrayEnd | Keyword::DictEnd | Keyword::BraceClose => self.close(pos, &kw),
            Keyword::Operator(name) => {
                if let Some(Context::Proc(_, items)) = self.context_stack.last_mut() {
                    // Calculator functions keep their operators as names.
                    items.push(PDFObject::Name(name.to_string()));
                    return None;
                }
                if !self.context_stack.is_empty() {
                    return Some((
                        pos,
                        Err(PdfError::MalformedToken {
                            pos,
                            msg: format!("operator {name} inside a container"),
                        }),
                    ));
                }
                match name.as_str() {
                    "BI" if self.inline_start.is_none() => {
                        self.inline_start = Some(pos);
                        self.inline_operands.clear();
                        None
                    }
                    "ID" if self.inline_start.is_some() => Some(self.read_inline_image()),
                    _ if self.inline_start.is_some() => Some((
                        pos,
                        Err(PdfError::MalformedToken {
                            pos,
                            msg: format!("operator {name} inside an inline image dictionary"),
                        }),
                    )),
                    _ => Some((pos, Ok(ContentToken::Keyword(name)))),
                }
            }
        }
    }

    fn close(&mut self, pos: usize, kw: &Keyword) -> Option<(usize, Result<ContentToken>)> {
        let matches = matches!(
            (self.context_stack.last(), kw),
            (Some(Context::Array(..)), Keyword::ArrayEnd)
                | (Some(Context::Dict(..)), Keyword::DictEnd)
                | (Some(Context::Proc(..)), Keyword::BraceClose)
        );
        if !matches {
            return Some((
                pos,
                Err(PdfError::MalformedToken {
                    pos,
                    msg: format!("unbalanced '{}'", kw.as_str()),
                }),
            ));
        }

        let (start, value, dropped) = match self.context_stack.pop()? {
            Context::Array(start, items) | Context::Proc(start, items) => {
                (start, PDFObject::Array(items), 0)
            }
            Context::Dict(start, items) => {
                let (dict, dropped) = build_dict(items);
                (start, PDFObject::Dict(dict), dropped)
            }
        };
        let placed = self
            .place(value)
            .map(|value| (start, Ok(ContentToken::Operand(value))));
        if dropped > 0 {
            // Report the bad entries, then keep what could be built.
            self.pending.extend(placed);
            return Some((
                start,
                Err(PdfError::MalformedToken {
                    pos: start,
                    msg: "dictionary key is not a name".into(),
                }),
            ));
        }
        placed
    }

    fn read_inline_image(&mut self) -> (usize, Result<ContentToken>) {
        let start = self.inline_start.take().unwrap_or_default();
        let (attrs, _) = build_dict(std::mem::take(&mut self.inline_operands));
        let attrs = expand_inline_dict(attrs);

        let length = attrs
            .get("Length")
            .and_then(|obj| obj.as_number().ok())
            .and_then(|n| n.to_usize());
        let eod: Option<&[u8]> = match inline_filter(&attrs).as_deref() {
            Some("ASCII85Decode") => Some(b"~>"),
            Some("ASCIIHexDecode") => Some(b">"),
            _ => None,
        };

        match self.lexer.read_inline_data(length, eod) {
            Ok(data) => (start, Ok(ContentToken::InlineImage(PDFStream::new(attrs, data)))),
            Err(e) => {
                self.finished = true;
                (start, Err(e))
            }
        }
    }

    fn finish(&mut self) -> Option<(usize, Result<ContentToken>)> {
        self.finished = true;
        let open = self
            .context_stack
            .first()
            .map(|ctx| match ctx {
                Context::Array(p, _) | Context::Dict(p, _) | Context::Proc(p, _) => *p,
            })
            .or(self.inline_start);
        open.map(|pos| (pos, Err(PdfError::UnexpectedEof)))
    }
}

impl Iterator for PDFContentParser {
    type Item = (usize, Result<ContentToken>);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_pos()
    }
}

/// Build a dictionary from alternating key/value items. Returns the number
/// of pairs dropped because the key was not a name.
fn build_dict(items: Vec<PDFObject>) -> (PDFDict, usize) {
    let mut dict = PDFDict::new();
    let mut dropped = 0;
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        let value = iter.next();
        match (key, value) {
            (PDFObject::Name(name), Some(value)) => {
                dict.insert(name, value);
            }
            _ => dropped += 1,
        }
    }
    (dict, dropped)
}

/// Expand abbreviated inline image keys and values to their full names.
pub fn expand_inline_dict(attrs: PDFDict) -> PDFDict {
    attrs
        .into_iter()
        .map(|(key, value)| {
            let key = match key.as_str() {
                "BPC" => "BitsPerComponent",
                "CS" => "ColorSpace",
                "D" => "Decode",
                "DP" => "DecodeParms",
                "F" => "Filter",
                "H" => "Height",
                "IM" => "ImageMask",
                "I" => "Interpolate",
                "L" => "Length",
                "W" => "Width",
                other => other,
            }
            .to_string();
            let value = match (key.as_str(), value) {
                ("ColorSpace", PDFObject::Name(cs)) => PDFObject::Name(
                    INLINE_COLORSPACE_ABBREV
                        .get(cs.as_str())
                        .map_or(cs, |full| (*full).to_string()),
                ),
                ("Filter", PDFObject::Name(f)) => PDFObject::Name(expand_filter(&f)),
                ("Filter", PDFObject::Array(fs)) => PDFObject::Array(
                    fs.into_iter()
                        .map(|f| match f {
                            PDFObject::Name(name) => PDFObject::Name(expand_filter(&name)),
                            other => other,
                        })
                        .collect(),
                ),
                (_, value) => value,
            };
            (key, value)
        })
        .collect()
}

fn expand_filter(name: &str) -> String {
    match name {
        "AHx" => "ASCIIHexDecode",
        "A85" => "ASCII85Decode",
        "LZW" => "LZWDecode",
        "Fl" => "FlateDecode",
        "RL" => "RunLengthDecode",
        "CCF" => "CCITTFaxDecode",
        "DCT" => "DCTDecode",
        other => other,
    }
    .to_string()
}

/// First filter of an (expanded) inline image dictionary.
fn inline_filter(attrs: &PDFDict) -> Option<String> {
    match attrs.get("Filter")? {
        PDFObject::Name(name) => Some(name.clone()),
        PDFObject::Array(filters) => filters.first()?.as_name().ok().map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn collect(data: &[u8]) -> Vec<Result<ContentToken>> {
        PDFContentParser::from_slice(data).map(|(_, t)| t).collect()
    }

    #[test]
    fn test_simple_parse() {
        let tokens = collect(b"BT ET");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_nested_array_and_dict() {
        let tokens = collect(b"/P <</MCID 3 /K [1 [2]]>> BDC");
        let Ok(ContentToken::Operand(PDFObject::Dict(d))) = &tokens[1] else {
            panic!("expected dict, got {:?}", tokens[1]);
        };
        assert_eq!(d.get("MCID"), Some(&PDFObject::Number(dec!(3))));
        assert_eq!(
            d.get("K"),
            Some(&PDFObject::Array(vec![
                PDFObject::Number(dec!(1)),
                PDFObject::Array(vec![PDFObject::Number(dec!(2))]),
            ]))
        );
        assert_eq!(tokens[2], Ok(ContentToken::Keyword("BDC".into())));
    }

    #[test]
    fn test_inline_image_expands_keys() {
        let tokens = collect(b"BI /W 2 /H 1 /CS /G /BPC 8 ID \x00\xff EI Q");
        let Ok(ContentToken::InlineImage(stream)) = &tokens[0] else {
            panic!("expected inline image, got {:?}", tokens[0]);
        };
        assert_eq!(stream.get("Width"), Some(&PDFObject::Number(dec!(2))));
        assert_eq!(
            stream.get("ColorSpace"),
            Some(&PDFObject::name("DeviceGray"))
        );
        assert_eq!(stream.get_data(), b"\x00\xff");
        assert_eq!(tokens[1], Ok(ContentToken::Keyword("Q".into())));
    }

    #[test]
    fn test_stray_array_end_is_recoverable() {
        let tokens = collect(b"] q");
        assert!(matches!(tokens[0], Err(PdfError::MalformedToken { .. })));
        assert_eq!(tokens[1], Ok(ContentToken::Keyword("q".into())));
    }

    #[test]
    fn test_unterminated_array_is_truncation() {
        let tokens = collect(b"[1 2");
        assert_eq!(tokens, vec![Err(PdfError::UnexpectedEof)]);
    }
}
