//! Content stream tokenizer.
//!
//! Scans raw bytes into literal tokens and operator mnemonics. A page's
//! content may arrive as several streams; they are read as one logical
//! sequence without being copied together. A segment boundary always ends
//! a name, number or mnemonic.

use std::str::FromStr;

use bytes::Bytes;
use rust_decimal::Decimal;
use smol_str::SmolStr;

use crate::error::{PdfError, Result};
use crate::model::objects::PDFString;

/// Structural markers and operator mnemonics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    ArrayStart, // [
    ArrayEnd,   // ]
    DictStart,  // <<
    DictEnd,    // >>
    BraceOpen,  // {
    BraceClose, // }
    /// Any other bare word, e.g. `Tj` or `BDC`
    Operator(SmolStr),
}

impl Keyword {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ArrayStart => "[",
            Self::ArrayEnd => "]",
            Self::DictStart => "<<",
            Self::DictEnd => ">>",
            Self::BraceOpen => "{",
            Self::BraceClose => "}",
            Self::Operator(name) => name,
        }
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self::Operator(SmolStr::new(String::from_utf8_lossy(bytes)))
    }
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum PSToken {
    Number(Decimal),
    Bool(bool),
    Null,
    String(PDFString),
    /// Name without the leading solidus, `#xx` escapes decoded
    Literal(String),
    Keyword(Keyword),
}

/// Cursor over a list of byte segments addressed as one sequence.
pub(crate) struct SegmentedCursor {
    segments: Vec<Bytes>,
    offsets: Vec<usize>,
    seg_index: usize,
    seg_pos: usize,
    total_len: usize,
}

impl SegmentedCursor {
    pub(crate) fn new(mut segments: Vec<Bytes>) -> Self {
        segments.retain(|seg| !seg.is_empty());
        let mut offsets = Vec::with_capacity(segments.len());
        let mut total_len = 0usize;
        for seg in &segments {
            offsets.push(total_len);
            total_len = total_len.saturating_add(seg.len());
        }
        Self {
            segments,
            offsets,
            seg_index: 0,
            seg_pos: 0,
            total_len,
        }
    }

    pub(crate) const fn total_len(&self) -> usize {
        self.total_len
    }

    pub(crate) fn at_end(&self) -> bool {
        self.tell() >= self.total_len
    }

    pub(crate) fn tell(&self) -> usize {
        if self.seg_index >= self.segments.len() {
            self.total_len
        } else {
            self.offsets[self.seg_index] + self.seg_pos
        }
    }

    fn normalize(&mut self) {
        while self.seg_index < self.segments.len()
            && self.seg_pos >= self.segments[self.seg_index].len()
        {
            self.seg_index += 1;
            self.seg_pos = 0;
        }
    }

    fn current_slice(&self) -> &[u8] {
        if self.seg_index >= self.segments.len() {
            &[]
        } else {
            &self.segments[self.seg_index][self.seg_pos..]
        }
    }

    fn peek(&self) -> Option<u8> {
        self.current_slice().first().copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        let mut idx = self.seg_index;
        let mut pos = self.seg_pos + offset;
        while idx < self.segments.len() {
            let seg = &self.segments[idx];
            if pos < seg.len() {
                return Some(seg[pos]);
            }
            pos = pos.saturating_sub(seg.len());
            idx += 1;
        }
        None
    }

    fn advance(&mut self, mut count: usize) {
        while count > 0 && self.seg_index < self.segments.len() {
            let seg_len = self.segments[self.seg_index].len();
            let remaining = seg_len.saturating_sub(self.seg_pos);
            if count < remaining {
                self.seg_pos += count;
                return;
            }
            count = count.saturating_sub(remaining);
            self.seg_index += 1;
            self.seg_pos = 0;
        }
    }

    fn advance_one(&mut self) -> Option<u8> {
        self.normalize();
        let b = self.peek()?;
        self.advance(1);
        Some(b)
    }

    fn match_bytes(&self, target: &[u8]) -> bool {
        target
            .iter()
            .enumerate()
            .all(|(i, &b)| self.peek_at(i) == Some(b))
    }

    /// Take the run of regular characters in the current segment.
    fn take_regular_run(&mut self) -> Bytes {
        self.normalize();
        if self.seg_index >= self.segments.len() {
            return Bytes::new();
        }
        let slice = self.current_slice();
        let n = slice
            .iter()
            .position(|&b| is_whitespace(b) || is_delimiter(b))
            .unwrap_or(slice.len());
        let start = self.seg_pos;
        let run = self.segments[self.seg_index].slice(start..start + n);
        self.advance(n);
        run
    }

    /// Copy `len` bytes starting at the cursor, or `None` if fewer remain.
    fn take_exact(&mut self, len: usize) -> Option<Bytes> {
        if self.tell().saturating_add(len) > self.total_len {
            return None;
        }
        self.normalize();
        let slice = self.current_slice();
        if slice.len() >= len {
            let start = self.seg_pos;
            let out = self.segments[self.seg_index].slice(start..start + len);
            self.advance(len);
            return Some(out);
        }
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.advance_one()?);
        }
        Some(Bytes::from(out))
    }
}

/// Tokenizer for content streams.
pub struct ContentLexer {
    cursor: SegmentedCursor,
}

impl ContentLexer {
    /// Tokenize a single stream.
    pub fn new(data: &[u8]) -> Self {
        Self::from_segments(vec![Bytes::copy_from_slice(data)])
    }

    /// Tokenize the concatenation of several streams without copying them.
    pub fn from_segments(segments: Vec<Bytes>) -> Self {
        Self {
            cursor: SegmentedCursor::new(segments),
        }
    }

    pub const fn total_len(&self) -> usize {
        self.cursor.total_len()
    }

    /// Byte offset of the next unread byte.
    pub fn tell(&self) -> usize {
        self.cursor.tell()
    }

    /// Read the next token with its starting offset.
    ///
    /// Returns `None` at end of data. `PdfError::UnexpectedEof` means the
    /// data ended inside a token; `PdfError::MalformedToken` means the token
    /// was skipped and scanning can continue.
    pub fn next_token(&mut self) -> Option<Result<(usize, PSToken)>> {
        self.skip_whitespace();
        if self.cursor.at_end() {
            return None;
        }

        let token_pos = self.cursor.tell();
        let b = self.cursor.peek()?;

        let result = match b {
            b'/' => self.parse_literal(),
            b'(' => self.parse_string(),
            b'<' => {
                if self.cursor.peek_at(1) == Some(b'<') {
                    self.cursor.advance(2);
                    Ok(PSToken::Keyword(Keyword::DictStart))
                } else {
                    self.parse_hex_string(token_pos)
                }
            }
            b'>' => {
                if self.cursor.peek_at(1) == Some(b'>') {
                    self.cursor.advance(2);
                    Ok(PSToken::Keyword(Keyword::DictEnd))
                } else {
                    self.cursor.advance(1);
                    Err(PdfError::MalformedToken {
                        pos: token_pos,
                        msg: "unexpected '>'".into(),
                    })
                }
            }
            b')' => {
                self.cursor.advance(1);
                Err(PdfError::MalformedToken {
                    pos: token_pos,
                    msg: "unbalanced ')'".into(),
                })
            }
            b'[' => {
                self.cursor.advance(1);
                Ok(PSToken::Keyword(Keyword::ArrayStart))
            }
            b']' => {
                self.cursor.advance(1);
                Ok(PSToken::Keyword(Keyword::ArrayEnd))
            }
            b'{' => {
                self.cursor.advance(1);
                Ok(PSToken::Keyword(Keyword::BraceOpen))
            }
            b'}' => {
                self.cursor.advance(1);
                Ok(PSToken::Keyword(Keyword::BraceClose))
            }
            b'+' | b'-' | b'.' => self.parse_number(token_pos),
            c if c.is_ascii_digit() => self.parse_number(token_pos),
            _ => self.parse_keyword(),
        };

        Some(result.map(|token| (token_pos, token)))
    }

    fn skip_whitespace(&mut self) {
        loop {
            self.cursor.normalize();
            let slice = self.cursor.current_slice();
            if slice.is_empty() {
                return;
            }
            enum Action {
                Advance(usize),
                Comment(usize),
                ConsumeAll(usize),
            }
            let action = {
                let mut idx = 0usize;
                loop {
                    if idx >= slice.len() {
                        break Action::ConsumeAll(slice.len());
                    }
                    let b = slice[idx];
                    if b == b'%' {
                        break Action::Comment(idx + 1);
                    }
                    if !is_whitespace(b) {
                        break Action::Advance(idx);
                    }
                    idx += 1;
                }
            };
            match action {
                Action::Advance(n) => {
                    self.cursor.advance(n);
                    return;
                }
                Action::Comment(n) => {
                    self.cursor.advance(n);
                    self.skip_comment();
                }
                Action::ConsumeAll(n) => {
                    self.cursor.advance(n);
                }
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(b) = self.cursor.peek_at(0) {
            if b == b'\n' || b == b'\r' {
                break;
            }
            self.cursor.advance(1);
        }
    }

    fn parse_literal(&mut self) -> Result<PSToken> {
        self.cursor.advance(1); // skip '/'
        let run = self.cursor.take_regular_run();
        let mut name = Vec::with_capacity(run.len());
        let mut i = 0;
        while i < run.len() {
            if run[i] == b'#'
                && let (Some(h1), Some(h2)) = (
                    run.get(i + 1).copied().and_then(hex_value),
                    run.get(i + 2).copied().and_then(hex_value),
                )
            {
                name.push((h1 << 4) | h2);
                i += 3;
                continue;
            }
            name.push(run[i]);
            i += 1;
        }

        let name = match String::from_utf8(name) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
        };
        Ok(PSToken::Literal(name))
    }

    fn parse_number(&mut self, start_pos: usize) -> Result<PSToken> {
        let run = self.cursor.take_regular_run();
        parse_decimal(&run).map(PSToken::Number).ok_or_else(|| {
            PdfError::MalformedToken {
                pos: start_pos,
                msg: format!("invalid number {:?}", String::from_utf8_lossy(&run)),
            }
        })
    }

    fn parse_string(&mut self) -> Result<PSToken> {
        self.cursor.advance(1); // skip '('
        let mut result = Vec::with_capacity(32);
        let mut depth = 1;

        while depth > 0 {
            match self.cursor.advance_one() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.cursor.advance_one() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'(') => result.push(b'('),
                    Some(b')') => result.push(b')'),
                    Some(b'\\') => result.push(b'\\'),
                    Some(b'\r') => {
                        if self.cursor.peek_at(0) == Some(b'\n') {
                            self.cursor.advance(1);
                        }
                    }
                    Some(b'\n') => {}
                    Some(c) if (b'0'..b'8').contains(&c) => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.cursor.peek_at(0) {
                                Some(d) if (b'0'..b'8').contains(&d) => {
                                    self.cursor.advance(1);
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(PSToken::String(PDFString::literal(result)))
    }

    fn parse_hex_string(&mut self, start_pos: usize) -> Result<PSToken> {
        self.cursor.advance(1); // skip '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.cursor.advance_one() {
                Some(b'>') => break,
                Some(c) if is_whitespace(c) => {}
                Some(c) => {
                    let Some(nibble) = hex_value(c) else {
                        self.skip_past(b'>');
                        return Err(PdfError::MalformedToken {
                            pos: start_pos,
                            msg: format!("invalid hex digit {:?}", c as char),
                        });
                    };
                    match pending.take() {
                        Some(high) => result.push((high << 4) | nibble),
                        None => pending = Some(nibble),
                    }
                }
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        // A final odd digit is followed by an implied 0.
        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(PSToken::String(PDFString::hex(result)))
    }

    fn skip_past(&mut self, terminator: u8) {
        while let Some(b) = self.cursor.advance_one() {
            if b == terminator {
                break;
            }
        }
    }

    fn parse_keyword(&mut self) -> Result<PSToken> {
        let run = self.cursor.take_regular_run();
        Ok(match run.as_ref() {
            b"true" => PSToken::Bool(true),
            b"false" => PSToken::Bool(false),
            b"null" => PSToken::Null,
            bytes => PSToken::Keyword(Keyword::from_bytes(bytes)),
        })
    }

    /// Read inline image data that follows the `ID` operator.
    ///
    /// One whitespace byte after `ID` is skipped. With a known `length`
    /// exactly that many bytes are taken. With an `eod` marker the data runs
    /// up to and including it. Otherwise the data ends before the first
    /// `EI` that is preceded by whitespace and followed by whitespace or end
    /// of data. The trailing `EI` is consumed in every case.
    pub fn read_inline_data(&mut self, length: Option<usize>, eod: Option<&[u8]>) -> Result<Bytes> {
        self.cursor.normalize();
        let skipped_ws = matches!(self.cursor.peek(), Some(b) if is_whitespace(b));
        if skipped_ws {
            self.cursor.advance(1);
        }

        if let Some(len) = length {
            let data = self.cursor.take_exact(len).ok_or(PdfError::UnexpectedEof)?;
            self.consume_ei();
            return Ok(data);
        }

        if let Some(marker) = eod {
            let mut data = Vec::new();
            loop {
                if self.cursor.match_bytes(marker) {
                    self.cursor.advance(marker.len());
                    data.extend_from_slice(marker);
                    self.consume_ei();
                    return Ok(Bytes::from(data));
                }
                data.push(self.cursor.advance_one().ok_or(PdfError::UnexpectedEof)?);
            }
        }

        let mut data = Vec::new();
        let mut prev_ws = skipped_ws;
        loop {
            if prev_ws && self.cursor.match_bytes(b"EI") {
                let after = self.cursor.peek_at(2);
                if after.is_none_or(is_whitespace) {
                    // The whitespace before EI is not image data.
                    if !data.is_empty() {
                        data.pop();
                    }
                    self.cursor.advance(2);
                    return Ok(Bytes::from(data));
                }
            }
            let b = self.cursor.advance_one().ok_or(PdfError::UnexpectedEof)?;
            prev_ws = is_whitespace(b);
            data.push(b);
        }
    }

    fn consume_ei(&mut self) {
        let save = (self.cursor.seg_index, self.cursor.seg_pos);
        self.skip_whitespace();
        if self.cursor.match_bytes(b"EI") {
            let after = self.cursor.peek_at(2);
            if after.is_none_or(|b| is_whitespace(b) || is_delimiter(b)) {
                self.cursor.advance(2);
                return;
            }
        }
        (self.cursor.seg_index, self.cursor.seg_pos) = save;
    }
}

/// Parse a PDF number: optional sign, digits, optional fraction.
fn parse_decimal(run: &[u8]) -> Option<Decimal> {
    let (negative, body) = match run.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, run),
    };
    let (int_part, frac_part) = match body.iter().position(|&b| b == b'.') {
        Some(i) => (&body[..i], &body[i + 1..]),
        None => (body, &[][..]),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.iter().chain(frac_part).all(u8::is_ascii_digit) {
        return None;
    }

    let mut text = String::with_capacity(run.len() + 2);
    if negative {
        text.push('-');
    }
    if int_part.is_empty() {
        text.push('0');
    } else {
        text.push_str(std::str::from_utf8(int_part).ok()?);
    }
    if !frac_part.is_empty() {
        text.push('.');
        text.push_str(std::str::from_utf8(frac_part).ok()?);
    }
    Decimal::from_str(&text).ok()
}

/// Check if byte is PDF whitespace.
pub(crate) const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

pub(crate) const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
