//! Render events and the listener interface.
//!
//! A listener receives one [`RenderEvent`] per drawing-relevant operator,
//! in stream order, plus every diagnostic the processor records. Bundled
//! listeners: [`EventRecorder`] collects everything in memory and
//! [`TagExtractor`] writes the marked-content structure with the shown
//! text as XML-like tags.

use std::io::{self, Write};

use rust_decimal::Decimal;

use super::interpreter::RunOutcome;
use crate::error::Diagnostic;
use crate::model::objects::{PDFDict, PDFObject, PDFStream};
use crate::model::path::{FillRule, PathSegment};
use crate::model::state::PDFGraphicState;
use crate::utils::{Matrix, Rect, enc};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Glyph,
    Path,
    Image,
    Shading,
    ClipChange,
    MarkedContentBegin,
    MarkedContentEnd,
    MarkedContentPoint,
    FormBegin,
    FormEnd,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Glyph => "glyph",
            Self::Path => "path",
            Self::Image => "image",
            Self::Shading => "shading",
            Self::ClipChange => "clip",
            Self::MarkedContentBegin => "mc-begin",
            Self::MarkedContentEnd => "mc-end",
            Self::MarkedContentPoint => "mc-point",
            Self::FormBegin => "form-begin",
            Self::FormEnd => "form-end",
        }
    }
}

/// One shown glyph with its resolved placement.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphInfo {
    /// Character code as read from the string
    pub code: u32,
    /// Unicode text of the glyph, when the font can map it
    pub unicode: Option<String>,
    /// Resource name of the font
    pub font: String,
    pub fontsize: Decimal,
    /// Text rendering matrix: glyph space origin in device space
    pub trm: Matrix,
    /// Horizontal displacement applied to the text matrix, in text space
    pub advance: Decimal,
}

/// A painted path, already in device space.
#[derive(Debug, Clone, PartialEq)]
pub struct PathInfo {
    pub segments: Vec<PathSegment>,
    pub stroke: bool,
    pub fill: Option<FillRule>,
    pub bbox: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// XObject resource name, or a generated `inlineN` name
    pub name: String,
    pub inline: bool,
    pub stream: PDFStream,
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Glyph(GlyphInfo),
    Path(PathInfo),
    Image(ImageInfo),
    Shading {
        name: String,
        shading: PDFObject,
    },
    Clip {
        rule: FillRule,
        bounds: Option<Rect>,
        empty: bool,
    },
    MarkedContent {
        tag: String,
        props: Option<PDFDict>,
    },
    Form {
        name: String,
        matrix: Matrix,
        bbox: Option<Rect>,
    },
}

/// A drawing or state-change notification.
///
/// `state` is a point-in-time copy of the graphics state taken when the
/// event was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEvent {
    pub kind: EventKind,
    /// Nesting depth of the emitting stream (0 = top level)
    pub depth: usize,
    pub state: PDFGraphicState,
    pub payload: EventPayload,
}

/// Observer of a processor run.
///
/// Listeners are invoked synchronously, in registration order.
pub trait PDFEventListener {
    fn event(&mut self, event: &RenderEvent);

    fn diagnostic(&mut self, _diagnostic: &Diagnostic) {}

    fn run_started(&mut self) {}

    fn run_finished(&mut self, _outcome: &RunOutcome) {}
}

/// Collects every event and diagnostic of a run.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    pub events: Vec<RenderEvent>,
    pub diagnostics: Vec<Diagnostic>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &RenderEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &GlyphInfo> {
        self.events.iter().filter_map(|e| match &e.payload {
            EventPayload::Glyph(g) => Some(g),
            _ => None,
        })
    }

    /// Concatenated unicode text of every glyph.
    pub fn text(&self) -> String {
        self.glyphs().filter_map(|g| g.unicode.as_deref()).collect()
    }
}

impl PDFEventListener for EventRecorder {
    fn event(&mut self, event: &RenderEvent) {
        self.events.push(event.clone());
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Writes marked-content tags and shown text to an output stream.
///
/// Each run is wrapped in a `<page id="N">` element; the page number
/// advances after every run.
pub struct TagExtractor<'a, W: Write> {
    outfp: &'a mut W,
    pageno: u32,
    /// Tags still open
    stack: Vec<String>,
    error: Option<io::Error>,
}

impl<'a, W: Write> TagExtractor<'a, W> {
    pub const fn new(outfp: &'a mut W) -> Self {
        Self {
            outfp,
            pageno: 0,
            stack: Vec::new(),
            error: None,
        }
    }

    pub const fn pageno(&self) -> u32 {
        self.pageno
    }

    /// First write error, if any. Output stops after it.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn write(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.outfp.write_all(s.as_bytes()) {
            self.error = Some(e);
        }
    }

    fn tag(tag: &str, props: Option<&PDFDict>) -> String {
        let mut s = String::new();
        if let Some(props) = props {
            let mut sorted_keys: Vec<_> = props.keys().collect();
            sorted_keys.sort();
            for k in sorted_keys {
                if let Some(v) = props.get(k) {
                    s.push_str(&format!(" {}=\"{}\"", enc(k), enc(&v.to_string())));
                }
            }
        }
        format!("<{}{}>", enc(tag), s)
    }
}

impl<W: Write> PDFEventListener for TagExtractor<'_, W> {
    fn event(&mut self, event: &RenderEvent) {
        match (&event.kind, &event.payload) {
            (EventKind::MarkedContentBegin, EventPayload::MarkedContent { tag, props }) => {
                let out = Self::tag(tag, props.as_ref());
                self.write(&out);
                self.stack.push(tag.clone());
            }
            (EventKind::MarkedContentEnd, _) => {
                if let Some(tag) = self.stack.pop() {
                    let out = format!("</{}>", enc(&tag));
                    self.write(&out);
                }
            }
            (EventKind::MarkedContentPoint, EventPayload::MarkedContent { tag, props }) => {
                let out = Self::tag(tag, props.as_ref());
                self.write(&out);
            }
            (EventKind::Glyph, EventPayload::Glyph(glyph)) => {
                if let Some(text) = &glyph.unicode {
                    let out = enc(text).into_owned();
                    self.write(&out);
                }
            }
            _ => {}
        }
    }

    fn run_started(&mut self) {
        let out = format!("<page id=\"{}\">", self.pageno);
        self.write(&out);
    }

    fn run_finished(&mut self, _outcome: &RunOutcome) {
        while let Some(tag) = self.stack.pop() {
            let out = format!("</{}>", enc(&tag));
            self.write(&out);
        }
        self.write("</page>\n");
        self.pageno += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::PDFDict;

    fn marked(kind: EventKind, tag: &str, props: Option<PDFDict>) -> RenderEvent {
        RenderEvent {
            kind,
            depth: 0,
            state: PDFGraphicState::new(),
            payload: EventPayload::MarkedContent {
                tag: tag.to_string(),
                props,
            },
        }
    }

    #[test]
    fn test_tag_extractor_writes_sorted_props() {
        let mut out = Vec::new();
        {
            let mut ex = TagExtractor::new(&mut out);
            let mut props = PDFDict::new();
            props.insert("MCID".into(), PDFObject::from(3i64));
            props.insert("Lang".into(), PDFObject::name("en"));
            ex.run_started();
            ex.event(&marked(EventKind::MarkedContentBegin, "P", Some(props)));
            ex.event(&marked(EventKind::MarkedContentEnd, "P", None));
            ex.event(&marked(EventKind::MarkedContentPoint, "Art", None));
            assert!(ex.take_error().is_none());
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<page id=\"0\"><P Lang=\"/en\" MCID=\"3\"></P><Art>"
        );
    }

    #[test]
    fn test_recorder_filters() {
        let mut rec = EventRecorder::new();
        rec.event(&marked(EventKind::MarkedContentBegin, "P", None));
        rec.event(&marked(EventKind::MarkedContentEnd, "P", None));
        assert_eq!(
            rec.kinds(),
            vec![EventKind::MarkedContentBegin, EventKind::MarkedContentEnd]
        );
        assert_eq!(rec.of_kind(EventKind::MarkedContentEnd).count(), 1);
        assert_eq!(rec.text(), "");
    }
}
