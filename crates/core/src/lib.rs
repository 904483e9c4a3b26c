//! vellum - PDF content stream interpreter.
//!
//! Tokenizes page content streams, dispatches every operator through a
//! static registry and maintains the full graphics state, notifying
//! listeners of each glyph, path, image, clip change and marked-content
//! boundary.

pub mod api;
pub mod error;
pub mod interp;
pub mod model;
pub mod parser;
pub mod utils;

pub use api::{PageInput, PageRecording, process_pages};
pub use error::{Diagnostic, DiagnosticKind, PdfError, Result};
pub use interp::{
    EventKind, EventRecorder, PDFEventListener, PDFStreamProcessor, ProcessorConfig, RenderEvent,
    RunOutcome, RunStatus,
};
pub use model::{PDFDict, PDFObject, PDFStream, PDFString, PDFGraphicState};
