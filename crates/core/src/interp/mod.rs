//! PDF content stream interpretation.
//!
//! This module contains:
//! - `interpreter`: the stream processor (run loop, dispatch, nested streams)
//! - `registry`: operator table with declared arities
//! - `operands`: operand stack and typed operand access
//! - `device`: render events, the listener trait and bundled listeners
//! - `resources`: resource scopes and indirect-object resolution
//! - `font`: the font capability used by the text operators
//! - `config`: run configuration and cancellation
//! - `ops`: operator implementations by category

pub mod config;
pub mod device;
pub mod font;
pub mod interpreter;
pub mod operands;
pub mod ops;
pub mod registry;
pub mod resources;

// Re-export main types for convenience
pub use config::{CancelToken, ProcessorConfig};
pub use device::{
    EventKind, EventPayload, EventRecorder, GlyphInfo, ImageInfo, PDFEventListener, PathInfo,
    RenderEvent, TagExtractor,
};
pub use font::{CharCode, DefaultFontLoader, FontLoader, PDFFont};
pub use interpreter::{
    AbortReason, GlyphMetrics, PDFStreamProcessor, ProcessorStatus, RunOutcome, RunStatus,
};
pub use operands::Operands;
pub use registry::{Arity, OperatorRegistry, OperatorSpec, registry};
pub use resources::{ObjectResolver, ResourceChain, ResourceEntry};
