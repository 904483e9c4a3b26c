//! PDF model types - operand values, state, paths and color definitions.
//!
//! - `objects` - operand value types (PDFObject, PDFString, PDFStream, PDFObjRef)
//! - `state` - graphics and text state (PDFGraphicState, PDFTextState)
//! - `color` - color spaces and color values (PDFColorSpace, Color)
//! - `path` - path segments and clipping (PathSegment, ClipPath)

pub mod color;
pub mod objects;
pub mod path;
pub mod state;

// Re-export main types for convenience
pub use color::{Color, PDFColorSpace};
pub use objects::{PDFDict, PDFObjRef, PDFObject, PDFStream, PDFString, StringEncoding};
pub use path::{ClipPath, FillRule, PathSegment};
pub use state::{DashPattern, FontRef, PDFGraphicState, PDFTextState};
