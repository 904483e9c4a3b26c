//! Content stream parsing.
//!
//! - `lexer`: byte-level tokenizer over one or more stream segments
//! - `content`: operand assembly and inline image extraction

pub mod content;
pub mod lexer;

// Re-export main types for convenience
pub use content::{ContentToken, PDFContentParser};
pub use lexer::{ContentLexer, Keyword, PSToken};
