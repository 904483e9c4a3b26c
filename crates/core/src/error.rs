//! Error types for the vellum content-stream interpreter.
//!
//! `PdfError` covers both hard failures returned from the public API and the
//! per-operator problems that the stream processor turns into [`Diagnostic`]s.

use std::fmt;

use smol_str::SmolStr;
use thiserror::Error;

use crate::interp::registry::Arity;

/// Primary error type for content-stream interpretation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdfError {
    #[error("malformed token at position {pos}: {msg}")]
    MalformedToken { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("operator {operator} expects {expected} operands, got {got}")]
    ArityMismatch {
        operator: SmolStr,
        expected: Arity,
        got: usize,
    },

    #[error("operator {operator}: operand {index} should be {expected}, got {got}")]
    TypeMismatch {
        operator: SmolStr,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("unknown operator: {0}")]
    UnknownOperator(SmolStr),

    #[error("restore without a matching save")]
    StackUnderflow,

    #[error("nesting depth {depth} exceeds limit {limit}")]
    RecursionLimit { depth: usize, limit: usize },

    #[error("{category} resource not found: {name}")]
    MissingResource {
        category: &'static str,
        name: String,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("numeric overflow")]
    NumericOverflow,

    #[error("marked content mismatch: {0}")]
    MarkedContentMismatch(String),

    #[error("processor is not ready (state: {0})")]
    ProcessorNotReady(&'static str),
}

impl PdfError {
    /// Attach operator context to an accessor-level type error.
    pub(crate) fn for_operand(self, operator: &str, index: usize) -> Self {
        match self {
            Self::TypeError { expected, got } => Self::TypeMismatch {
                operator: SmolStr::new(operator),
                index,
                expected,
                got,
            },
            other => other,
        }
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Coarse classification of a diagnostic, mirroring the recovery taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MalformedToken,
    ArityMismatch,
    TypeMismatch,
    UnknownOperator,
    StackUnderflow,
    UnboundedRecursion,
    MissingResource,
    InvalidValue,
    NumericOverflow,
    MarkedContentMismatch,
}

impl DiagnosticKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedToken => "malformed-token",
            Self::ArityMismatch => "arity-mismatch",
            Self::TypeMismatch => "type-mismatch",
            Self::UnknownOperator => "unknown-operator",
            Self::StackUnderflow => "stack-underflow",
            Self::UnboundedRecursion => "unbounded-recursion",
            Self::MissingResource => "missing-resource",
            Self::InvalidValue => "invalid-value",
            Self::NumericOverflow => "numeric-overflow",
            Self::MarkedContentMismatch => "marked-content-mismatch",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem observed during a run.
///
/// `pos` is the byte offset of the offending token inside the stream that
/// was executing at nesting `depth` (0 = the top-level content stream).
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub pos: usize,
    pub depth: usize,
    pub operator: Option<SmolStr>,
    pub error: PdfError,
}

impl Diagnostic {
    pub fn new(pos: usize, depth: usize, operator: Option<&str>, error: PdfError) -> Self {
        Self {
            pos,
            depth,
            operator: operator.map(SmolStr::new),
            error,
        }
    }

    pub const fn kind(&self) -> DiagnosticKind {
        match &self.error {
            PdfError::MalformedToken { .. } | PdfError::UnexpectedEof => {
                DiagnosticKind::MalformedToken
            }
            PdfError::ArityMismatch { .. } => DiagnosticKind::ArityMismatch,
            PdfError::TypeMismatch { .. } | PdfError::TypeError { .. } => {
                DiagnosticKind::TypeMismatch
            }
            PdfError::UnknownOperator(_) => DiagnosticKind::UnknownOperator,
            PdfError::StackUnderflow => DiagnosticKind::StackUnderflow,
            PdfError::RecursionLimit { .. } => DiagnosticKind::UnboundedRecursion,
            PdfError::MissingResource { .. } => DiagnosticKind::MissingResource,
            PdfError::InvalidValue(_) | PdfError::ProcessorNotReady(_) => {
                DiagnosticKind::InvalidValue
            }
            PdfError::NumericOverflow => DiagnosticKind::NumericOverflow,
            PdfError::MarkedContentMismatch(_) => DiagnosticKind::MarkedContentMismatch,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] @{}", self.kind(), self.pos)?;
        if self.depth > 0 {
            write!(f, " (depth {})", self.depth)?;
        }
        write!(f, ": {}", self.error)
    }
}
