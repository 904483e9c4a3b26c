//! Stream processor configuration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::utils::{MATRIX_IDENTITY, Matrix};

/// Parameters for a stream processor run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Deepest allowed chain of nested Form XObject / Type 3 glyph
    /// invocations. Exceeding it aborts only the offending nested run.
    pub max_nesting_depth: usize,

    /// Hard limit on dispatched operators for the whole run, nested streams
    /// included. Exceeding it aborts the run.
    pub max_operators: Option<usize>,

    /// Whether Type 3 glyph procedures are executed as nested streams.
    pub execute_type3_glyphs: bool,

    /// Transformation the run starts from (page rotation, user unit, ...).
    pub initial_ctm: Matrix,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: 32,
            max_operators: None,
            execute_type3_glyphs: true,
            initial_ctm: MATRIX_IDENTITY,
        }
    }
}

impl ProcessorConfig {
    pub const fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub const fn with_max_operators(mut self, limit: Option<usize>) -> Self {
        self.max_operators = limit;
        self
    }

    pub const fn with_type3_glyphs(mut self, execute: bool) -> Self {
        self.execute_type3_glyphs = execute;
        self
    }

    pub const fn with_initial_ctm(mut self, ctm: Matrix) -> Self {
        self.initial_ctm = ctm;
        self
    }
}

/// Advisory cancellation flag shared between a host and a running processor.
///
/// The processor polls it once per dispatch iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ProcessorConfig::default()
            .with_max_nesting_depth(4)
            .with_max_operators(Some(100))
            .with_type3_glyphs(false);
        assert_eq!(config.max_nesting_depth, 4);
        assert_eq!(config.max_operators, Some(100));
        assert!(!config.execute_type3_glyphs);
        assert_eq!(config.initial_ctm, MATRIX_IDENTITY);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
