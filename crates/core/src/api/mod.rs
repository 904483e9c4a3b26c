//! Host helpers for running whole pages.
//!
//! Pages are independent: each gets its own [`PDFStreamProcessor`], state
//! stack and listener, so [`process_pages`] runs them on the rayon pool
//! and returns the recordings in page order.
//!
//! # Example
//!
//! ```ignore
//! use vellum_core::api::{PageInput, process_pages};
//! use vellum_core::interp::ProcessorConfig;
//!
//! let pages = vec![PageInput::new(content, resources)];
//! for page in process_pages(&pages, &ProcessorConfig::default(), None).into_iter().flatten() {
//!     println!("{} events", page.events.len());
//! }
//! ```

use bytes::Bytes;
use rayon::prelude::*;

use crate::error::{Diagnostic, Result};
use crate::interp::config::ProcessorConfig;
use crate::interp::device::{EventRecorder, RenderEvent};
use crate::interp::interpreter::{PDFStreamProcessor, RunOutcome};
use crate::interp::resources::ObjectResolver;
use crate::model::objects::PDFDict;

/// Decoded content of one page together with its resources.
#[derive(Debug, Clone, Default)]
pub struct PageInput {
    /// Content stream segments, read as one stream
    pub contents: Vec<Bytes>,
    pub resources: PDFDict,
}

impl PageInput {
    pub fn new(content: impl Into<Bytes>, resources: PDFDict) -> Self {
        Self {
            contents: vec![content.into()],
            resources,
        }
    }

    pub const fn from_segments(contents: Vec<Bytes>, resources: PDFDict) -> Self {
        Self {
            contents,
            resources,
        }
    }
}

/// Everything one page run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecording {
    pub events: Vec<RenderEvent>,
    /// Diagnostics as seen by the listener (same order as `outcome`)
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: RunOutcome,
}

/// Run one page and record its events.
pub fn record(
    page: &PageInput,
    config: &ProcessorConfig,
    resolver: Option<&dyn ObjectResolver>,
) -> Result<PageRecording> {
    let mut recorder = EventRecorder::new();
    let outcome = {
        let mut processor =
            PDFStreamProcessor::new(config.clone(), Vec::new()).with_listener(&mut recorder);
        if let Some(resolver) = resolver {
            processor = processor.with_resolver(resolver);
        }
        processor.process_streams(page.contents.clone(), &page.resources)?
    };
    Ok(PageRecording {
        events: recorder.events,
        diagnostics: recorder.diagnostics,
        outcome,
    })
}

/// Run independent pages concurrently, one processor per page.
///
/// Results are in input order.
pub fn process_pages(
    pages: &[PageInput],
    config: &ProcessorConfig,
    resolver: Option<&dyn ObjectResolver>,
) -> Vec<Result<PageRecording>> {
    pages
        .par_iter()
        .map(|page| record(page, config, resolver))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::device::EventKind;

    #[test]
    fn test_record_single_page() {
        let page = PageInput::new(&b"0 0 m 10 0 l S"[..], PDFDict::new());
        let rec = record(&page, &ProcessorConfig::default(), None).unwrap();
        assert!(rec.outcome.is_finished());
        assert_eq!(rec.events.len(), 1);
        assert_eq!(rec.events[0].kind, EventKind::Path);
    }

    #[test]
    fn test_segments_are_one_stream() {
        let page = PageInput::from_segments(
            vec![Bytes::from_static(b"0 0 m 10 "), Bytes::from_static(b"0 l S")],
            PDFDict::new(),
        );
        let rec = record(&page, &ProcessorConfig::default(), None).unwrap();
        assert!(rec.diagnostics.is_empty());
        assert_eq!(rec.events.len(), 1);
    }
}
