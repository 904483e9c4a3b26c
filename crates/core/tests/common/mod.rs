//! Shared helpers for the integration tests.
#![allow(dead_code)]

use vellum_core::interp::{
    EventRecorder, ObjectResolver, PDFStreamProcessor, ProcessorConfig, RunOutcome,
};
use vellum_core::model::{PDFDict, PDFGraphicState, PDFObject};
use vellum_core::parser::{ContentToken, PDFContentParser};

/// Parse a dictionary written in PDF syntax.
pub fn pdf_dict(src: &str) -> PDFDict {
    match PDFContentParser::from_slice(src.as_bytes()).next() {
        Some((_, Ok(ContentToken::Operand(PDFObject::Dict(d))))) => d,
        other => panic!("not a dictionary: {other:?}"),
    }
}

pub struct Run {
    pub rec: EventRecorder,
    pub outcome: RunOutcome,
    pub state: PDFGraphicState,
}

pub fn run_full(
    content: &[u8],
    resources: &PDFDict,
    config: ProcessorConfig,
    resolver: Option<&dyn ObjectResolver>,
) -> Run {
    let mut rec = EventRecorder::new();
    let (outcome, state) = {
        let mut p = PDFStreamProcessor::new(config, Vec::new()).with_listener(&mut rec);
        if let Some(resolver) = resolver {
            p = p.with_resolver(resolver);
        }
        let outcome = p.process(content, resources).expect("processor ready");
        (outcome, p.graphics_state().clone())
    };
    Run {
        rec,
        outcome,
        state,
    }
}

pub fn run_with(content: &[u8], resources: &PDFDict) -> Run {
    run_full(content, resources, ProcessorConfig::default(), None)
}

pub fn run(content: &[u8]) -> Run {
    run_with(content, &PDFDict::new())
}
