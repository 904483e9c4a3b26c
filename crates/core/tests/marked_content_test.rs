//! Marked content sections, property lists and the tag extractor.

mod common;

use common::{pdf_dict, run, run_with};
use vellum_core::error::DiagnosticKind;
use vellum_core::interp::{EventKind, EventPayload, PDFStreamProcessor, ProcessorConfig, TagExtractor};
use vellum_core::model::{PDFDict, PDFObject, PDFStream};

fn marked(event: &vellum_core::interp::RenderEvent) -> (&str, Option<&PDFDict>) {
    match &event.payload {
        EventPayload::MarkedContent { tag, props } => (tag.as_str(), props.as_ref()),
        other => panic!("expected marked content, got {other:?}"),
    }
}

#[test]
fn test_bdc_with_inline_properties() {
    let result = run(b"/Span << /ActualText (fi) >> BDC EMC");
    assert!(result.outcome.diagnostics.is_empty());
    assert_eq!(
        result.rec.kinds(),
        vec![EventKind::MarkedContentBegin, EventKind::MarkedContentEnd]
    );
    let (tag, props) = marked(&result.rec.events[0]);
    assert_eq!(tag, "Span");
    assert!(props.is_some_and(|p| p.contains_key("ActualText")));
    let (tag, _) = marked(&result.rec.events[1]);
    assert_eq!(tag, "Span");
}

#[test]
fn test_bdc_with_named_properties() {
    let resources = pdf_dict("<< /Properties << /MC0 << /MCID 3 >> >> >>");
    let result = run_with(b"/P /MC0 BDC EMC", &resources);
    assert!(result.outcome.diagnostics.is_empty());
    let (_, props) = marked(&result.rec.events[0]);
    assert_eq!(props.and_then(|p| p.get("MCID")), Some(&PDFObject::from(3i64)));
}

#[test]
fn test_bdc_with_missing_properties_still_opens() {
    let result = run(b"/P /MC9 BDC EMC");
    assert_eq!(result.outcome.diagnostics.len(), 1);
    assert_eq!(result.outcome.diagnostics[0].kind(), DiagnosticKind::MissingResource);
    assert_eq!(
        result.rec.kinds(),
        vec![EventKind::MarkedContentBegin, EventKind::MarkedContentEnd]
    );
}

#[test]
fn test_marked_content_points() {
    let result = run(b"/Artifact MP /Tag << /K 1 >> DP");
    assert_eq!(
        result.rec.kinds(),
        vec![EventKind::MarkedContentPoint, EventKind::MarkedContentPoint]
    );
    assert!(marked(&result.rec.events[0]).1.is_none());
    assert!(marked(&result.rec.events[1]).1.is_some());
}

#[test]
fn test_unclosed_section_is_closed_at_end() {
    let result = run(b"/P BMC /Span BMC EMC");
    assert_eq!(result.outcome.diagnostics.len(), 1);
    assert_eq!(
        result.outcome.diagnostics[0].kind(),
        DiagnosticKind::MarkedContentMismatch
    );
    assert_eq!(
        result.rec.kinds(),
        vec![
            EventKind::MarkedContentBegin,
            EventKind::MarkedContentBegin,
            EventKind::MarkedContentEnd,
            EventKind::MarkedContentEnd,
        ]
    );
    assert_eq!(marked(&result.rec.events[3]).0, "P");
}

#[test]
fn test_lone_emc() {
    let result = run(b"EMC");
    assert_eq!(result.outcome.diagnostics.len(), 1);
    assert_eq!(
        result.outcome.diagnostics[0].kind(),
        DiagnosticKind::MarkedContentMismatch
    );
    assert!(result.rec.events.is_empty());
}

#[test]
fn test_form_cannot_close_callers_section() {
    let form = PDFStream::new(pdf_dict("<< /Subtype /Form >>"), b"EMC".to_vec());
    let mut xobjs = PDFDict::new();
    xobjs.insert("Fm0".into(), PDFObject::from(form));
    let mut resources = PDFDict::new();
    resources.insert("XObject".into(), PDFObject::Dict(xobjs));

    let result = run_with(b"/P BMC /Fm0 Do EMC", &resources);
    assert_eq!(result.outcome.diagnostics.len(), 1);
    assert_eq!(result.outcome.diagnostics[0].depth, 1);
    assert_eq!(
        result.rec.kinds(),
        vec![
            EventKind::MarkedContentBegin,
            EventKind::FormBegin,
            EventKind::FormEnd,
            EventKind::MarkedContentEnd,
        ]
    );
}

#[test]
fn test_tag_extractor_output() {
    let resources = pdf_dict(
        "<< /Font << /F1 << /Subtype /Type1 /FirstChar 32 /Widths [250] >> >> >>",
    );
    let content = b"/P << /MCID 0 >> BDC BT /F1 10 Tf (Hi) Tj ET EMC \
        /Artifact BMC /Span << /Lang (en) >> BDC BT (&) Tj ET EMC EMC /Note BMC";
    let mut out = Vec::new();
    {
        let mut extractor = TagExtractor::new(&mut out);
        let mut p = PDFStreamProcessor::new(ProcessorConfig::default(), Vec::new())
            .with_listener(&mut extractor);
        let outcome = p.process(content, &resources).expect("fresh processor");
        assert_eq!(outcome.diagnostics.len(), 1);
    }
    let text = String::from_utf8(out).expect("utf-8 output");
    insta::assert_snapshot!(
        text.trim_end(),
        @r#"<page id="0"><P MCID="0">Hi</P><Artifact><Span Lang="(en)">&amp;</Span></Artifact><Note></Note></page>"#
    );
}
