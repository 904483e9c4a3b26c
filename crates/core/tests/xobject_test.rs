//! Form XObjects, images, inline images and shadings.

mod common;

use std::collections::HashMap;

use common::{pdf_dict, run, run_full, run_with};
use rust_decimal_macros::dec;
use vellum_core::error::{DiagnosticKind, PdfError};
use vellum_core::interp::{
    AbortReason, CancelToken, EventKind, EventPayload, PDFEventListener, PDFStreamProcessor,
    ProcessorConfig, RenderEvent, RunStatus,
};
use vellum_core::model::{PDFDict, PDFObjRef, PDFObject, PDFStream, PathSegment};

fn stream(attrs: &str, data: &[u8]) -> PDFStream {
    PDFStream::new(pdf_dict(attrs), data.to_vec())
}

fn xobjects(entries: Vec<(&str, PDFObject)>) -> PDFDict {
    let mut xobjs = PDFDict::new();
    for (name, obj) in entries {
        xobjs.insert(name.to_string(), obj);
    }
    let mut resources = PDFDict::new();
    resources.insert("XObject".into(), PDFObject::Dict(xobjs));
    resources
}

#[test]
fn test_form_runs_with_its_matrix_and_bbox() {
    let form = stream(
        "<< /Type /XObject /Subtype /Form /Matrix [1 0 0 1 100 0] /BBox [0 0 50 50] >>",
        b"2 0 0 2 0 0 cm 0 0 m 10 10 l S",
    );
    let resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    let result = run_with(b"/Fm0 Do 0 0 m 1 0 l S", &resources);
    assert!(result.outcome.diagnostics.is_empty(), "{:?}", result.outcome.diagnostics);
    assert_eq!(
        result.rec.kinds(),
        vec![
            EventKind::FormBegin,
            EventKind::Path,
            EventKind::FormEnd,
            EventKind::Path
        ]
    );

    match &result.rec.events[0].payload {
        EventPayload::Form { name, matrix, bbox } => {
            assert_eq!(name, "Fm0");
            assert_eq!(matrix.4, dec!(100));
            assert_eq!(*bbox, Some((dec!(0), dec!(0), dec!(50), dec!(50))));
        }
        other => panic!("expected a form payload, got {other:?}"),
    }

    let inner = &result.rec.events[1];
    assert_eq!(inner.depth, 1);
    match &inner.payload {
        EventPayload::Path(info) => assert_eq!(
            info.segments,
            vec![
                PathSegment::MoveTo((dec!(100), dec!(0))),
                PathSegment::LineTo((dec!(120), dec!(20))),
            ]
        ),
        other => panic!("expected a path, got {other:?}"),
    }
    assert_eq!(
        inner.state.clip.bounds(),
        Some((dec!(100), dec!(0), dec!(150), dec!(50)))
    );

    let outer = &result.rec.events[3];
    assert_eq!(outer.depth, 0);
    assert!(outer.state.clip.is_unbounded());
    assert_eq!(result.state.ctm, (dec!(1), dec!(0), dec!(0), dec!(1), dec!(0), dec!(0)));
}

#[test]
fn test_form_state_changes_do_not_leak() {
    let form = stream("<< /Subtype /Form >>", b"5 w 1 0 0 rg q 2 w");
    let resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    let result = run_with(b"/Fm0 Do", &resources);
    // the unbalanced q inside the form is discarded silently
    assert!(result.outcome.diagnostics.is_empty());
    assert_eq!(result.state.linewidth, dec!(1));
}

#[test]
fn test_form_cannot_pop_callers_state() {
    let form = stream("<< /Subtype /Form >>", b"Q");
    let resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    let result = run_with(b"q 3 w /Fm0 Do", &resources);
    assert_eq!(result.outcome.diagnostics.len(), 1);
    assert_eq!(result.outcome.diagnostics[0].kind(), DiagnosticKind::StackUnderflow);
    assert_eq!(result.outcome.diagnostics[0].depth, 1);
    assert_eq!(result.state.linewidth, dec!(3));
}

#[test]
fn test_form_own_resources_shadow_page() {
    let form = stream(
        "<< /Subtype /Form /Resources << /ExtGState << /GS0 << /LW 7 >> >> >> >>",
        b"/GS0 gs 0 0 m 1 1 l S",
    );
    let mut resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    resources.insert("ExtGState".into(), PDFObject::Dict(pdf_dict("<< /GS0 << /LW 2 >> >>")));
    let result = run_with(b"/Fm0 Do /GS0 gs", &resources);
    let path = result.rec.of_kind(EventKind::Path).next().expect("one path");
    assert_eq!(path.state.linewidth, dec!(7));
    assert_eq!(result.state.linewidth, dec!(2));
}

#[test]
fn test_self_referencing_form_by_reference() {
    let r = PDFObjRef::new(5, 0);
    let mut form = stream("<< /Subtype /Form >>", b"0 0 m 1 1 l S /Fm0 Do");
    form.attrs.insert(
        "Resources".into(),
        PDFObject::Dict(xobjects(vec![("Fm0", PDFObject::Ref(r))])),
    );
    let mut objects = HashMap::new();
    objects.insert(r, PDFObject::from(form));

    let resources = xobjects(vec![("Fm0", PDFObject::Ref(r))]);
    let result = run_full(b"/Fm0 Do", &resources, ProcessorConfig::default(), Some(&objects));
    assert_eq!(result.rec.of_kind(EventKind::FormBegin).count(), 1);
    assert_eq!(result.outcome.diagnostics.len(), 1);
    let diag = &result.outcome.diagnostics[0];
    assert_eq!(diag.kind(), DiagnosticKind::UnboundedRecursion);
    assert_eq!(diag.operator.as_deref(), Some("Do"));
    assert_eq!(diag.depth, 1);
    assert!(result.outcome.is_finished());
}

#[test]
fn test_direct_self_include_hits_depth_limit() {
    let form = stream("<< /Subtype /Form >>", b"/Fm0 Do");
    let resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    let result = run_with(b"/Fm0 Do", &resources);
    assert_eq!(result.rec.of_kind(EventKind::FormBegin).count(), 32);
    assert_eq!(result.rec.of_kind(EventKind::FormEnd).count(), 32);
    assert_eq!(result.outcome.diagnostics.len(), 1);
    assert_eq!(result.outcome.diagnostics[0].depth, 32);
    assert_eq!(
        result.outcome.diagnostics[0].kind(),
        DiagnosticKind::UnboundedRecursion
    );
}

#[test]
fn test_nesting_limit_is_configurable() {
    let form = stream("<< /Subtype /Form >>", b"/Fm0 Do");
    let resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    let config = ProcessorConfig::default().with_max_nesting_depth(3);
    let result = run_full(b"/Fm0 Do", &resources, config, None);
    assert_eq!(result.rec.of_kind(EventKind::FormBegin).count(), 3);
    assert_eq!(result.outcome.diagnostics[0].depth, 3);
}

#[test]
fn test_image_xobject() {
    let image = stream(
        "<< /Subtype /Image /Width 2 /Height 1 /ColorSpace /DeviceGray /BitsPerComponent 8 >>",
        b"\x00\xff",
    );
    let resources = xobjects(vec![("Im1", PDFObject::from(image))]);
    let result = run_with(b"q 20 0 0 10 5 5 cm /Im1 Do Q", &resources);
    assert_eq!(result.rec.kinds(), vec![EventKind::Image]);
    let event = &result.rec.events[0];
    assert_eq!(event.state.ctm.0, dec!(20));
    match &event.payload {
        EventPayload::Image(info) => {
            assert_eq!(info.name, "Im1");
            assert!(!info.inline);
            assert_eq!(info.stream.get_data(), b"\x00\xff");
        }
        other => panic!("expected an image, got {other:?}"),
    }
}

#[test]
fn test_missing_and_wrong_xobjects() {
    let resources = xobjects(vec![("X", PDFObject::from(3i64))]);
    let result = run_with(b"/Nope Do /X Do", &resources);
    let kinds: Vec<_> = result.outcome.diagnostics.iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::MissingResource, DiagnosticKind::TypeMismatch]
    );
}

#[test]
fn test_inline_images_are_numbered() {
    let result = run(b"BI /W 1 /H 1 /CS /G /BPC 8 ID x EI BI /W 1 /H 1 ID y EI");
    assert!(result.outcome.diagnostics.is_empty(), "{:?}", result.outcome.diagnostics);
    let images: Vec<_> = result
        .rec
        .events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::Image(info) => Some(info.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].name, "inline0");
    assert_eq!(images[1].name, "inline1");
    assert!(images[0].inline);
    assert_eq!(images[0].stream.get("Width"), Some(&PDFObject::from(1i64)));
    assert_eq!(
        images[0].stream.get("ColorSpace"),
        Some(&PDFObject::name("DeviceGray"))
    );
    assert_eq!(images[0].stream.get_data(), b"x");
}

#[test]
fn test_shading() {
    let resources = pdf_dict("<< /Shading << /Sh0 << /ShadingType 2 /ColorSpace /DeviceRGB >> >> >>");
    let result = run_with(b"/Sh0 sh /Sh1 sh", &resources);
    assert_eq!(result.rec.kinds(), vec![EventKind::Shading]);
    match &result.rec.events[0].payload {
        EventPayload::Shading { name, shading } => {
            assert_eq!(name, "Sh0");
            assert!(matches!(shading, PDFObject::Dict(_)));
        }
        other => panic!("expected a shading, got {other:?}"),
    }
    assert_eq!(result.outcome.diagnostics[0].kind(), DiagnosticKind::MissingResource);
}

#[test]
fn test_truncated_form_ends_only_the_form() {
    let form = stream("<< /Subtype /Form >>", b"5 w (unterminated");
    let resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    let result = run_with(b"2 w /Fm0 Do 7 Ts", &resources);

    assert!(result.outcome.is_finished());
    let diags = &result.outcome.diagnostics;
    assert_eq!(diags.len(), 1, "{diags:?}");
    assert_eq!(diags[0].depth, 1);
    assert_eq!(diags[0].error, PdfError::UnexpectedEof);
    assert_eq!(diags[0].kind(), DiagnosticKind::MalformedToken);

    assert_eq!(result.state.linewidth, dec!(2));
    assert_eq!(result.state.text.rise, dec!(7));
    assert_eq!(
        result.rec.kinds(),
        vec![EventKind::FormBegin, EventKind::FormEnd]
    );
}

struct CancelOnPath {
    token: CancelToken,
    paths: usize,
}

impl PDFEventListener for CancelOnPath {
    fn event(&mut self, event: &RenderEvent) {
        if event.kind == EventKind::Path {
            self.paths += 1;
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancellation_inside_form_unwinds() {
    let form = stream(
        "<< /Subtype /Form >>",
        b"q q 4 w 0 0 m 1 1 l S 0 0 m 2 2 l S Q Q",
    );
    let resources = xobjects(vec![("Fm0", PDFObject::from(form))]);
    let token = CancelToken::new();
    let mut canceller = CancelOnPath {
        token: token.clone(),
        paths: 0,
    };
    let (outcome, depth, state) = {
        let mut p = PDFStreamProcessor::new(ProcessorConfig::default(), Vec::new())
            .with_listener(&mut canceller)
            .with_cancel_token(token);
        let outcome = p
            .process(b"q 3 w /Fm0 Do Q 0 0 m 5 5 l S", &resources)
            .expect("fresh processor");
        (outcome, p.gstack_depth(), p.graphics_state().clone())
    };
    assert_eq!(outcome.status, RunStatus::Aborted(AbortReason::Cancelled));
    assert_eq!(canceller.paths, 1);
    assert_eq!(depth, 0);
    assert_eq!(state.linewidth, dec!(3));
}

#[test]
fn test_inline_image_after_stray_operands_is_dropped() {
    let result = run(b"1 BI /W 1 /H 1 ID x EI BI /W 1 /H 1 ID y EI");
    let diags = &result.outcome.diagnostics;
    assert_eq!(diags.len(), 1, "{diags:?}");
    assert_eq!(diags[0].kind(), DiagnosticKind::ArityMismatch);
    assert_eq!(diags[0].operator.as_deref(), Some("BI"));

    let images: Vec<_> = result
        .rec
        .events
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::Image(info) => Some(info.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].stream.get_data(), b"y");
}
