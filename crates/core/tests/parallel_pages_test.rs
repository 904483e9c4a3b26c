//! Independent pages processed on the rayon pool.

mod common;

use common::pdf_dict;
use serde::Serialize;
use vellum_core::interp::{EventKind, EventPayload, ProcessorConfig};
use vellum_core::{PageInput, PageRecording, process_pages};

/// Compact, comparable summary of one page run.
#[derive(Debug, Serialize, PartialEq)]
struct PageRow {
    events: usize,
    paths: usize,
    diagnostics: Vec<String>,
    finished: bool,
    last_x: Option<String>,
}

fn row(rec: &PageRecording) -> PageRow {
    let last_x = rec.events.iter().rev().find_map(|e| match &e.payload {
        EventPayload::Path(info) => info.bbox.map(|b| b.2.normalize().to_string()),
        _ => None,
    });
    PageRow {
        events: rec.events.len(),
        paths: rec.events.iter().filter(|e| e.kind == EventKind::Path).count(),
        diagnostics: rec.diagnostics.iter().map(|d| d.kind().to_string()).collect(),
        finished: rec.outcome.is_finished(),
        last_x,
    }
}

fn page_content(i: usize) -> String {
    let mut s = String::from("q ");
    for j in 0..=i % 5 {
        s.push_str(&format!("0 0 m {} {} l S ", i + j, j));
    }
    if i % 7 == 0 {
        s.push_str("Q Q ");
    } else {
        s.push_str("Q ");
    }
    s
}

#[test]
fn test_pages_come_back_in_order() {
    let resources = pdf_dict("<< >>");
    let pages: Vec<PageInput> = (0..64)
        .map(|i| PageInput::new(page_content(i).into_bytes(), resources.clone()))
        .collect();
    let results = process_pages(&pages, &ProcessorConfig::default(), None);
    assert_eq!(results.len(), pages.len());

    for (i, result) in results.iter().enumerate() {
        let rec = result.as_ref().expect("processor ready");
        let expected = PageRow {
            events: i % 5 + 1,
            paths: i % 5 + 1,
            diagnostics: if i % 7 == 0 {
                vec!["stack-underflow".to_string()]
            } else {
                Vec::new()
            },
            finished: true,
            last_x: Some((i + i % 5).to_string()),
        };
        assert_eq!(row(rec), expected, "page {i}");
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let resources = pdf_dict("<< >>");
    let pages: Vec<PageInput> = (0..16)
        .map(|i| PageInput::new(page_content(i).into_bytes(), resources.clone()))
        .collect();
    let config = ProcessorConfig::default();

    let parallel: Vec<PageRow> = process_pages(&pages, &config, None)
        .iter()
        .map(|r| row(r.as_ref().expect("processor ready")))
        .collect();
    let sequential: Vec<PageRow> = pages
        .iter()
        .map(|page| row(&vellum_core::api::record(page, &config, None).expect("processor ready")))
        .collect();

    assert_eq!(
        serde_json::to_string(&parallel).expect("serializable rows"),
        serde_json::to_string(&sequential).expect("serializable rows")
    );
}
