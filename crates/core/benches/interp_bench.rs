//! Benchmarks for content stream interpretation.
//!
//! Benchmark groups:
//! - `lexer_tokenize`: Raw tokenization throughput at various scales
//! - `content_parse`: Tokens assembled into operands, containers and inline images
//! - `processor_dispatch`: Full runs, operators dispatched against the graphics state

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use vellum_core::interp::{EventRecorder, PDFStreamProcessor, ProcessorConfig};
use vellum_core::model::{PDFDict, PDFObject};
use vellum_core::parser::{ContentLexer, PDFContentParser};

// =============================================================================
// Data Generation
// =============================================================================

/// Generate a page-like content stream with roughly N tokens.
fn generate_page(n: usize) -> Vec<u8> {
    let templates: &[&[u8]] = &[
        b"q ",
        b"1 0 0 1 72 720 cm ",
        b"0.5 g ",
        b"BT ",
        b"/F1 12 Tf ",
        b"100 700 Td ",
        b"(Hello World) Tj ",
        b"[(Kern) -120 (ing)] TJ ",
        b"ET ",
        b"/DeviceRGB CS 0.1 0.2 0.3 SC ",
        b"10 10 m 200 10 l 200 50 l h S ",
        b"0 0 50 50 re W n ",
        b"/P << /MCID 0 >> BDC EMC ",
        b"Q ",
    ];

    let mut data = Vec::with_capacity(n * 8);
    let mut i = 0;
    while i < n {
        let template = templates[i % templates.len()];
        data.extend_from_slice(template);
        i += template.iter().filter(|b| **b == b' ').count();
    }
    data
}

/// Generate data with primarily real tokens.
fn generate_real_tokens(n: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(n * 10);
    for i in 0..n {
        let value = match i % 4 {
            0 => format!("{}.{} ", i % 100, (i * 7) % 100),
            1 => format!("-{}.{} ", i % 50, (i * 3) % 100),
            2 => format!(".{} ", (i % 99) + 1),
            _ => format!("{} ", i % 1000),
        };
        data.extend_from_slice(value.as_bytes());
    }
    data
}

fn font_resources() -> PDFDict {
    let mut widths = Vec::new();
    for _ in 32..127 {
        widths.push(PDFObject::from(500i64));
    }
    let mut font = PDFDict::new();
    font.insert("Subtype".into(), PDFObject::name("Type1"));
    font.insert("FirstChar".into(), PDFObject::from(32i64));
    font.insert("Widths".into(), PDFObject::Array(widths));
    let mut fonts = PDFDict::new();
    fonts.insert("F1".into(), PDFObject::Dict(font));
    let mut resources = PDFDict::new();
    resources.insert("Font".into(), PDFObject::Dict(fonts));
    resources
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_tokenize");

    for n in [1_000, 10_000, 100_000] {
        let data = generate_page(n);
        group.bench_with_input(BenchmarkId::new("page", n), &data, |b, data| {
            b.iter(|| {
                let mut lexer = ContentLexer::new(black_box(data));
                while let Some(result) = lexer.next_token() {
                    black_box(result.unwrap());
                }
            })
        });
    }

    let data = generate_real_tokens(10_000);
    group.bench_with_input(BenchmarkId::new("reals", 10_000), &data, |b, data| {
        b.iter(|| {
            let mut lexer = ContentLexer::new(black_box(data));
            while let Some(result) = lexer.next_token() {
                black_box(result.unwrap());
            }
        })
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_parse");

    for n in [1_000, 10_000, 100_000] {
        let data = generate_page(n);
        group.bench_with_input(BenchmarkId::new("page", n), &data, |b, data| {
            b.iter(|| {
                for (_, token) in PDFContentParser::from_slice(black_box(data)) {
                    black_box(token.unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("processor_dispatch");
    let resources = font_resources();

    for n in [1_000, 10_000, 100_000] {
        let data = generate_page(n);
        group.bench_with_input(BenchmarkId::new("no_listener", n), &data, |b, data| {
            b.iter(|| {
                let mut p = PDFStreamProcessor::new(ProcessorConfig::default(), Vec::new());
                black_box(p.process(black_box(data), &resources).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("recorder", n), &data, |b, data| {
            b.iter(|| {
                let mut rec = EventRecorder::new();
                {
                    let mut p = PDFStreamProcessor::new(ProcessorConfig::default(), Vec::new())
                        .with_listener(&mut rec);
                    black_box(p.process(black_box(data), &resources).unwrap());
                }
                rec.events.len()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_dispatch);
criterion_main!(benches);
