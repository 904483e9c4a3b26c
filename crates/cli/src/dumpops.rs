//! dumpops - Dump the events of a decoded content stream
//!
//! Runs each input through the stream processor and prints one JSON line
//! per event and diagnostic, or the marked-content tag dump.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{ArgAction, Parser, ValueEnum};
use memmap2::Mmap;
use serde::Serialize;
use serde_json::{Value, json};
use vellum_core::error::Diagnostic;
use vellum_core::interp::{
    EventPayload, EventRecorder, PDFStreamProcessor, ProcessorConfig, RenderEvent, RunOutcome,
    RunStatus, TagExtractor,
};
use vellum_core::model::{PDFDict, PDFObject, PathSegment};
use vellum_core::parser::{ContentToken, PDFContentParser};
use vellum_core::utils::{Rect, matrix_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One JSON object per line
    Json,
    /// Marked-content structure with the shown text
    Tags,
}

/// Dump the events of decoded PDF content streams.
#[derive(Parser, Debug)]
#[command(name = "dumpops")]
#[command(author, version, about = "Dump content stream events", long_about = None)]
struct Args {
    /// Decoded content stream files, one page each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Treat all files as segments of a single page
    #[arg(short = 'c', long, action = ArgAction::SetTrue)]
    concat: bool,

    /// File holding the page resource dictionary in PDF syntax (<< ... >>)
    #[arg(short = 'R', long)]
    resources: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "json")]
    format: Format,

    /// Nested form / Type 3 glyph depth limit
    #[arg(long = "max-depth", default_value_t = 32)]
    max_depth: usize,

    /// Abort a page after this many operators
    #[arg(long = "max-operators")]
    max_operators: Option<usize>,

    /// Do not run Type 3 glyph procedures
    #[arg(long = "no-type3", action = ArgAction::SetTrue)]
    no_type3: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,
}

#[derive(Serialize)]
struct EventLine<'a> {
    page: usize,
    event: &'a str,
    depth: usize,
    ctm: [f64; 6],
    #[serde(flatten)]
    payload: Value,
}

#[derive(Serialize)]
struct DiagnosticLine<'a> {
    page: usize,
    diagnostic: &'a str,
    pos: usize,
    depth: usize,
    operator: Option<&'a str>,
    message: String,
}

#[derive(Serialize)]
struct SummaryLine {
    page: usize,
    status: String,
    operators: usize,
    diagnostics: usize,
}

fn read_file(path: &Path) -> anyhow::Result<bytes::Bytes> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }?;
    Ok(bytes::Bytes::copy_from_slice(&mmap))
}

/// Read a resource dictionary written in PDF syntax.
fn read_resources(path: &Path) -> anyhow::Result<PDFDict> {
    let data = read_file(path)?;
    match PDFContentParser::from_slice(&data).next() {
        Some((_, Ok(ContentToken::Operand(PDFObject::Dict(dict))))) => Ok(dict),
        Some((pos, Ok(_))) => bail!("{}: expected a dictionary at {pos}", path.display()),
        Some((_, Err(e))) => bail!("{}: {e}", path.display()),
        None => Ok(PDFDict::new()),
    }
}

fn num(v: impl Display) -> Value {
    let s = v.to_string();
    s.parse::<serde_json::Number>()
        .map_or(Value::String(s), Value::Number)
}

fn rect(r: Rect) -> Value {
    json!([num(r.0), num(r.1), num(r.2), num(r.3)])
}

fn segment(seg: &PathSegment) -> Value {
    let op = match seg {
        PathSegment::MoveTo(_) => "m",
        PathSegment::LineTo(_) => "l",
        PathSegment::CurveTo(..) => "c",
        PathSegment::ClosePath => "h",
    };
    let mut out = vec![Value::from(op)];
    for (x, y) in seg.points() {
        out.push(num(x));
        out.push(num(y));
    }
    Value::Array(out)
}

fn payload(payload: &EventPayload) -> Value {
    match payload {
        EventPayload::Glyph(g) => json!({
            "code": g.code,
            "unicode": g.unicode,
            "font": g.font,
            "fontsize": num(g.fontsize),
            "trm": matrix_to_f64(g.trm),
            "advance": num(g.advance),
        }),
        EventPayload::Path(p) => json!({
            "stroke": p.stroke,
            "fill": p.fill.map(|r| r.as_str()),
            "bbox": p.bbox.map(rect),
            "segments": p.segments.iter().map(segment).collect::<Vec<_>>(),
        }),
        EventPayload::Image(img) => json!({
            "name": img.name,
            "inline": img.inline,
            "attrs": PDFObject::Dict(img.stream.attrs.clone()).to_string(),
            "length": img.stream.get_data().len(),
        }),
        EventPayload::Shading { name, .. } => json!({ "name": name }),
        EventPayload::Clip {
            rule,
            bounds,
            empty,
        } => json!({
            "rule": rule.as_str(),
            "bounds": bounds.map(rect),
            "empty": empty,
        }),
        EventPayload::MarkedContent { tag, props } => json!({
            "tag": tag,
            "props": props.as_ref().map(|p| PDFObject::Dict(p.clone()).to_string()),
        }),
        EventPayload::Form { name, matrix, bbox } => json!({
            "name": name,
            "matrix": matrix_to_f64(*matrix),
            "bbox": bbox.map(rect),
        }),
    }
}

fn write_event<W: Write>(out: &mut W, page: usize, event: &RenderEvent) -> anyhow::Result<()> {
    let line = EventLine {
        page,
        event: event.kind.as_str(),
        depth: event.depth,
        ctm: matrix_to_f64(event.state.ctm),
        payload: payload(&event.payload),
    };
    writeln!(out, "{}", serde_json::to_string(&line)?)?;
    Ok(())
}

fn write_diagnostic<W: Write>(out: &mut W, page: usize, diag: &Diagnostic) -> anyhow::Result<()> {
    let line = DiagnosticLine {
        page,
        diagnostic: diag.kind().as_str(),
        pos: diag.pos,
        depth: diag.depth,
        operator: diag.operator.as_deref(),
        message: diag.error.to_string(),
    };
    writeln!(out, "{}", serde_json::to_string(&line)?)?;
    Ok(())
}

fn status_str(outcome: &RunOutcome) -> String {
    match outcome.status {
        RunStatus::Finished => "finished".to_string(),
        RunStatus::Aborted(reason) => format!("aborted: {reason:?}"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ProcessorConfig::default()
        .with_max_nesting_depth(args.max_depth)
        .with_max_operators(args.max_operators)
        .with_type3_glyphs(!args.no_type3);

    let resources = match &args.resources {
        Some(path) => read_resources(path)?,
        None => PDFDict::new(),
    };

    let mut pages = Vec::new();
    for path in &args.files {
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }
        pages.push(read_file(path)?);
    }
    let pages: Vec<Vec<bytes::Bytes>> = if args.concat {
        vec![pages]
    } else {
        pages.into_iter().map(|p| vec![p]).collect()
    };

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)?;
        Box::new(BufWriter::new(file))
    };

    match args.format {
        Format::Json => {
            for (pageno, segments) in pages.into_iter().enumerate() {
                let mut recorder = EventRecorder::new();
                let outcome = {
                    let mut processor = PDFStreamProcessor::new(config.clone(), Vec::new())
                        .with_listener(&mut recorder);
                    processor.process_streams(segments, &resources)?
                };
                for event in &recorder.events {
                    write_event(&mut output, pageno, event)?;
                }
                for diag in &outcome.diagnostics {
                    write_diagnostic(&mut output, pageno, diag)?;
                }
                let summary = SummaryLine {
                    page: pageno,
                    status: status_str(&outcome),
                    operators: outcome.operators_executed,
                    diagnostics: outcome.diagnostics.len(),
                };
                writeln!(output, "{}", serde_json::to_string(&summary)?)?;
            }
        }
        Format::Tags => {
            let mut buf = Vec::new();
            {
                let mut extractor = TagExtractor::new(&mut buf);
                for segments in pages {
                    let outcome = {
                        let mut processor = PDFStreamProcessor::new(config.clone(), Vec::new())
                            .with_listener(&mut extractor);
                        processor.process_streams(segments, &resources)?
                    };
                    for diag in &outcome.diagnostics {
                        eprintln!("{diag}");
                    }
                }
                if let Some(e) = extractor.take_error() {
                    return Err(e.into());
                }
            }
            output.write_all(&buf)?;
        }
    }

    output.flush()?;
    Ok(())
}
