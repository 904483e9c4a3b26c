//! PDF content stream processor.
//!
//! Drives the parser, collects operands, checks arity and dispatches each
//! operator through the registry. Owns the graphics state, the graphics
//! state stack, the pending path and the marked-content stack for the
//! duration of one run, and re-enters itself for Form XObjects and Type 3
//! glyph procedures.
//!
//! Per-operator failures never unwind the run: they are recorded as
//! [`Diagnostic`]s and execution continues with the next token. Only
//! truncated input, cancellation and the configured operator limit abort.
//!
//! Note: handler method names like `do_Q`, `do_S`, `do_B` intentionally use
//! uppercase to match the operator mnemonics (q/Q, s/S, b/B, etc.).

use std::sync::Arc;

use bytes::Bytes;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use super::config::{CancelToken, ProcessorConfig};
use super::device::{EventKind, EventPayload, PDFEventListener, RenderEvent};
use super::font::{DefaultFontLoader, FontLoader, PDFFont};
use super::operands::{OperandStack, Operands};
use super::registry::{Arity, registry};
use super::resources::{ObjectResolver, ResourceChain, ResourceEntry, resolve_object};
use crate::error::{Diagnostic, PdfError, Result};
use crate::model::objects::{PDFDict, PDFObjRef, PDFObject};
use crate::model::path::{FillRule, PathSegment, rect_path, transform_path};
use crate::model::state::PDFGraphicState;
use crate::parser::content::{ContentToken, PDFContentParser};
use crate::utils::{Matrix, Point, Rect};

static DEFAULT_FONT_LOADER: DefaultFontLoader = DefaultFontLoader;

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Input ended inside a token, container or inline image
    Truncated { pos: usize },
    Cancelled,
    OperatorLimit { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Finished,
    Aborted(AbortReason),
}

/// Result of one processor run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub diagnostics: Vec<Diagnostic>,
    /// Operators dispatched, nested streams included
    pub operators_executed: usize,
}

impl RunOutcome {
    pub const fn is_finished(&self) -> bool {
        matches!(self.status, RunStatus::Finished)
    }
}

/// Lifecycle of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorStatus {
    Ready,
    Running,
    Finished,
    Aborted,
}

impl ProcessorStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Aborted => "aborted",
        }
    }
}

/// Kind of stream being executed at a nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Page,
    Form,
    Glyph,
}

/// A nested stream invocation.
#[derive(Debug, Clone)]
pub(crate) enum NestedRun {
    Form {
        name: String,
        objref: Option<PDFObjRef>,
        matrix: Matrix,
        bbox: Option<Rect>,
    },
    /// `font` and `proc_id` identify the font instance and glyph procedure
    /// for re-entry detection.
    Glyph {
        code: u32,
        font: usize,
        proc_id: usize,
    },
}

/// Path under construction, in user space.
#[derive(Debug, Clone, Default)]
pub(crate) struct PathBuilder {
    pub(crate) segments: Vec<PathSegment>,
    pub(crate) current_point: Option<Point>,
    pub(crate) subpath_start: Option<Point>,
}

/// An open marked-content section.
#[derive(Debug, Clone)]
pub(crate) struct MarkedFrame {
    pub(crate) tag: String,
    pub(crate) props: Option<PDFDict>,
}

/// Metrics declared by `d0`/`d1` inside a glyph procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub width: Point,
    /// Glyph bounding box; `Some` means the glyph is uncolored (`d1`)
    pub bbox: Option<Rect>,
}

/// Content stream processor.
///
/// A processor executes exactly one run; create a new one per page.
pub struct PDFStreamProcessor<'a> {
    config: ProcessorConfig,
    listeners: Vec<&'a mut dyn PDFEventListener>,
    resolver: Option<&'a dyn ObjectResolver>,
    font_loader: &'a dyn FontLoader,
    cancel: Option<CancelToken>,
    status: ProcessorStatus,

    /// Current graphics state
    pub(crate) gstate: PDFGraphicState,
    /// Graphics state stack for q/Q operators
    pub(crate) gstack: Vec<PDFGraphicState>,
    /// `Q` never pops below this length
    pub(crate) gstack_floor: usize,
    pub(crate) path: PathBuilder,
    /// Clip rule set by W/W*, applied at the next painting operator
    pub(crate) pending_clip: Option<FillRule>,
    pub(crate) resources: ResourceChain,
    pub(crate) mcstack: Vec<MarkedFrame>,
    /// `EMC` never closes sections opened by an enclosing stream
    pub(crate) mc_floor: usize,
    pub(crate) compat_depth: usize,
    pub(crate) depth: usize,
    pub(crate) scopes: Vec<Scope>,
    active_forms: Vec<PDFObjRef>,
    active_glyphs: Vec<(usize, usize)>,
    pub(crate) glyph_metrics: Option<GlyphMetrics>,
    pub(crate) inline_images: usize,
    font_cache: FxHashMap<PDFObjRef, Arc<dyn PDFFont>>,

    cur_pos: usize,
    diagnostics: Vec<Diagnostic>,
    operators_executed: usize,
    abort: Option<AbortReason>,
}

#[allow(non_snake_case)]
impl<'a> PDFStreamProcessor<'a> {
    /// Create a processor with an explicit (possibly empty) listener list.
    pub fn new(config: ProcessorConfig, listeners: Vec<&'a mut dyn PDFEventListener>) -> Self {
        let gstate = PDFGraphicState::with_ctm(config.initial_ctm);
        Self {
            config,
            listeners,
            resolver: None,
            font_loader: &DEFAULT_FONT_LOADER,
            cancel: None,
            status: ProcessorStatus::Ready,
            gstate,
            gstack: Vec::new(),
            gstack_floor: 0,
            path: PathBuilder::default(),
            pending_clip: None,
            resources: ResourceChain::default(),
            mcstack: Vec::new(),
            mc_floor: 0,
            compat_depth: 0,
            depth: 0,
            scopes: vec![Scope::Page],
            active_forms: Vec::new(),
            active_glyphs: Vec::new(),
            glyph_metrics: None,
            inline_images: 0,
            font_cache: FxHashMap::default(),
            cur_pos: 0,
            diagnostics: Vec::new(),
            operators_executed: 0,
            abort: None,
        }
    }

    /// Append a listener; listeners are notified in the order added.
    pub fn with_listener(mut self, listener: &'a mut dyn PDFEventListener) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_resolver(mut self, resolver: &'a dyn ObjectResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_font_loader(mut self, loader: &'a dyn FontLoader) -> Self {
        self.font_loader = loader;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub const fn status(&self) -> ProcessorStatus {
        self.status
    }

    /// Current graphics state (read-only).
    pub const fn graphics_state(&self) -> &PDFGraphicState {
        &self.gstate
    }

    /// Number of saved states on the graphics state stack.
    pub fn gstack_depth(&self) -> usize {
        self.gstack.len()
    }

    /// Metrics of the last `d0`/`d1` seen in a glyph procedure.
    pub const fn glyph_metrics(&self) -> Option<GlyphMetrics> {
        self.glyph_metrics
    }

    pub const fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    // ========================================================================
    // Running
    // ========================================================================

    /// Execute one content stream.
    pub fn process(&mut self, content: &[u8], resources: &PDFDict) -> Result<RunOutcome> {
        self.process_streams(vec![Bytes::copy_from_slice(content)], resources)
    }

    /// Execute a page whose content is split over several streams.
    ///
    /// The segments are read as one concatenated stream.
    pub fn process_streams(
        &mut self,
        segments: Vec<Bytes>,
        resources: &PDFDict,
    ) -> Result<RunOutcome> {
        if self.status != ProcessorStatus::Ready {
            return Err(PdfError::ProcessorNotReady(self.status.as_str()));
        }
        self.status = ProcessorStatus::Running;
        self.resources = ResourceChain::new(resources.clone());
        debug!(segments = segments.len(), "content stream run started");
        for listener in &mut self.listeners {
            listener.run_started();
        }

        self.execute(PDFContentParser::new(segments));

        self.gstack.clear();
        self.compat_depth = 0;
        let status = match self.abort.take() {
            Some(reason) => {
                self.status = ProcessorStatus::Aborted;
                RunStatus::Aborted(reason)
            }
            None => {
                self.status = ProcessorStatus::Finished;
                RunStatus::Finished
            }
        };
        let outcome = RunOutcome {
            status,
            diagnostics: std::mem::take(&mut self.diagnostics),
            operators_executed: self.operators_executed,
        };
        debug!(
            status = ?outcome.status,
            operators = outcome.operators_executed,
            diagnostics = outcome.diagnostics.len(),
            "content stream run finished"
        );
        for listener in &mut self.listeners {
            listener.run_finished(&outcome);
        }
        Ok(outcome)
    }

    fn should_stop(&mut self) -> bool {
        if self.abort.is_some() {
            return true;
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            debug!("content stream run cancelled");
            self.abort = Some(AbortReason::Cancelled);
            return true;
        }
        false
    }

    /// Main loop over one stream.
    fn execute(&mut self, mut parser: PDFContentParser) {
        let mut stack = OperandStack::new();
        let saved_floor = std::mem::replace(&mut self.mc_floor, self.mcstack.len());

        while let Some((pos, token)) = parser.next_with_pos() {
            if self.should_stop() {
                break;
            }
            self.cur_pos = pos;
            match token {
                Ok(ContentToken::Operand(obj)) => stack.push(obj),
                Ok(ContentToken::Keyword(op)) => {
                    let args = stack.drain();
                    self.dispatch(pos, &op, &args);
                }
                Ok(ContentToken::InlineImage(image)) => {
                    let args = stack.drain();
                    if args.is_empty() {
                        self.dispatch(pos, "EI", &[PDFObject::Stream(Box::new(image))]);
                    } else {
                        // The image is dropped along with the operands
                        self.report(
                            Some("BI"),
                            PdfError::ArityMismatch {
                                operator: SmolStr::new_static("BI"),
                                expected: Arity::Exact(0),
                                got: args.len(),
                            },
                        );
                    }
                }
                Err(PdfError::UnexpectedEof) => {
                    debug!(pos, depth = self.depth, "content stream truncated");
                    self.abort = Some(AbortReason::Truncated { pos });
                    break;
                }
                Err(err) => self.report(None, err),
            }
        }
        if !stack.is_empty() {
            trace!(count = stack.len(), "discarding trailing operands");
        }

        self.close_marked_content();
        self.mc_floor = saved_floor;
    }

    /// Look up, arity-check and run one operator.
    fn dispatch(&mut self, pos: usize, op: &str, args: &[PDFObject]) {
        if let Some(limit) = self.config.max_operators {
            if self.operators_executed >= limit {
                debug!(limit, "operator limit reached");
                self.abort = Some(AbortReason::OperatorLimit { limit });
                return;
            }
        }
        self.operators_executed += 1;
        self.cur_pos = pos;

        let Some(spec) = registry().lookup(op) else {
            if self.compat_depth > 0 {
                trace!(op, "unknown operator ignored in compatibility section");
            } else {
                self.report(Some(op), PdfError::UnknownOperator(SmolStr::new(op)));
            }
            return;
        };
        if !spec.arity.accepts(args.len()) {
            self.report(
                Some(op),
                PdfError::ArityMismatch {
                    operator: SmolStr::new(op),
                    expected: spec.arity,
                    got: args.len(),
                },
            );
            return;
        }

        trace!(op, pos, depth = self.depth, "dispatch");
        if let Err(err) = (spec.handler)(self, &Operands::new(op, args)) {
            self.cur_pos = pos;
            self.report(Some(op), err);
        }
    }

    /// Execute a nested stream (Form XObject or Type 3 glyph procedure).
    ///
    /// The nested stream starts from a copy of the current state with `ctm`
    /// installed, gets its own save point and resource scope, and leaves
    /// the caller's state exactly as it found it.
    pub(crate) fn run_nested(
        &mut self,
        run: NestedRun,
        data: Bytes,
        resources: Option<PDFDict>,
        ctm: Matrix,
    ) -> Result<()> {
        let next = self.depth + 1;
        if next > self.config.max_nesting_depth {
            return Err(PdfError::RecursionLimit {
                depth: next,
                limit: self.config.max_nesting_depth,
            });
        }
        let objref = match &run {
            NestedRun::Form { objref, .. } => *objref,
            NestedRun::Glyph { .. } => None,
        };
        let glyph = match &run {
            NestedRun::Glyph { font, proc_id, .. } => Some((*font, *proc_id)),
            NestedRun::Form { .. } => None,
        };
        let reentered = objref.is_some_and(|r| self.active_forms.contains(&r))
            || glyph.is_some_and(|(font, proc_id)| {
                self.active_glyphs
                    .iter()
                    .any(|(f, p)| *f == font || *p == proc_id)
            });
        if reentered {
            return Err(PdfError::RecursionLimit {
                depth: next,
                limit: self.config.max_nesting_depth,
            });
        }

        // Clip region of a form, computed before anything is touched
        let clip = match &run {
            NestedRun::Form {
                bbox: Some((x0, y0, x1, y1)),
                ..
            } => Some(transform_path(&rect_path(*x0, *y0, *x1, *y1), ctm)?),
            _ => None,
        };

        let saved_state = self.gstate.clone();
        let saved_path = std::mem::take(&mut self.path);
        let saved_clip = self.pending_clip.take();
        let saved_compat = std::mem::replace(&mut self.compat_depth, 0);
        let saved_gfloor = self.gstack_floor;
        let saved_pos = self.cur_pos;
        let entry_len = self.gstack.len();

        self.gstack.push(self.gstate.clone());
        self.gstack_floor = self.gstack.len();
        self.gstate.ctm = ctm;
        self.resources.push(resources.unwrap_or_default());
        self.depth = next;
        if let Some(r) = objref {
            self.active_forms.push(r);
        }
        if let Some(g) = glyph {
            self.active_glyphs.push(g);
        }

        match &run {
            NestedRun::Form {
                name, matrix, bbox, ..
            } => {
                debug!(form = %name, depth = next, "entering form xobject");
                self.scopes.push(Scope::Form);
                if let Some(path) = clip {
                    self.gstate.clip.intersect(path, FillRule::NonZero);
                }
                self.emit(
                    EventKind::FormBegin,
                    EventPayload::Form {
                        name: name.clone(),
                        matrix: *matrix,
                        bbox: *bbox,
                    },
                );
            }
            NestedRun::Glyph { code, .. } => {
                debug!(code, depth = next, "entering type3 glyph procedure");
                self.scopes.push(Scope::Glyph);
                self.glyph_metrics = None;
            }
        }

        self.execute(PDFContentParser::new(vec![data]));

        if let Some(AbortReason::Truncated { pos }) = self.abort {
            // Truncation of a nested stream only ends that stream
            self.abort = None;
            self.cur_pos = pos;
            self.report(None, PdfError::UnexpectedEof);
        }

        match &run {
            NestedRun::Form {
                name, matrix, bbox, ..
            } => {
                self.emit(
                    EventKind::FormEnd,
                    EventPayload::Form {
                        name: name.clone(),
                        matrix: *matrix,
                        bbox: *bbox,
                    },
                );
                debug!(form = %name, depth = next, "leaving form xobject");
            }
            NestedRun::Glyph { code, .. } => {
                debug!(code, depth = next, metrics = ?self.glyph_metrics, "leaving type3 glyph procedure");
            }
        }

        self.scopes.pop();
        if objref.is_some() {
            self.active_forms.pop();
        }
        if glyph.is_some() {
            self.active_glyphs.pop();
        }
        self.depth -= 1;
        self.resources.pop();
        self.gstack.truncate(entry_len);
        self.gstack_floor = saved_gfloor;
        self.gstate = saved_state;
        self.path = saved_path;
        self.pending_clip = saved_clip;
        self.compat_depth = saved_compat;
        self.cur_pos = saved_pos;
        Ok(())
    }

    /// Report sections still open at the end of a stream and close them.
    fn close_marked_content(&mut self) {
        let open = self.mcstack.len().saturating_sub(self.mc_floor);
        if open == 0 {
            return;
        }
        let tags: Vec<&str> = self.mcstack[self.mc_floor..]
            .iter()
            .map(|f| f.tag.as_str())
            .collect();
        let msg = format!("{open} unclosed section(s) at end of stream: {}", tags.join(" "));
        self.report(None, PdfError::MarkedContentMismatch(msg));
        while self.mcstack.len() > self.mc_floor {
            if let Some(frame) = self.mcstack.pop() {
                self.emit(
                    EventKind::MarkedContentEnd,
                    EventPayload::MarkedContent {
                        tag: frame.tag,
                        props: frame.props,
                    },
                );
            }
        }
    }

    // ========================================================================
    // Helpers for operator handlers
    // ========================================================================

    /// Record a diagnostic at the current position.
    pub(crate) fn report(&mut self, operator: Option<&str>, error: PdfError) {
        let diag = Diagnostic::new(self.cur_pos, self.depth, operator, error);
        warn!(
            kind = %diag.kind(),
            pos = diag.pos,
            depth = diag.depth,
            operator = diag.operator.as_deref().unwrap_or(""),
            "{}",
            diag.error
        );
        for listener in &mut self.listeners {
            listener.diagnostic(&diag);
        }
        self.diagnostics.push(diag);
    }

    /// Notify every listener, with a snapshot of the current state.
    pub(crate) fn emit(&mut self, kind: EventKind, payload: EventPayload) {
        if self.listeners.is_empty() {
            return;
        }
        let event = RenderEvent {
            kind,
            depth: self.depth,
            state: self.gstate.clone(),
            payload,
        };
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }

    pub(crate) const fn resolver(&self) -> Option<&'a dyn ObjectResolver> {
        self.resolver
    }

    pub(crate) fn resolve(&self, obj: &PDFObject) -> PDFObject {
        resolve_object(obj, self.resolver)
    }

    /// Find a named resource, or fail with `MissingResource`.
    pub(crate) fn lookup_resource(
        &self,
        category: &'static str,
        name: &str,
    ) -> Result<ResourceEntry> {
        self.resources
            .lookup(category, name, self.resolver)
            .ok_or_else(|| PdfError::MissingResource {
                category,
                name: name.to_string(),
            })
    }

    pub(crate) fn in_glyph(&self) -> bool {
        self.scopes.last() == Some(&Scope::Glyph)
    }

    /// Load a font from its dictionary, reusing fonts reached through the
    /// same indirect reference.
    pub(crate) fn load_font(
        &mut self,
        name: &str,
        objref: Option<PDFObjRef>,
        spec: &PDFObject,
    ) -> Result<Arc<dyn PDFFont>> {
        if let Some(font) = objref.and_then(|r| self.font_cache.get(&r)) {
            return Ok(Arc::clone(font));
        }
        let spec = self.resolve(spec);
        let font = self.font_loader.load(name, spec.as_dict()?, self.resolver)?;
        if let Some(r) = objref {
            self.font_cache.insert(r, Arc::clone(&font));
        }
        trace!(font = name, subtype = font.subtype(), "font loaded");
        Ok(font)
    }
}
