//! Lifecycle coordinator: the fixed phase sequence driving one cycle.

use trellis_control::{render_head_block, ControlArena, ControlId, HeadAggregator, PartialResult};
use trellis_core::{
    ContextStack, EngineConfig, EngineResult, RequestContext, ResponseSink,
};

use crate::dispatcher::ActionDispatcher;
use crate::phases;
use crate::registry::ControlRegistry;
use crate::writer::PartialWriter;

/// Phases of a cycle, in the order the coordinator visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SecurityCheck,
    Init,
    AjaxDispatch,
    Process,
    MethodHook,
    Render,
    PostRenderEvents,
    Destroy,
}

/// A page: the owner of a control tree plus the page-level hooks.
///
/// The template renderer is a collaborator; [`Page::template`] is the
/// narrow seam it is consumed through.
pub trait Page {
    /// Root of the page's control tree.
    fn root(&self) -> ControlId;

    /// Security hook. Returning `false` is an explicit signal, not an
    /// error: the cycle jumps straight to DESTROY, render never happens,
    /// and for ajax cycles the fallback empty-result write is suppressed
    /// too (response generation is left entirely to this hook).
    fn on_security_check(&mut self) -> bool {
        true
    }

    /// GET hook, fired after process when the cycle continues.
    fn on_get(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// POST hook, fired after process when the cycle continues.
    fn on_post(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Fired in POST_RENDER_EVENTS, even when render was skipped.
    fn on_post_render(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Assemble the full-render output from the head block and body.
    fn template(&self, head: &str, body: &str) -> String {
        format!("<html><head>\n{head}\n</head><body>\n{body}\n</body></html>")
    }
}

/// What happened during one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    phases: Vec<Phase>,
    continued: bool,
    partial: bool,
    error: Option<String>,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            continued: true,
            ..Self::default()
        }
    }

    fn mark(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    /// Phases visited, in order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Check whether a phase was visited this cycle.
    pub fn visited(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }

    /// Whether the cycle ran to the render/template path.
    pub fn continued(&self) -> bool {
        self.continued
    }

    /// Whether the partial (ajax) path produced the response.
    pub fn wrote_partial(&self) -> bool {
        self.partial
    }

    /// Failure serialized into a diagnostic partial, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Drives the fixed phase sequence over a page's control tree.
///
/// `SECURITY_CHECK → INIT → (AJAX_DISPATCH?) → PROCESS → POST_OR_GET_HOOK
/// → RENDER → POST_RENDER_EVENTS → DESTROY`; DESTROY always runs, on every
/// exit path including failures, and the context pushed at entry is popped
/// by its guard.
#[derive(Debug, Clone, Default)]
pub struct LifecycleCoordinator {
    config: EngineConfig,
}

impl LifecycleCoordinator {
    /// Create a coordinator with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn writer(&self) -> PartialWriter {
        PartialWriter::new(self.config.full_content_type())
    }

    /// Run one full cycle for `ctx` against the page's control tree.
    ///
    /// Non-ajax failures propagate to the transport layer for a
    /// collaborator-defined error response; ajax failures are serialized
    /// back as a diagnostic partial result instead, because the client has
    /// no navigation context to show an error page.
    pub fn run(
        &self,
        page: &mut dyn Page,
        arena: &mut ControlArena,
        ctx: RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> EngineResult<CycleReport> {
        let is_ajax = ctx.is_ajax();
        let guard = ContextStack::push(ctx);
        let mut registry = ControlRegistry::new();
        let mut dispatcher = ActionDispatcher::new();
        let mut report = CycleReport::new();

        let result = self.drive(
            page,
            arena,
            &mut registry,
            &mut dispatcher,
            &mut report,
            sink,
        );

        // DESTROY always runs; the registry and dispatcher die with the
        // cycle and the guard pops the context.
        report.mark(Phase::Destroy);
        phases::run_destroy(arena, page.root());
        drop(guard);

        match result {
            Ok(()) => Ok(report),
            Err(err) if is_ajax => {
                tracing::warn!(error = %err, "ajax cycle failed, writing diagnostic partial");
                let diagnostic = PartialResult::new().with_section("error", err.to_string());
                self.writer().write(&diagnostic, sink)?;
                report.partial = true;
                report.continued = false;
                report.error = Some(err.to_string());
                Ok(report)
            }
            Err(err) => Err(err),
        }
    }

    /// Run a nested cycle reached via an internal forward.
    ///
    /// The forwarded context is pushed on top of the caller's; the nested
    /// cycle gets a fresh registry and dispatcher, so its listeners never
    /// leak into the enclosing cycle, and the enclosing context is
    /// restored when the forward completes.
    pub fn forward_to(
        &self,
        page: &mut dyn Page,
        arena: &mut ControlArena,
        ctx: RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> EngineResult<CycleReport> {
        self.run(page, arena, ctx.forward(), sink)
    }

    fn drive(
        &self,
        page: &mut dyn Page,
        arena: &mut ControlArena,
        registry: &mut ControlRegistry,
        dispatcher: &mut ActionDispatcher,
        report: &mut CycleReport,
        sink: &mut dyn ResponseSink,
    ) -> EngineResult<()> {
        let ctx = ContextStack::current()?;

        report.mark(Phase::SecurityCheck);
        if !page.on_security_check() {
            tracing::debug!("security check failed, skipping to destroy");
            report.continued = false;
            return Ok(());
        }

        report.mark(Phase::Init);
        phases::run_init(arena, page.root(), registry, dispatcher)?;

        if ctx.is_ajax() {
            return self.ajax_dispatch(arena, registry, dispatcher, report, sink, &ctx);
        }

        report.mark(Phase::Process);
        let process_outcome = phases::run_process(arena, page.root(), registry, dispatcher)?;
        if process_outcome.halts_cycle() {
            report.continued = false;
        }

        // Action listeners fire once, after process completes for the whole
        // active scope, in registration order. A StopCycle out of the walk
        // stops the rest of the pipeline here: queued listeners never fire.
        if report.continued && dispatcher.fire_action_listeners()?.halts_cycle() {
            report.continued = false;
        }

        if report.continued {
            report.mark(Phase::MethodHook);
            let hook = if ctx.is_post() {
                page.on_post()
            } else {
                page.on_get()
            };
            hook.map_err(|err| {
                trellis_core::EngineError::listener_failure("method hook", err)
            })?;
        }

        if report.continued {
            registry.fire_pre_response();

            report.mark(Phase::Render);
            let body = phases::run_render(arena, page.root(), registry, dispatcher)?;
            let mut aggregator = HeadAggregator::new();
            let head = render_head_block(&aggregator.aggregate(arena, page.root()));
            let output = page.template(&head, &body);
            sink.write(output.as_bytes(), &self.config.full_content_type())?;
        }

        report.mark(Phase::PostRenderEvents);
        page.on_post_render().map_err(|err| {
            trellis_core::EngineError::listener_failure("post render", err)
        })?;

        Ok(())
    }

    fn ajax_dispatch(
        &self,
        arena: &mut ControlArena,
        registry: &mut ControlRegistry,
        dispatcher: &mut ActionDispatcher,
        report: &mut CycleReport,
        sink: &mut dyn ResponseSink,
        ctx: &trellis_core::CurrentContext,
    ) -> EngineResult<()> {
        report.mark(Phase::AjaxDispatch);
        report.partial = true;

        let wanted = ctx.param(&self.config.target_param).unwrap_or_default();
        let target = match registry.resolve_target(wanted) {
            Ok(target) => target,
            Err(err) => {
                // Stale client-side id: fall back to an empty partial, not
                // an error page.
                tracing::warn!(target = wanted, error = %err, "ajax target not resolved");
                self.writer().write(&PartialResult::new(), sink)?;
                report.continued = false;
                return Ok(());
            }
        };
        tracing::debug!(target = %arena.control_id(target), "ajax target resolved");

        // Only the minimal subtree participates: siblings and ancestors
        // outside the path to the target never process.
        report.mark(Phase::Process);
        let process_outcome = phases::run_process(arena, target, registry, dispatcher)?;
        if process_outcome.halts_cycle() {
            report.continued = false;
        }
        if report.continued && dispatcher.fire_action_listeners()?.halts_cycle() {
            report.continued = false;
        }

        let target_id = arena.control_id(target).to_string();
        let mut partial = dispatcher.fire_behaviors(Some(&target_id))?;

        // Only resources contributed by this cycle's rendered scope are
        // resent; the full page's declarations are already in the browser.
        let mut aggregator = HeadAggregator::new();
        partial.prepend_head(aggregator.aggregate(arena, target));

        self.writer().write(&partial, sink)?;
        Ok(())
    }
}
