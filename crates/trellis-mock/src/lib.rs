//! Test harness for driving controls through lifecycle phases one at a
//! time, without a page, template renderer, or transport.
//!
//! [`MockCycle`] owns the per-cycle registry and dispatcher that the
//! coordinator would normally create, so a test can run exactly the phase
//! it cares about and inspect the state in between:
//!
//! ```
//! use trellis_control::ControlArena;
//! use trellis_core::{Method, RequestContext};
//! use trellis_mock::MockCycle;
//!
//! # struct Field;
//! # impl trellis_control::Control for Field {}
//! let mut arena = ControlArena::new();
//! let root = arena.insert_root("page", Box::new(Field)).unwrap();
//!
//! let mut cycle = MockCycle::new();
//! cycle.init_context(RequestContext::new(Method::Post).with_param("name", "hi"));
//! cycle.execute_init(&mut arena, root).unwrap();
//! cycle.execute_process(&mut arena, root).unwrap();
//! cycle.execute_action_listeners().unwrap();
//! cycle.cleanup();
//! ```

use trellis_control::{ControlArena, ControlId, PartialResult};
use trellis_core::{ContextGuard, ContextStack, EngineResult, Outcome, RequestContext};
use trellis_engine::{phases, ActionDispatcher, ControlRegistry};

/// One simulated cycle: a pushed context plus the registry and dispatcher
/// the phase drivers record into.
#[derive(Debug, Default)]
pub struct MockCycle {
    registry: ControlRegistry,
    dispatcher: ActionDispatcher,
    guard: Option<ContextGuard>,
}

impl MockCycle {
    /// Create a harness with no context pushed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a request context for this cycle.
    ///
    /// Replacing an un-cleaned context pops the previous one first, so one
    /// harness can simulate consecutive cycles.
    pub fn init_context(&mut self, ctx: RequestContext) {
        self.guard = None;
        self.guard = Some(ContextStack::push(ctx));
    }

    /// Run the init phase over the subtree rooted at `root`.
    pub fn execute_init(&mut self, arena: &mut ControlArena, root: ControlId) -> EngineResult<()> {
        phases::run_init(arena, root, &mut self.registry, &mut self.dispatcher)
    }

    /// Run the process phase over the subtree rooted at `scope`.
    pub fn execute_process(
        &mut self,
        arena: &mut ControlArena,
        scope: ControlId,
    ) -> EngineResult<Outcome> {
        phases::run_process(arena, scope, &mut self.registry, &mut self.dispatcher)
    }

    /// Fire the queued action listeners, in registration order.
    pub fn execute_action_listeners(&mut self) -> EngineResult<Outcome> {
        self.dispatcher.fire_action_listeners()
    }

    /// Fire the queued ajax behaviors and return the merged partial.
    pub fn execute_behaviors(&mut self, target_id: Option<&str>) -> EngineResult<PartialResult> {
        self.dispatcher.fire_behaviors(target_id)
    }

    /// Fire the registered pre-response callbacks.
    pub fn execute_pre_response(&mut self) {
        self.registry.fire_pre_response();
    }

    /// Run the render phase and return the produced markup.
    pub fn execute_render(
        &mut self,
        arena: &mut ControlArena,
        root: ControlId,
    ) -> EngineResult<String> {
        phases::run_render(arena, root, &mut self.registry, &mut self.dispatcher)
    }

    /// Run the destroy phase over the subtree rooted at `root`.
    pub fn execute_destroy(&mut self, arena: &mut ControlArena, root: ControlId) {
        phases::run_destroy(arena, root);
    }

    /// Pop the pushed context, if any.
    pub fn cleanup(&mut self) {
        self.guard = None;
    }

    /// This cycle's registry, for inspecting targets and callbacks.
    pub fn registry(&self) -> &ControlRegistry {
        &self.registry
    }

    /// This cycle's dispatcher, for inspecting queue sizes.
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Forcibly reset the thread's context stack between unrelated tests.
    pub fn reset() {
        ContextStack::clear_all();
    }
}
