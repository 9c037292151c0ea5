//! Single-phase drivers over the control tree.
//!
//! The coordinator composes these into full cycles; the mock harness drives
//! them one at a time to verify ordering properties in isolation.

use trellis_control::{
    ActionListener, AjaxBehavior, ControlArena, ControlCx, ControlId, PreResponseFn, Registrar,
};
use trellis_core::{EngineError, EngineResult, Outcome};

use crate::dispatcher::ActionDispatcher;
use crate::registry::ControlRegistry;

/// Registration sink for one cycle, routing control registrations into the
/// cycle's registry and dispatcher.
#[derive(Debug)]
pub struct CycleRegistrar<'a> {
    /// Registry recording ajax eligibility and pre-response callbacks.
    pub registry: &'a mut ControlRegistry,
    /// Dispatcher holding the listener/behavior queues.
    pub dispatcher: &'a mut ActionDispatcher,
}

impl Registrar for CycleRegistrar<'_> {
    fn register_target(&mut self, source: ControlId, source_id: &str) {
        self.registry.register_target(source, source_id);
    }

    fn register_behavior(&mut self, source: ControlId, source_id: &str, behavior: AjaxBehavior) {
        self.registry.register_behavior_source(source);
        self.dispatcher.queue_behavior(source, source_id, behavior);
    }

    fn register_listener(&mut self, source: ControlId, source_id: &str, listener: ActionListener) {
        self.dispatcher.queue_listener(source, source_id, listener);
    }

    fn register_pre_response(&mut self, callback: PreResponseFn) {
        self.registry.register_pre_response(callback);
    }
}

/// Run the init phase: pre-order walk firing `on_init`, during which
/// controls register themselves for callbacks.
pub fn run_init(
    arena: &mut ControlArena,
    root: ControlId,
    registry: &mut ControlRegistry,
    dispatcher: &mut ActionDispatcher,
) -> EngineResult<()> {
    for id in arena.walk(root) {
        let control_id = arena.control_id(id).to_string();
        let name = arena.name(id).to_string();
        let mut registrar = CycleRegistrar {
            registry: &mut *registry,
            dispatcher: &mut *dispatcher,
        };
        let mut cx = ControlCx::new(id, control_id, name, &mut registrar);
        arena
            .control_mut(id)
            .on_init(&mut cx)
            .map_err(|err| EngineError::listener_failure("init", err))?;
    }
    Ok(())
}

/// Run the process phase over the subtree rooted at `scope`.
///
/// Pre-order walk firing `on_process`. [`Outcome::StopCycle`] halts the
/// traversal immediately and is returned to the caller;
/// [`Outcome::StopPhase`] prunes the current node's subtree but keeps
/// walking its siblings.
pub fn run_process(
    arena: &mut ControlArena,
    scope: ControlId,
    registry: &mut ControlRegistry,
    dispatcher: &mut ActionDispatcher,
) -> EngineResult<Outcome> {
    process_node(arena, scope, registry, dispatcher)
}

fn process_node(
    arena: &mut ControlArena,
    id: ControlId,
    registry: &mut ControlRegistry,
    dispatcher: &mut ActionDispatcher,
) -> EngineResult<Outcome> {
    let control_id = arena.control_id(id).to_string();
    let name = arena.name(id).to_string();
    let outcome = {
        let mut registrar = CycleRegistrar {
            registry: &mut *registry,
            dispatcher: &mut *dispatcher,
        };
        let mut cx = ControlCx::new(id, control_id, name, &mut registrar);
        arena
            .control_mut(id)
            .on_process(&mut cx)
            .map_err(|err| EngineError::listener_failure("process", err))?
    };

    match outcome {
        Outcome::StopCycle => Ok(Outcome::StopCycle),
        // Prune this subtree; siblings keep processing.
        Outcome::StopPhase => Ok(Outcome::Continue),
        Outcome::Continue => {
            for child in arena.children(id).to_vec() {
                if process_node(arena, child, registry, dispatcher)?.halts_cycle() {
                    return Ok(Outcome::StopCycle);
                }
            }
            Ok(Outcome::Continue)
        }
    }
}

/// Run the render phase over the subtree rooted at `root` and return the
/// produced markup.
///
/// Renders pre-order, with `on_render_end` fired post-order so container
/// controls can close wrappers around their children.
pub fn run_render(
    arena: &mut ControlArena,
    root: ControlId,
    registry: &mut ControlRegistry,
    dispatcher: &mut ActionDispatcher,
) -> EngineResult<String> {
    let mut out = String::new();
    render_node(arena, root, registry, dispatcher, &mut out)?;
    Ok(out)
}

fn render_node(
    arena: &mut ControlArena,
    id: ControlId,
    registry: &mut ControlRegistry,
    dispatcher: &mut ActionDispatcher,
    out: &mut String,
) -> EngineResult<()> {
    let control_id = arena.control_id(id).to_string();
    let name = arena.name(id).to_string();
    {
        let mut registrar = CycleRegistrar {
            registry: &mut *registry,
            dispatcher: &mut *dispatcher,
        };
        let mut cx = ControlCx::new(id, control_id.clone(), name.clone(), &mut registrar);
        arena
            .control_mut(id)
            .on_render(&mut cx, out)
            .map_err(|err| EngineError::listener_failure("render", err))?;
    }
    for child in arena.children(id).to_vec() {
        render_node(arena, child, registry, dispatcher, out)?;
    }
    {
        let mut registrar = CycleRegistrar {
            registry: &mut *registry,
            dispatcher: &mut *dispatcher,
        };
        let mut cx = ControlCx::new(id, control_id, name, &mut registrar);
        arena
            .control_mut(id)
            .on_render_end(&mut cx, out)
            .map_err(|err| EngineError::listener_failure("render", err))?;
    }
    Ok(())
}

/// Run the destroy phase: `on_destroy` bottom-up over the subtree, so
/// children deregister before their parents.
pub fn run_destroy(arena: &mut ControlArena, root: ControlId) {
    for id in arena.walk(root).into_iter().rev() {
        arena.control_mut(id).on_destroy();
    }
}
