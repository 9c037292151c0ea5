//! Control trait and the per-hook registration context.

use trellis_core::{ContextStack, CurrentContext, EngineResult, Outcome};

use crate::arena::ControlId;
use crate::head::HeadResource;
use crate::partial::PartialResult;

/// Originating-control view passed to a fired action listener.
#[derive(Debug, Clone)]
pub struct ListenerCx {
    /// Arena id of the control that queued the listener.
    pub source: ControlId,
    /// Derived id of that control.
    pub source_id: String,
}

/// Event descriptor passed to a fired ajax behavior.
#[derive(Debug, Clone)]
pub struct AjaxEvent {
    /// Arena id of the control that registered the behavior.
    pub source: ControlId,
    /// Derived id of that control.
    pub source_id: String,
    /// Derived id of the resolved ajax target, if one resolved this cycle.
    pub target_id: Option<String>,
}

/// An action listener: a function value capturing exactly the state it
/// needs, fired once per cycle in registration order.
pub type ActionListener = Box<dyn FnMut(&ListenerCx) -> anyhow::Result<Outcome>>;

/// An ajax behavior: fires on every ajax cycle regardless of the resolved
/// target and contributes a partial result.
pub type AjaxBehavior = Box<dyn FnMut(&AjaxEvent) -> anyhow::Result<PartialResult>>;

/// Callback fired once before the render phase.
pub type PreResponseFn = Box<dyn FnMut()>;

/// Per-cycle registration sink the engine hands to controls.
///
/// Implemented by the engine over its cycle-scoped registry and dispatcher;
/// controls only see it through [`ControlCx`].
pub trait Registrar {
    /// Record the control as eligible ajax target for this cycle.
    fn register_target(&mut self, source: ControlId, source_id: &str);

    /// Register a behavior that runs on every ajax cycle.
    fn register_behavior(&mut self, source: ControlId, source_id: &str, behavior: AjaxBehavior);

    /// Queue an action listener for this cycle.
    fn register_listener(&mut self, source: ControlId, source_id: &str, listener: ActionListener);

    /// Register a callback fired once before render.
    fn register_pre_response(&mut self, callback: PreResponseFn);
}

/// View a control receives in its lifecycle hooks: its own identity plus
/// the registration seams for the current cycle.
///
/// The ambient request context is read through [`ControlCx::context`]
/// rather than held here, so a forward pushed mid-cycle is observed
/// transparently.
pub struct ControlCx<'a> {
    id: ControlId,
    control_id: String,
    name: String,
    registrar: &'a mut dyn Registrar,
}

impl<'a> ControlCx<'a> {
    /// Create a hook context for one control.
    pub fn new(
        id: ControlId,
        control_id: impl Into<String>,
        name: impl Into<String>,
        registrar: &'a mut dyn Registrar,
    ) -> Self {
        Self {
            id,
            control_id: control_id.into(),
            name: name.into(),
            registrar,
        }
    }

    /// Arena id of this control.
    pub fn id(&self) -> ControlId {
        self.id
    }

    /// Derived id of this control (ajax targeting / dedup key).
    pub fn control_id(&self) -> &str {
        &self.control_id
    }

    /// Name of this control (unique among siblings).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The request context on top of the thread stack.
    pub fn context(&self) -> EngineResult<CurrentContext> {
        ContextStack::current()
    }

    /// Register this control as an eligible ajax target.
    pub fn register_ajax_target(&mut self) {
        self.registrar.register_target(self.id, &self.control_id);
    }

    /// Register an ajax behavior owned by this control.
    pub fn register_behavior(&mut self, behavior: AjaxBehavior) {
        self.registrar
            .register_behavior(self.id, &self.control_id, behavior);
    }

    /// Queue an action listener to fire after the process phase.
    pub fn queue_listener(&mut self, listener: ActionListener) {
        self.registrar
            .register_listener(self.id, &self.control_id, listener);
    }

    /// Register a pre-response callback.
    pub fn register_pre_response(&mut self, callback: PreResponseFn) {
        self.registrar.register_pre_response(callback);
    }
}

impl std::fmt::Debug for ControlCx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlCx")
            .field("id", &self.id)
            .field("control_id", &self.control_id)
            .field("name", &self.name)
            .finish()
    }
}

/// A stateful node in the per-request component tree.
///
/// Every phase is optional; a control may no-op any of them.
pub trait Control {
    /// Attach to the cycle: register as ajax target / behavior source if
    /// the control wants callbacks.
    fn on_init(&mut self, cx: &mut ControlCx<'_>) -> anyhow::Result<()> {
        let _ = cx;
        Ok(())
    }

    /// Bind incoming request parameters and decide whether the control's
    /// listener fires this cycle.
    ///
    /// [`Outcome::StopCycle`] stops processing the rest of the tree and the
    /// rest of the pipeline for this cycle.
    fn on_process(&mut self, cx: &mut ControlCx<'_>) -> anyhow::Result<Outcome> {
        let _ = cx;
        Ok(Outcome::Continue)
    }

    /// Produce output. Called pre-order; children render in between this
    /// and [`Control::on_render_end`].
    fn on_render(&mut self, cx: &mut ControlCx<'_>, out: &mut String) -> anyhow::Result<()> {
        let _ = (cx, out);
        Ok(())
    }

    /// Close any wrapper opened in [`Control::on_render`]. Called
    /// post-order, after the children rendered.
    fn on_render_end(&mut self, cx: &mut ControlCx<'_>, out: &mut String) -> anyhow::Result<()> {
        let _ = (cx, out);
        Ok(())
    }

    /// Deregister; runs on every exit path.
    fn on_destroy(&mut self) {}

    /// Head resources this control contributes, in declaration order.
    fn head_resources(&self) -> Vec<HeadResource> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::PartialResult;

    #[derive(Default)]
    struct RecordingRegistrar {
        targets: Vec<String>,
        listeners: usize,
        behaviors: usize,
        pre_response: usize,
    }

    impl Registrar for RecordingRegistrar {
        fn register_target(&mut self, _source: ControlId, source_id: &str) {
            self.targets.push(source_id.to_string());
        }

        fn register_behavior(
            &mut self,
            _source: ControlId,
            _source_id: &str,
            _behavior: AjaxBehavior,
        ) {
            self.behaviors += 1;
        }

        fn register_listener(
            &mut self,
            _source: ControlId,
            _source_id: &str,
            _listener: ActionListener,
        ) {
            self.listeners += 1;
        }

        fn register_pre_response(&mut self, _callback: PreResponseFn) {
            self.pre_response += 1;
        }
    }

    #[test]
    fn test_cx_routes_registrations() {
        let mut registrar = RecordingRegistrar::default();
        let mut cx = ControlCx::new(ControlId::from_index(0), "form_save", "save", &mut registrar);

        cx.register_ajax_target();
        cx.queue_listener(Box::new(|_| Ok(Outcome::Continue)));
        cx.register_behavior(Box::new(|_| Ok(PartialResult::new())));
        cx.register_pre_response(Box::new(|| {}));

        assert_eq!(registrar.targets, vec!["form_save".to_string()]);
        assert_eq!(registrar.listeners, 1);
        assert_eq!(registrar.behaviors, 1);
        assert_eq!(registrar.pre_response, 1);
    }

    #[test]
    fn test_default_hooks_no_op() {
        struct Bare;
        impl Control for Bare {}

        let mut registrar = RecordingRegistrar::default();
        let mut cx = ControlCx::new(ControlId::from_index(0), "bare", "bare", &mut registrar);
        let mut bare = Bare;
        let mut out = String::new();

        bare.on_init(&mut cx).unwrap();
        assert_eq!(bare.on_process(&mut cx).unwrap(), Outcome::Continue);
        bare.on_render(&mut cx, &mut out).unwrap();
        bare.on_render_end(&mut cx, &mut out).unwrap();
        bare.on_destroy();

        assert!(out.is_empty());
        assert!(bare.head_resources().is_empty());
    }
}
