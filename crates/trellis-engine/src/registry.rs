//! Per-cycle registry of ajax-eligible controls and pre-response callbacks.

use trellis_control::{ControlId, PreResponseFn};
use trellis_core::{EngineError, EngineResult};

/// Records which controls participate in the current cycle.
///
/// A fresh registry is created for every cycle and discarded at DESTROY;
/// it is never shared across threads or cycles, so it needs no
/// synchronization.
#[derive(Default)]
pub struct ControlRegistry {
    targets: Vec<(ControlId, String)>,
    behavior_sources: Vec<ControlId>,
    pre_response: Vec<PreResponseFn>,
}

impl ControlRegistry {
    /// Create an empty registry for one cycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a control as eligible ajax target.
    ///
    /// Registration happens during `init`, before the cycle knows which id
    /// the request targets.
    pub fn register_target(&mut self, id: ControlId, control_id: &str) {
        self.targets.push((id, control_id.to_string()));
    }

    /// Record that a control registered at least one behavior this cycle.
    pub fn register_behavior_source(&mut self, id: ControlId) {
        self.behavior_sources.push(id);
    }

    /// Register a callback fired once before the render phase.
    pub fn register_pre_response(&mut self, callback: PreResponseFn) {
        self.pre_response.push(callback);
    }

    /// Controls registered as ajax targets, in registration order.
    pub fn targets(&self) -> &[(ControlId, String)] {
        &self.targets
    }

    /// Controls that registered behaviors this cycle.
    pub fn behavior_sources(&self) -> &[ControlId] {
        &self.behavior_sources
    }

    /// Resolve the ajax target for this cycle.
    ///
    /// The request parameter must match exactly one registered control's
    /// derived id; a stale id resolves to [`EngineError::AjaxTargetNotFound`]
    /// and the coordinator falls back to an empty partial result.
    pub fn resolve_target(&self, wanted: &str) -> EngineResult<ControlId> {
        self.targets
            .iter()
            .find(|(_, control_id)| control_id == wanted)
            .map(|&(id, _)| id)
            .ok_or_else(|| EngineError::AjaxTargetNotFound {
                target: wanted.to_string(),
            })
    }

    /// Fire the registered pre-response callbacks, in registration order.
    /// Each callback runs at most once per cycle.
    pub fn fire_pre_response(&mut self) {
        for mut callback in self.pre_response.drain(..) {
            callback();
        }
    }
}

impl std::fmt::Debug for ControlRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlRegistry")
            .field("targets", &self.targets)
            .field("behavior_sources", &self.behavior_sources)
            .field("pre_response", &self.pre_response.len())
            .finish()
    }
}
