//! Ordered listener/behavior dispatch with phase-complete firing.

use trellis_control::{
    ActionListener, AjaxBehavior, AjaxEvent, ControlId, ListenerCx, PartialResult,
};
use trellis_core::{EngineError, EngineResult, Outcome};

/// Collects (listener, source control) pairs during processing and fires
/// them in registration order.
///
/// A fresh dispatcher is created per cycle; a nested cycle (forward,
/// simulated test request) gets its own instance alongside its own
/// context, so a nested page's listeners never leak into the enclosing
/// cycle. Entries are consumed exactly once.
#[derive(Default)]
pub struct ActionDispatcher {
    action_listeners: Vec<(ListenerCx, ActionListener)>,
    ajax_behaviors: Vec<(ControlId, String, AjaxBehavior)>,
}

impl ActionDispatcher {
    /// Create an empty dispatcher for one cycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action listener. Order of queuing is the firing order.
    pub fn queue_listener(&mut self, source: ControlId, source_id: &str, listener: ActionListener) {
        self.action_listeners.push((
            ListenerCx {
                source,
                source_id: source_id.to_string(),
            },
            listener,
        ));
    }

    /// Queue an ajax behavior. Behaviors fire on ajax cycles only,
    /// regardless of the resolved target.
    pub fn queue_behavior(&mut self, source: ControlId, source_id: &str, behavior: AjaxBehavior) {
        self.ajax_behaviors
            .push((source, source_id.to_string(), behavior));
    }

    /// Number of queued action listeners.
    pub fn listener_count(&self) -> usize {
        self.action_listeners.len()
    }

    /// Number of queued ajax behaviors.
    pub fn behavior_count(&self) -> usize {
        self.ajax_behaviors.len()
    }

    /// Fire all queued action listeners, in order, consuming the queue.
    ///
    /// [`Outcome::StopCycle`] from a listener does not abort the phase:
    /// every already-queued listener still runs, and the folded outcome
    /// reports the stop so the coordinator skips the next phases.
    /// [`Outcome::StopPhase`] drops the remaining entries of this phase
    /// without touching the continuation flag.
    pub fn fire_action_listeners(&mut self) -> EngineResult<Outcome> {
        let queued = std::mem::take(&mut self.action_listeners);
        let mut folded = Outcome::Continue;
        for (cx, mut listener) in queued {
            let outcome = listener(&cx)
                .map_err(|err| EngineError::listener_failure("action listener", err))?;
            tracing::debug!(source = %cx.source_id, ?outcome, "action listener fired");
            if outcome.halts_phase() {
                break;
            }
            if outcome.halts_cycle() {
                folded = Outcome::StopCycle;
            }
        }
        Ok(folded)
    }

    /// Fire all queued ajax behaviors, in order, consuming the queue, and
    /// merge their partial results.
    pub fn fire_behaviors(&mut self, target_id: Option<&str>) -> EngineResult<PartialResult> {
        let queued = std::mem::take(&mut self.ajax_behaviors);
        let mut merged = PartialResult::new();
        for (source, source_id, mut behavior) in queued {
            let event = AjaxEvent {
                source,
                source_id,
                target_id: target_id.map(String::from),
            };
            let partial = behavior(&event)
                .map_err(|err| EngineError::listener_failure("ajax behavior", err))?;
            merged.merge(partial);
        }
        Ok(merged)
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("action_listeners", &self.action_listeners.len())
            .field("ajax_behaviors", &self.ajax_behaviors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_listener(
        log: &Rc<RefCell<Vec<&'static str>>>,
        name: &'static str,
        outcome: Outcome,
    ) -> ActionListener {
        let log = log.clone();
        Box::new(move |_| {
            log.borrow_mut().push(name);
            Ok(outcome)
        })
    }

    // === Listener Ordering Tests ===

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = ActionDispatcher::new();
        for name in ["a", "b", "c"] {
            dispatcher.queue_listener(
                ControlId::from_index(0),
                name,
                recording_listener(&log, name, Outcome::Continue),
            );
        }

        let folded = dispatcher.fire_action_listeners().unwrap();

        assert_eq!(folded, Outcome::Continue);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_stop_cycle_still_finishes_current_phase() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.queue_listener(
            ControlId::from_index(0),
            "a",
            recording_listener(&log, "a", Outcome::Continue),
        );
        dispatcher.queue_listener(
            ControlId::from_index(1),
            "b",
            recording_listener(&log, "b", Outcome::StopCycle),
        );
        dispatcher.queue_listener(
            ControlId::from_index(2),
            "c",
            recording_listener(&log, "c", Outcome::Continue),
        );

        let folded = dispatcher.fire_action_listeners().unwrap();

        // b stops the cycle but c still fires: abort affects the next phase.
        assert_eq!(folded, Outcome::StopCycle);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_stop_phase_drops_remaining_listeners() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.queue_listener(
            ControlId::from_index(0),
            "a",
            recording_listener(&log, "a", Outcome::StopPhase),
        );
        dispatcher.queue_listener(
            ControlId::from_index(1),
            "b",
            recording_listener(&log, "b", Outcome::Continue),
        );

        let folded = dispatcher.fire_action_listeners().unwrap();

        assert_eq!(folded, Outcome::Continue);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn test_listeners_consumed_exactly_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.queue_listener(
            ControlId::from_index(0),
            "a",
            recording_listener(&log, "a", Outcome::Continue),
        );

        dispatcher.fire_action_listeners().unwrap();
        dispatcher.fire_action_listeners().unwrap();

        assert_eq!(*log.borrow(), vec!["a"]);
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn test_listener_error_becomes_listener_failure() {
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.queue_listener(
            ControlId::from_index(0),
            "boom",
            Box::new(|_| Err(anyhow::anyhow!("exploded"))),
        );

        let err = dispatcher.fire_action_listeners().unwrap_err();
        assert!(matches!(err, EngineError::ListenerFailure { .. }));
    }

    // === Behavior Tests ===

    #[test]
    fn test_behaviors_merge_partials_in_order() {
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.queue_behavior(
            ControlId::from_index(0),
            "page_counter",
            Box::new(|_| Ok(PartialResult::new().with_section("counter", "7"))),
        );
        dispatcher.queue_behavior(
            ControlId::from_index(1),
            "page_clock",
            Box::new(|_| Ok(PartialResult::new().with_section("time", "12:00"))),
        );

        let merged = dispatcher.fire_behaviors(Some("page_clock")).unwrap();

        let names: Vec<&str> = merged.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["counter", "time"]);
    }

    #[test]
    fn test_behavior_event_carries_target_and_source() {
        let seen = Rc::new(RefCell::new(None));
        let mut dispatcher = ActionDispatcher::new();
        {
            let seen = seen.clone();
            dispatcher.queue_behavior(
                ControlId::from_index(4),
                "page_widget",
                Box::new(move |event| {
                    *seen.borrow_mut() =
                        Some((event.source_id.clone(), event.target_id.clone()));
                    Ok(PartialResult::new())
                }),
            );
        }

        dispatcher.fire_behaviors(Some("page_link")).unwrap();

        assert_eq!(
            *seen.borrow(),
            Some(("page_widget".to_string(), Some("page_link".to_string())))
        );
    }
}
