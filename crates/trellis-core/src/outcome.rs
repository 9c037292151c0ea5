//! Propagation outcome for lifecycle hooks and listeners.

/// Result of a `process` hook or a fired listener.
///
/// Replaces an implicit AND of booleans so "stop the current phase" and
/// "stop the whole cycle" stay distinct:
///
/// - in the PROCESS tree walk, [`Outcome::StopCycle`] halts traversal
///   immediately and clears the continuation flag, while
///   [`Outcome::StopPhase`] prunes the current subtree but keeps walking;
/// - in listener firing, the already-queued phase always runs to completion
///   on [`Outcome::StopCycle`] (abort affects the next phase only), while
///   [`Outcome::StopPhase`] drops the remaining entries of the current
///   phase without clearing continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Keep going.
    #[default]
    Continue,
    /// Stop the current phase; later phases still run.
    StopPhase,
    /// Let the current phase finish, then skip the render/template path.
    StopCycle,
}

impl Outcome {
    /// Check whether this outcome clears the cycle continuation flag.
    pub fn halts_cycle(&self) -> bool {
        matches!(self, Self::StopCycle)
    }

    /// Check whether this outcome ends the current phase early.
    pub fn halts_phase(&self) -> bool {
        matches!(self, Self::StopPhase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(!Outcome::Continue.halts_cycle());
        assert!(!Outcome::Continue.halts_phase());
        assert!(Outcome::StopCycle.halts_cycle());
        assert!(!Outcome::StopCycle.halts_phase());
        assert!(Outcome::StopPhase.halts_phase());
        assert!(!Outcome::StopPhase.halts_cycle());
    }
}
