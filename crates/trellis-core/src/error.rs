//! Error types for the lifecycle engine.

use thiserror::Error;

/// Errors surfaced by the lifecycle engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The context stack was read with nothing pushed. Programming error,
    /// fatal, never retried.
    #[error("no active request context on this thread")]
    NoActiveContext,

    /// The ajax request carried a control id no registered control matches
    /// (stale client-side id). Recoverable; the cycle falls back to an
    /// empty partial result.
    #[error("ajax target not found: '{target}'")]
    AjaxTargetNotFound { target: String },

    /// A listener, behavior or lifecycle hook failed. DESTROY still runs
    /// and the context stack stays balanced before this propagates.
    #[error("listener failed during {phase}: {source}")]
    ListenerFailure {
        phase: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A control name collided with a sibling of the same parent.
    #[error("duplicate control name '{name}' under the same parent")]
    DuplicateControlName { name: String },

    /// Writing to the response sink failed.
    #[error("response write failed: {0}")]
    ResponseWrite(String),
}

impl EngineError {
    /// Wrap a hook failure with the phase it occurred in.
    pub fn listener_failure(phase: &'static str, source: anyhow::Error) -> Self {
        Self::ListenerFailure { phase, source }
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::AjaxTargetNotFound {
            target: "form_save".to_string(),
        };
        assert_eq!(err.to_string(), "ajax target not found: 'form_save'");
    }

    #[test]
    fn test_listener_failure_keeps_source() {
        let err = EngineError::listener_failure("process", anyhow::anyhow!("db down"));
        assert!(err.to_string().contains("process"));
        assert!(err.to_string().contains("db down"));
    }
}
