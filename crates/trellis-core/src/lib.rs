//! Core abstractions for the Trellis control-tree lifecycle engine.
//!
//! This crate provides the fundamental types:
//! - `RequestContext` / `ContextStack` - per-cycle context with a
//!   thread-bound stack and scoped pop guard
//! - `ResponseSink` - reply channel seam to the transport collaborator
//! - `Outcome` - propagation control for hooks and listeners
//! - `EngineError` - error taxonomy
//! - `EngineConfig` - engine configuration

mod config;
mod context;
mod error;
mod outcome;
mod response;

pub use config::*;
pub use context::*;
pub use error::*;
pub use outcome::*;
pub use response::*;
