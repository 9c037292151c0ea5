//! Control tree primitives for the Trellis lifecycle engine.
//!
//! This crate provides:
//! - `ControlArena` / `ControlId` - arena-owned component tree
//! - `Control` trait - lifecycle hooks and head-resource contributions
//! - `ControlCx` / `Registrar` - per-cycle registration seams
//! - `HeadResource` / `HeadAggregator` - script/style dedup and ordering
//! - `PartialResult` - the ajax-cycle response value

mod arena;
mod control;
mod head;
mod partial;

pub use arena::*;
pub use control::*;
pub use head::*;
pub use partial::*;
