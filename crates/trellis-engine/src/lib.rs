//! Lifecycle engine: coordinator, phase drivers, per-cycle registry,
//! listener dispatch, and the partial-result writer.
//!
//! The [`LifecycleCoordinator`] drives a page's control tree through the
//! fixed phase sequence; everything else in this crate is a per-cycle
//! collaborator it creates and discards.

mod coordinator;
mod dispatcher;
pub mod phases;
mod registry;
mod writer;

pub use coordinator::*;
pub use dispatcher::*;
pub use registry::*;
pub use writer::*;
