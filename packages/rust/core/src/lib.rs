//! Pipeline orchestration for pathweaver.
//!
//! Wires acquisition, filtering, and assembly into a single [`Pipeline`],
//! and runs pipelines in the background through the [`Orchestrator`].

pub mod pipeline;
pub mod tasks;

pub use pipeline::{GenerateParams, Pipeline, ProgressSink, SilentSink};
pub use tasks::{Orchestrator, TaskRegistry};
