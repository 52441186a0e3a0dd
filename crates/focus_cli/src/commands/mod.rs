//! CLI command implementations.

pub mod goal;
pub mod idea;
pub mod plan;
pub mod project;
pub mod stats;
pub mod sync;
pub mod task;
pub mod timer;
