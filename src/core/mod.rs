// src/core/mod.rs — Loop controller, digest builder, run state

pub mod controller;
pub mod digest;
pub mod state;

pub use controller::{LoopConfig, LoopController, RunOutcome};
pub use state::{Position, RunState, RunStatus};
