mod actions;
mod classify;
mod dom;
mod engine;
mod state;
mod wait;

pub use classify::{classify, Page};
pub use engine::{CycleOutcome, Engine, StopReason};
pub use state::{RunState, StateStore};
pub use wait::await_condition;
