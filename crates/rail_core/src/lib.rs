//! `rail_core` — deterministic single-track train simulation.
//!
//! No IO, no network, no wall clock. Callers drive the simulation with
//! [`tick`] and read it back through [`SimulationState::snapshot`].

mod engine;
mod error;
mod line;
mod session;
mod snapshot;
mod state;
mod store;
mod train;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use engine::tick;
pub use error::{Result, SimError};
pub use line::Line;
pub use snapshot::{LineSnapshot, Snapshot, TrainSnapshot};
pub use session::{
    Dispatcher, DispatcherName, DispatcherSnapshot, SessionEvent, SessionSnapshot,
    TrainingSession, MAX_DISPATCHER_NAME_CHARS,
};
pub use state::SimulationState;
pub use store::{
    InMemorySimulationStore, InMemoryTrainingSessionStore, SimulationRepository,
    TrainingSessionRepository,
};
pub use train::{Motion, Train, BOUNDARY_EPSILON};
pub use types::*;

#[cfg(test)]
mod tests;
