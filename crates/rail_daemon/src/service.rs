use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use rail_core::{
    Event, InMemorySimulationStore, Line, LineDef, SessionId, SimError, SimulationRepository,
    SimulationState, Snapshot, TickDelta,
};
use serde::Serialize;

/// Source of the line topology used when a session is first touched.
pub trait LineLoader: Send + Sync {
    fn load(&self) -> anyhow::Result<LineDef>;
}

pub struct FileLineLoader {
    path: PathBuf,
}

impl FileLineLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LineLoader for FileLineLoader {
    fn load(&self) -> anyhow::Result<LineDef> {
        rail_world::load_line_def(&self.path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid tick delta: {0}")]
    InvalidTickDelta(#[source] SimError),
    #[error("invalid dispatcher id: {0}")]
    InvalidDispatcherId(#[source] SimError),
    #[error("invalid dispatcher name: {0}")]
    InvalidDispatcherName(#[source] SimError),
    #[error(transparent)]
    Simulation(#[from] SimError),
    #[error(transparent)]
    Setup(#[from] anyhow::Error),
}

/// Result of one tick, as published to stream subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickUpdate {
    pub events: Vec<Event>,
    pub snapshot: Snapshot,
}

/// Owns the simulation store. Every read and tick goes through the one mutex,
/// so at most one operation touches a `SimulationState` at a time.
pub struct SimulationService {
    store: Mutex<InMemorySimulationStore>,
    session: SessionId,
    loader: Box<dyn LineLoader>,
}

impl SimulationService {
    pub fn new(session: SessionId, loader: Box<dyn LineLoader>) -> Self {
        Self {
            store: Mutex::new(InMemorySimulationStore::new()),
            session,
            loader,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Snapshot of the session, creating it on first use.
    pub fn get_simulation(&self) -> Result<Snapshot, ServiceError> {
        let mut store = self.store.lock();
        let state = self.ensure_state(&mut store)?;
        Ok(state.snapshot())
    }

    pub fn tick(&self, delta_millis: i64) -> Result<TickUpdate, ServiceError> {
        let dt = TickDelta::from_millis(delta_millis).map_err(ServiceError::InvalidTickDelta)?;

        let mut store = self.store.lock();
        let state = self.ensure_state(&mut store)?;
        let events = state.tick(dt)?;
        Ok(TickUpdate {
            events,
            snapshot: state.snapshot(),
        })
    }

    /// Current clock, or `None` if the session has not been created yet.
    pub fn sim_time_millis(&self) -> Option<u64> {
        let store = self.store.lock();
        store
            .get(&self.session)
            .ok()
            .map(|state| state.sim_time().millis())
    }

    fn ensure_state<'a>(
        &self,
        store: &'a mut InMemorySimulationStore,
    ) -> Result<&'a mut SimulationState, ServiceError> {
        if !store.contains(&self.session) {
            let def = self.loader.load().context("line load failed")?;
            let line = Line::from_def(&def)?;
            let state = rail_world::build_initial_state(Arc::new(line), &def.trains)?;
            tracing::info!(session = %self.session, "simulation created");
            store.create(self.session.clone(), state)?;
        }
        Ok(store.get_mut(&self.session)?)
    }
}
