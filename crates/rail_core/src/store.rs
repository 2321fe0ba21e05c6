use ahash::AHashMap;

use crate::error::{Result, SimError};
use crate::{SessionId, SimulationState, TrainingSession};

/// Storage boundary for simulations, keyed by session.
///
/// The store owns each [`SimulationState`]; callers borrow through it. It does
/// no locking of its own: whoever holds the store is the single point that
/// serializes ticks and reads.
pub trait SimulationRepository {
    fn get(&self, session: &SessionId) -> Result<&SimulationState>;

    fn get_mut(&mut self, session: &SessionId) -> Result<&mut SimulationState>;

    /// Fails with [`SimError::SimulationAlreadyExists`] if the session is taken.
    fn create(&mut self, session: SessionId, state: SimulationState) -> Result<()>;

    /// Replaces an existing simulation.
    fn save(&mut self, session: &SessionId, state: SimulationState) -> Result<()>;

    fn contains(&self, session: &SessionId) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemorySimulationStore {
    sessions: AHashMap<SessionId, SimulationState>,
}

impl InMemorySimulationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SimulationRepository for InMemorySimulationStore {
    fn get(&self, session: &SessionId) -> Result<&SimulationState> {
        self.sessions
            .get(session)
            .ok_or_else(|| SimError::SimulationNotFound(session.clone()))
    }

    fn get_mut(&mut self, session: &SessionId) -> Result<&mut SimulationState> {
        self.sessions
            .get_mut(session)
            .ok_or_else(|| SimError::SimulationNotFound(session.clone()))
    }

    fn create(&mut self, session: SessionId, state: SimulationState) -> Result<()> {
        if self.sessions.contains_key(&session) {
            return Err(SimError::SimulationAlreadyExists(session));
        }
        self.sessions.insert(session, state);
        Ok(())
    }

    fn save(&mut self, session: &SessionId, state: SimulationState) -> Result<()> {
        let slot = self.get_mut(session)?;
        *slot = state;
        Ok(())
    }

    fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }
}

/// Storage boundary for dispatcher training sessions.
pub trait TrainingSessionRepository {
    fn get(&self, session: &SessionId) -> Result<&TrainingSession>;

    fn get_mut(&mut self, session: &SessionId) -> Result<&mut TrainingSession>;

    fn create(&mut self, session: TrainingSession) -> Result<()>;

    fn contains(&self, session: &SessionId) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryTrainingSessionStore {
    sessions: AHashMap<SessionId, TrainingSession>,
}

impl InMemoryTrainingSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainingSessionRepository for InMemoryTrainingSessionStore {
    fn get(&self, session: &SessionId) -> Result<&TrainingSession> {
        self.sessions
            .get(session)
            .ok_or_else(|| SimError::TrainingSessionNotFound(session.clone()))
    }

    fn get_mut(&mut self, session: &SessionId) -> Result<&mut TrainingSession> {
        self.sessions
            .get_mut(session)
            .ok_or_else(|| SimError::TrainingSessionNotFound(session.clone()))
    }

    fn create(&mut self, session: TrainingSession) -> Result<()> {
        if self.sessions.contains_key(session.id()) {
            return Err(SimError::TrainingSessionAlreadyExists(session.id().clone()));
        }
        self.sessions.insert(session.id().clone(), session);
        Ok(())
    }

    fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }
}
