use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rail_core::{
    DispatcherId, DispatcherName, InMemoryTrainingSessionStore, SessionEvent, SessionId,
    SessionSnapshot, TrainingSession, TrainingSessionRepository,
};
use serde::Serialize;

use crate::service::ServiceError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOutput {
    pub dispatcher_id: String,
    pub snapshot: SessionSnapshot,
}

/// Dispatcher join/leave for the daemon's one training session. The session
/// is created on first use; every call goes through the same mutex.
pub struct TrainingService {
    store: Mutex<InMemoryTrainingSessionStore>,
    session: SessionId,
}

impl TrainingService {
    pub fn new(session: SessionId) -> Self {
        Self {
            store: Mutex::new(InMemoryTrainingSessionStore::new()),
            session,
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Result<SessionSnapshot, ServiceError> {
        let mut store = self.store.lock();
        Ok(self.ensure_session(&mut store, now)?.snapshot())
    }

    /// Returns the join result plus the events it produced.
    pub fn join(
        &self,
        dispatcher_id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(JoinOutput, Vec<SessionEvent>), ServiceError> {
        let id = DispatcherId::new(dispatcher_id).map_err(ServiceError::InvalidDispatcherId)?;
        let name = DispatcherName::new(name).map_err(ServiceError::InvalidDispatcherName)?;

        let mut store = self.store.lock();
        let session = self.ensure_session(&mut store, now)?;
        session.join_dispatcher(id.clone(), name, now)?;
        let output = JoinOutput {
            dispatcher_id: id.to_string(),
            snapshot: session.snapshot(),
        };
        Ok((output, session.pull_events()))
    }

    pub fn leave(
        &self,
        dispatcher_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionEvent>, ServiceError> {
        let id = DispatcherId::new(dispatcher_id).map_err(ServiceError::InvalidDispatcherId)?;

        let mut store = self.store.lock();
        let session = self.ensure_session(&mut store, now)?;
        session.leave_dispatcher(&id, now)?;
        Ok(session.pull_events())
    }

    fn ensure_session<'a>(
        &self,
        store: &'a mut InMemoryTrainingSessionStore,
        now: DateTime<Utc>,
    ) -> Result<&'a mut TrainingSession, ServiceError> {
        if !store.contains(&self.session) {
            store.create(TrainingSession::new(self.session.clone(), now))?;
            tracing::info!(session = %self.session, "training session created");
        }
        Ok(store.get_mut(&self.session)?)
    }
}
