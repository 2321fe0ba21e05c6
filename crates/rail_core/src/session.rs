//! Dispatcher training sessions.
//!
//! A [`TrainingSession`] tracks which dispatchers have joined and records a
//! [`SessionEvent`] for every join and leave until the caller drains them
//! with [`TrainingSession::pull_events`]. Timestamps are supplied by the
//! caller; this module never reads a clock.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::{DispatcherId, SessionId};

/// Longest accepted display name, counted in characters.
pub const MAX_DISPATCHER_NAME_CHARS: usize = 32;

/// Trimmed, non-empty display name of at most [`MAX_DISPATCHER_NAME_CHARS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DispatcherName(String);

impl DispatcherName {
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SimError::DispatcherNameEmpty);
        }
        let chars = trimmed.chars().count();
        if chars > MAX_DISPATCHER_NAME_CHARS {
            return Err(SimError::DispatcherNameTooLong {
                chars,
                max: MAX_DISPATCHER_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DispatcherName {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DispatcherName> for String {
    fn from(name: DispatcherName) -> Self {
        name.0
    }
}

impl std::fmt::Display for DispatcherName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatcher {
    id: DispatcherId,
    name: DispatcherName,
    joined_at: DateTime<Utc>,
}

impl Dispatcher {
    pub fn id(&self) -> &DispatcherId {
        &self.id
    }

    pub fn name(&self) -> &DispatcherName {
        &self.name
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    #[serde(rename_all = "camelCase")]
    DispatcherJoined {
        at: DateTime<Utc>,
        dispatcher_id: DispatcherId,
        name: DispatcherName,
    },
    #[serde(rename_all = "camelCase")]
    DispatcherLeft {
        at: DateTime<Utc>,
        dispatcher_id: DispatcherId,
    },
}

impl SessionEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::DispatcherJoined { at, .. } | Self::DispatcherLeft { at, .. } => *at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingSession {
    id: SessionId,
    last_active_at: DateTime<Utc>,
    dispatchers: BTreeMap<DispatcherId, Dispatcher>,
    events: Vec<SessionEvent>,
}

impl TrainingSession {
    pub fn new(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            last_active_at: now,
            dispatchers: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    /// Dispatchers in ascending id order.
    pub fn dispatchers(&self) -> impl ExactSizeIterator<Item = &Dispatcher> {
        self.dispatchers.values()
    }

    pub fn dispatcher(&self, id: &DispatcherId) -> Option<&Dispatcher> {
        self.dispatchers.get(id)
    }

    /// Fails with [`SimError::DispatcherAlreadyExists`] if the id is taken;
    /// the session is left unchanged in that case.
    pub fn join_dispatcher(
        &mut self,
        id: DispatcherId,
        name: DispatcherName,
        now: DateTime<Utc>,
    ) -> Result<&Dispatcher> {
        if self.dispatchers.contains_key(&id) {
            return Err(SimError::DispatcherAlreadyExists(id));
        }
        self.last_active_at = now;
        self.events.push(SessionEvent::DispatcherJoined {
            at: now,
            dispatcher_id: id.clone(),
            name: name.clone(),
        });
        tracing::debug!(session = %self.id, dispatcher = %id, "dispatcher joined");
        Ok(self.dispatchers.entry(id.clone()).or_insert(Dispatcher {
            id,
            name,
            joined_at: now,
        }))
    }

    pub fn leave_dispatcher(&mut self, id: &DispatcherId, now: DateTime<Utc>) -> Result<()> {
        if self.dispatchers.remove(id).is_none() {
            return Err(SimError::DispatcherNotFound(id.clone()));
        }
        self.last_active_at = now;
        self.events.push(SessionEvent::DispatcherLeft {
            at: now,
            dispatcher_id: id.clone(),
        });
        tracing::debug!(session = %self.id, dispatcher = %id, "dispatcher left");
        Ok(())
    }

    /// Drains the events recorded since the previous call, oldest first.
    pub fn pull_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.to_string(),
            dispatchers: self
                .dispatchers()
                .map(|d| DispatcherSnapshot {
                    id: d.id.to_string(),
                    name: d.name.to_string(),
                    joined_at: d.joined_at,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub dispatchers: Vec<DispatcherSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatcherSnapshot {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}
