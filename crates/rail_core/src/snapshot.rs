//! Read-only view of a [`SimulationState`] for viewers.

use serde::{Deserialize, Serialize};

use crate::{SimulationState, Train};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub sim_time_millis: u64,
    pub line: LineSnapshot,
    pub trains: Vec<TrainSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub stations: Vec<String>,
    pub blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainSnapshot {
    pub id: String,
    pub block_id: String,
    pub progress: f64,
    pub forward: bool,
    pub speed: f64,
    pub pending_turnback: bool,
}

impl From<&Train> for TrainSnapshot {
    fn from(train: &Train) -> Self {
        Self {
            id: train.id().to_string(),
            block_id: train.block_id().to_string(),
            progress: train.progress().value(),
            forward: train.forward(),
            speed: train.speed(),
            pending_turnback: train.pending_turnback(),
        }
    }
}

impl SimulationState {
    /// Trains are listed in ascending id order.
    pub fn snapshot(&self) -> Snapshot {
        let line = self.line();
        Snapshot {
            sim_time_millis: self.sim_time().millis(),
            line: LineSnapshot {
                stations: line.stations().iter().map(ToString::to_string).collect(),
                blocks: line.blocks().iter().map(ToString::to_string).collect(),
            },
            trains: self.trains().map(TrainSnapshot::from).collect(),
        }
    }
}
