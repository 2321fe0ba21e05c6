use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{Result, SimError};
use crate::{BlockId, Line, SimTime, Train, TrainId};

/// Aggregate root of one running simulation.
///
/// Invariants, upheld by [`SimulationState::add_train`] and [`crate::tick`]:
/// every block holds at most one train, and `occupied[train.block_id()]`
/// names that train for every train with no stray entries.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) line: Arc<Line>,
    pub(crate) sim_time: SimTime,
    /// Ordered by id so both tick phases iterate deterministically.
    pub(crate) trains: BTreeMap<TrainId, Train>,
    pub(crate) occupied: AHashMap<BlockId, TrainId>,
}

impl SimulationState {
    pub fn new(line: Arc<Line>) -> Self {
        Self {
            line,
            sim_time: SimTime::ZERO,
            trains: BTreeMap::new(),
            occupied: AHashMap::new(),
        }
    }

    pub fn line(&self) -> &Arc<Line> {
        &self.line
    }

    pub fn sim_time(&self) -> SimTime {
        self.sim_time
    }

    /// Trains in ascending id order.
    pub fn trains(&self) -> impl ExactSizeIterator<Item = &Train> {
        self.trains.values()
    }

    pub fn train(&self, id: &TrainId) -> Result<&Train> {
        self.trains
            .get(id)
            .ok_or_else(|| SimError::TrainNotFound(id.clone()))
    }

    pub fn train_count(&self) -> usize {
        self.trains.len()
    }

    pub fn occupant(&self, block: &BlockId) -> Option<&TrainId> {
        self.occupied.get(block)
    }

    pub fn add_train(&mut self, train: Train) -> Result<()> {
        if self.trains.contains_key(train.id()) {
            return Err(SimError::TrainAlreadyExists(train.id().clone()));
        }
        if !self.line.has_block(train.block_id()) {
            return Err(SimError::BlockNotFound(train.block_id().clone()));
        }
        if let Some(by) = self.occupied.get(train.block_id()) {
            return Err(SimError::BlockOccupied {
                block: train.block_id().clone(),
                by: by.clone(),
            });
        }

        tracing::debug!(train = %train.id(), block = %train.block_id(), "train added");
        self.occupied
            .insert(train.block_id().clone(), train.id().clone());
        self.trains.insert(train.id().clone(), train);
        Ok(())
    }

    /// Checks the occupancy invariants, returning a description of the first
    /// violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for train in self.trains.values() {
            if !self.line.has_block(train.block_id()) {
                return Err(format!(
                    "train {} sits on unknown block {}",
                    train.id(),
                    train.block_id()
                ));
            }
            match self.occupied.get(train.block_id()) {
                Some(owner) if owner == train.id() => {}
                other => {
                    return Err(format!(
                        "block {} should be held by {} but index says {:?}",
                        train.block_id(),
                        train.id(),
                        other.map(TrainId::as_str)
                    ))
                }
            }
        }
        if self.occupied.len() != self.trains.len() {
            return Err(format!(
                "{} occupancy entries for {} trains",
                self.occupied.len(),
                self.trains.len()
            ));
        }
        Ok(())
    }
}
