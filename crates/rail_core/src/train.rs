use crate::error::{Result, SimError};
use crate::{BlockId, BlockProgress, Direction, TrainDef, TrainId};

/// Tolerance for boundary comparisons on progress and travel distance.
pub const BOUNDARY_EPSILON: f64 = 1e-9;

/// Per-train motion state.
///
/// A train that runs into a terminus parks as `AwaitingReversal`, still facing
/// the way it came. The next tick starts by flipping it to `Moving` in the
/// opposite direction, so reversal always lands one tick after arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Moving(Direction),
    AwaitingReversal(Direction),
}

impl Motion {
    pub fn direction(self) -> Direction {
        match self {
            Self::Moving(direction) | Self::AwaitingReversal(direction) => direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Train {
    id: TrainId,
    block_id: BlockId,
    progress: BlockProgress,
    motion: Motion,
    speed: f64,
}

impl Train {
    /// `speed` is in block lengths per simulated second.
    pub fn new(
        id: TrainId,
        block_id: BlockId,
        progress: BlockProgress,
        direction: Direction,
        speed: f64,
    ) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SimError::TrainSpeedNotPositive(speed));
        }
        Ok(Self {
            id,
            block_id,
            progress,
            motion: Motion::Moving(direction),
            speed,
        })
    }

    pub fn from_def(def: &TrainDef) -> Result<Self> {
        Self::new(
            def.id.clone(),
            def.block_id.clone(),
            BlockProgress::new(def.progress)?,
            Direction::from_forward(def.forward),
            def.speed,
        )
    }

    pub fn id(&self) -> &TrainId {
        &self.id
    }

    pub fn block_id(&self) -> &BlockId {
        &self.block_id
    }

    pub fn progress(&self) -> BlockProgress {
        self.progress
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn direction(&self) -> Direction {
        self.motion.direction()
    }

    pub fn forward(&self) -> bool {
        self.direction().is_forward()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn pending_turnback(&self) -> bool {
        matches!(self.motion, Motion::AwaitingReversal(_))
    }

    /// Room left before the exit edge in the current direction. Slivers under
    /// [`BOUNDARY_EPSILON`] count as zero.
    pub(crate) fn remaining_in_block(&self) -> f64 {
        let remaining = match self.direction() {
            Direction::Forward => 1.0 - self.progress.value(),
            Direction::Backward => self.progress.value(),
        };
        if remaining < BOUNDARY_EPSILON {
            0.0
        } else {
            remaining
        }
    }

    /// Snaps values within [`BOUNDARY_EPSILON`] of either edge onto the edge,
    /// then validates the range.
    pub(crate) fn set_progress(&mut self, value: f64) -> Result<()> {
        let snapped = if value.abs() < BOUNDARY_EPSILON {
            0.0
        } else if (value - 1.0).abs() < BOUNDARY_EPSILON {
            1.0
        } else {
            value
        };
        self.progress = BlockProgress::new(snapped)?;
        Ok(())
    }

    /// Moves `distance` along the current block without crossing its edge.
    pub(crate) fn advance_within_block(&mut self, distance: f64) -> Result<()> {
        let next = match self.direction() {
            Direction::Forward => self.progress.value() + distance,
            Direction::Backward => self.progress.value() - distance,
        };
        self.set_progress(next)
    }

    pub(crate) fn clamp_to_exit(&mut self) {
        self.progress = match self.direction() {
            Direction::Forward => BlockProgress::END,
            Direction::Backward => BlockProgress::START,
        };
    }

    pub(crate) fn enter_block(&mut self, block_id: BlockId) {
        self.block_id = block_id;
        self.progress = match self.direction() {
            Direction::Forward => BlockProgress::START,
            Direction::Backward => BlockProgress::END,
        };
    }

    pub(crate) fn await_reversal(&mut self) {
        self.motion = Motion::AwaitingReversal(self.direction());
    }

    /// Completes a pending turnback. Returns whether the train reversed.
    pub(crate) fn resolve_turnback(&mut self) -> bool {
        match self.motion {
            Motion::AwaitingReversal(direction) => {
                self.motion = Motion::Moving(direction.reversed());
                true
            }
            Motion::Moving(_) => false,
        }
    }
}
