//! Type definitions for `rail_core`.
//!
//! Identifier newtypes, validated value objects, and the plain-data topology
//! definitions consumed by [`crate::Line`] and [`crate::SimulationState`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident, $empty:ident) => {
        /// Trimmed, non-empty identifier. Clones share one allocation.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl AsRef<str>) -> Result<Self> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(SimError::$empty);
                }
                Ok(Self(Arc::from(trimmed)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = SimError;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(StationId, StationIdEmpty);
string_id!(BlockId, BlockIdEmpty);
string_id!(TrainId, TrainIdEmpty);
string_id!(SessionId, SessionIdEmpty);
string_id!(DispatcherId, DispatcherIdEmpty);

// ---------------------------------------------------------------------------
// Value objects
// ---------------------------------------------------------------------------

/// Position inside the current block, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BlockProgress(f64);

impl BlockProgress {
    pub const START: Self = Self(0.0);
    pub const END: Self = Self(1.0);

    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(SimError::BlockProgressOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for BlockProgress {
    type Error = SimError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<BlockProgress> for f64 {
    fn from(progress: BlockProgress) -> Self {
        progress.0
    }
}

/// Largest delta accepted, in milliseconds. Keeps the delta representable as
/// signed nanoseconds.
pub const MAX_TICK_MILLIS: i64 = i64::MAX / 1_000_000;

/// Simulated time elapsed by one tick. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickDelta(Duration);

impl TickDelta {
    pub fn new(duration: Duration) -> Result<Self> {
        if duration.is_zero() {
            return Err(SimError::TickDeltaNotPositive);
        }
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        if millis > MAX_TICK_MILLIS {
            return Err(SimError::TickDeltaOverflow { millis });
        }
        Ok(Self(duration))
    }

    pub fn from_millis(millis: i64) -> Result<Self> {
        if millis <= 0 {
            return Err(SimError::TickDeltaNotPositive);
        }
        if millis > MAX_TICK_MILLIS {
            return Err(SimError::TickDeltaOverflow { millis });
        }
        // Bounded above, so the sign cast is lossless.
        Ok(Self(Duration::from_millis(millis.unsigned_abs())))
    }

    pub fn duration(self) -> Duration {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Whole milliseconds; sub-millisecond remainders do not advance the clock.
    pub fn as_millis(self) -> u64 {
        // `new` and `from_millis` both cap at `MAX_TICK_MILLIS`.
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Monotonic simulation clock in integer milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn millis(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, dt: TickDelta) -> Result<Self> {
        self.0
            .checked_add(dt.as_millis())
            .map(Self)
            .ok_or(SimError::ClockOverflow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn from_forward(forward: bool) -> Self {
        if forward {
            Self::Forward
        } else {
            Self::Backward
        }
    }

    pub fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Notable things that happened to a train during one tick, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    TurnbackCompleted { train_id: TrainId, forward: bool },
    #[serde(rename_all = "camelCase")]
    BlockEntered {
        train_id: TrainId,
        from_block_id: BlockId,
        block_id: BlockId,
    },
    #[serde(rename_all = "camelCase")]
    TerminusReached { train_id: TrainId, block_id: BlockId },
    #[serde(rename_all = "camelCase")]
    HeldByOccupancy {
        train_id: TrainId,
        block_id: BlockId,
        occupied_by: TrainId,
    },
}

// ---------------------------------------------------------------------------
// Topology definitions (exchange format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationDef {
    pub id: StationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDef {
    pub id: BlockId,
    pub from_station_id: StationId,
    pub to_station_id: StationId,
}

/// Initial placement of a train, as written in a topology file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainDef {
    pub id: TrainId,
    pub block_id: BlockId,
    #[serde(default)]
    pub progress: f64,
    #[serde(default = "default_forward")]
    pub forward: bool,
    pub speed: f64,
}

fn default_forward() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineDef {
    pub stations: Vec<StationDef>,
    pub blocks: Vec<BlockDef>,
    /// Seed trains. Empty means the caller picks a default.
    #[serde(default)]
    pub trains: Vec<TrainDef>,
}
