//! Shared test fixtures for rail_core and downstream crates.
//!
//! `two_block_state()` is the S0-B0-S1-B1-S2 line used by most engine tests.
//! `line_with_blocks(n)` builds longer lines, and `random_state()` seeds a
//! randomized layout for invariant sweeps.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    BlockId, BlockProgress, Direction, Line, SimulationState, StationId, TickDelta, Train, TrainId,
};

pub fn bid(id: &str) -> BlockId {
    BlockId::new(id).unwrap()
}

pub fn tid(id: &str) -> TrainId {
    TrainId::new(id).unwrap()
}

pub fn millis(ms: i64) -> TickDelta {
    TickDelta::from_millis(ms).unwrap()
}

/// Line `S0..Sn` with blocks `B0..B(n-1)`.
pub fn line_with_blocks(blocks: usize) -> Arc<Line> {
    let stations = (0..=blocks)
        .map(|i| StationId::new(format!("S{i}")).unwrap())
        .collect();
    let blocks = (0..blocks).map(|i| bid(&format!("B{i}"))).collect();
    Arc::new(Line::new(stations, blocks).unwrap())
}

pub fn two_block_state() -> SimulationState {
    SimulationState::new(line_with_blocks(2))
}

pub fn train(id: &str, block: &str, progress: f64, forward: bool, speed: f64) -> Train {
    Train::new(
        tid(id),
        bid(block),
        BlockProgress::new(progress).unwrap(),
        Direction::from_forward(forward),
        speed,
    )
    .unwrap()
}

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// A line of `blocks` blocks with up to `trains` trains on distinct random
/// blocks, random progress, direction, and speed.
pub fn random_state(rng: &mut impl Rng, blocks: usize, trains: usize) -> SimulationState {
    let mut state = SimulationState::new(line_with_blocks(blocks));
    let mut slots: Vec<usize> = (0..blocks).collect();
    slots.shuffle(rng);
    for (n, slot) in slots.into_iter().take(trains).enumerate() {
        let t = train(
            &format!("T{n}"),
            &format!("B{slot}"),
            rng.gen_range(0.0..=1.0),
            rng.gen_bool(0.5),
            rng.gen_range(0.05..3.0),
        );
        state.add_train(t).unwrap();
    }
    state
}
