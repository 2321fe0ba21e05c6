use super::*;
use crate::test_fixtures::{bid, line_with_blocks, millis, tid, train, two_block_state};

mod movement;

// --- Shared test helpers ------------------------------------------------

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn state_with(trains: Vec<Train>) -> SimulationState {
    let mut state = two_block_state();
    for t in trains {
        state.add_train(t).unwrap();
    }
    state
}

fn state_on_line(blocks: usize, trains: Vec<Train>) -> SimulationState {
    let mut state = SimulationState::new(line_with_blocks(blocks));
    for t in trains {
        state.add_train(t).unwrap();
    }
    state
}

fn get<'a>(state: &'a SimulationState, id: &str) -> &'a Train {
    state.train(&tid(id)).unwrap()
}
