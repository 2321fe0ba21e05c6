//! Line topology loading and initial-state construction shared between
//! rail_cli and rail_daemon.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rail_core::{
    BlockProgress, Direction, Line, LineDef, SimulationState, Train, TrainDef, TrainId,
};

/// Default location of the line fixture, relative to the workspace root.
pub const DEFAULT_LINE_PATH: &str = "./content/line.json";

/// Id, direction, and speed of the train placed on an otherwise empty line.
pub const DEFAULT_TRAIN_ID: &str = "T0";
pub const DEFAULT_TRAIN_SPEED: f64 = 0.5;

pub fn load_line_def(path: impl AsRef<Path>) -> Result<LineDef> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading line file: {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing line file: {}", path.display()))
}

/// Reads and validates a line file. Adjacency is checked before the `Line`
/// is built.
pub fn load_line(path: impl AsRef<Path>) -> Result<Arc<Line>> {
    let def = load_line_def(&path)?;
    let line = Line::from_def(&def)
        .with_context(|| format!("validating line: {}", path.as_ref().display()))?;
    Ok(Arc::new(line))
}

/// Creates a fresh state on `line` and places `trains` on it, in order.
/// With no trains listed, seeds a single forward train on the first block.
pub fn build_initial_state(line: Arc<Line>, trains: &[TrainDef]) -> Result<SimulationState> {
    let mut state = SimulationState::new(line);

    if trains.is_empty() {
        let first = state
            .line()
            .block_at(0)
            .cloned()
            .context("line has no first block")?;
        let train = Train::new(
            TrainId::new(DEFAULT_TRAIN_ID)?,
            first,
            BlockProgress::START,
            Direction::Forward,
            DEFAULT_TRAIN_SPEED,
        )?;
        state.add_train(train)?;
    } else {
        for def in trains {
            let train =
                Train::from_def(def).with_context(|| format!("building train '{}'", def.id))?;
            state
                .add_train(train)
                .with_context(|| format!("placing train '{}'", def.id))?;
        }
    }

    tracing::info!(
        blocks = state.line().block_count(),
        trains = state.train_count(),
        "initial state built"
    );
    Ok(state)
}

/// Loads `path` and builds its initial state in one step.
pub fn load_initial_state(path: impl AsRef<Path>) -> Result<SimulationState> {
    let def = load_line_def(&path)?;
    let line = Line::from_def(&def)
        .with_context(|| format!("validating line: {}", path.as_ref().display()))?;
    build_initial_state(Arc::new(line), &def.trains)
}
