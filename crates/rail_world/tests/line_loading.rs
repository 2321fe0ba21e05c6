//! Loader tests: the shipped `content/line.json` plus hand-written fixtures.

use std::path::PathBuf;

use rail_world::{load_initial_state, load_line, load_line_def, DEFAULT_TRAIN_ID};

/// Integration tests run from the crate directory, so go up two levels.
fn content_line() -> PathBuf {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    PathBuf::from(manifest).join("../../content/line.json")
}

fn write_fixture(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("line.json");
    std::fs::write(&path, content).expect("write fixture");
    path
}

// =========================================================================
// Shipped content
// =========================================================================

#[test]
fn shipped_line_loads() {
    let line = load_line(content_line()).unwrap();
    assert!(line.block_count() >= 1);
    assert_eq!(line.stations().len(), line.block_count() + 1);
}

#[test]
fn shipped_line_seeds_default_train() {
    let state = load_initial_state(content_line()).unwrap();
    let snapshot = state.snapshot();
    assert_eq!(snapshot.sim_time_millis, 0);
    assert_eq!(snapshot.trains.len(), 1);
    assert_eq!(snapshot.trains[0].id, DEFAULT_TRAIN_ID);
    assert_eq!(snapshot.trains[0].block_id, snapshot.line.blocks[0]);
}

// =========================================================================
// Fixtures
// =========================================================================

#[test]
fn valid_line_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        r#"{
  "stations":[{"id":"S0"},{"id":"S1"},{"id":"S2"}],
  "blocks":[
    {"id":"B0","fromStationId":"S0","toStationId":"S1"},
    {"id":"B1","fromStationId":"S1","toStationId":"S2"}
  ]
}"#,
    );
    let line = load_line(&path).unwrap();
    assert_eq!(line.stations().len(), 3);
    assert_eq!(line.block_count(), 2);
}

#[test]
fn padded_ids_are_trimmed_before_adjacency_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        r#"{
  "stations":[{"id":"S0"},{"id":"S1"}],
  "blocks":[{"id":"B0","fromStationId":" S0 ","toStationId":"S1 "}]
}"#,
    );
    assert!(load_line(&path).is_ok());
}

#[test]
fn broken_connectivity_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        r#"{
  "stations":[{"id":"S0"},{"id":"S1"},{"id":"S2"}],
  "blocks":[
    {"id":"B0","fromStationId":"S0","toStationId":"S2"},
    {"id":"B1","fromStationId":"S1","toStationId":"S2"}
  ]
}"#,
    );
    let err = load_line(&path).unwrap_err();
    assert!(format!("{err:#}").contains("connectivity"), "got: {err:#}");
}

#[test]
fn empty_id_is_rejected_at_parse() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        r#"{"stations":[{"id":" "},{"id":"S1"}],"blocks":[{"id":"B0","fromStationId":"S0","toStationId":"S1"}]}"#,
    );
    let err = load_line_def(&path).unwrap_err();
    assert!(format!("{err:#}").contains("station id is empty"), "got: {err:#}");
}

#[test]
fn malformed_json_is_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "{ not json");
    let err = load_line(&path).unwrap_err();
    assert!(format!("{err}").contains("parsing line file"));
}

#[test]
fn missing_file_is_reported() {
    let err = load_line("/nonexistent/line.json").unwrap_err();
    assert!(format!("{err}").contains("reading line file"));
}

#[test]
fn seed_trains_are_placed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        r#"{
  "stations":[{"id":"S0"},{"id":"S1"},{"id":"S2"}],
  "blocks":[
    {"id":"B0","fromStationId":"S0","toStationId":"S1"},
    {"id":"B1","fromStationId":"S1","toStationId":"S2"}
  ],
  "trains":[{"id":"X1","blockId":"B1","progress":0.5,"forward":false,"speed":1.5}]
}"#,
    );
    let snapshot = load_initial_state(&path).unwrap().snapshot();
    assert_eq!(snapshot.trains.len(), 1);
    assert_eq!(snapshot.trains[0].id, "X1");
    assert!(!snapshot.trains[0].forward);
}

#[test]
fn seed_train_on_unknown_block_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        r#"{
  "stations":[{"id":"S0"},{"id":"S1"}],
  "blocks":[{"id":"B0","fromStationId":"S0","toStationId":"S1"}],
  "trains":[{"id":"X1","blockId":"B5","speed":1.0}]
}"#,
    );
    let err = load_initial_state(&path).unwrap_err();
    assert!(format!("{err:#}").contains("B5"), "got: {err:#}");
}
