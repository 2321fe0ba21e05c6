use super::*;

#[test]
fn moves_inside_block() {
    let mut state = state_with(vec![train("T0", "B0", 0.0, true, 0.5)]);
    let events = state.tick(millis(1000)).unwrap();

    let t0 = get(&state, "T0");
    assert_eq!(t0.block_id(), &bid("B0"));
    assert_close(t0.progress().value(), 0.5);
    assert!(events.is_empty());
    assert_eq!(state.sim_time().millis(), 1000);
}

#[test]
fn crosses_block_boundary() {
    let mut state = state_with(vec![train("T0", "B0", 0.0, true, 0.5)]);
    let events = state.tick(millis(3000)).unwrap();

    let t0 = get(&state, "T0");
    assert_eq!(t0.block_id(), &bid("B1"));
    assert_close(t0.progress().value(), 0.5);
    assert_eq!(state.occupant(&bid("B1")), Some(&tid("T0")));
    assert_eq!(state.occupant(&bid("B0")), None);
    assert_eq!(
        events,
        vec![Event::BlockEntered {
            train_id: tid("T0"),
            from_block_id: bid("B0"),
            block_id: bid("B1"),
        }]
    );
}

#[test]
fn landing_exactly_on_boundary_enters_next_block() {
    let mut state = state_with(vec![train("T0", "B0", 0.0, true, 0.5)]);
    state.tick(millis(2000)).unwrap();

    let t0 = get(&state, "T0");
    assert_eq!(t0.block_id(), &bid("B1"));
    assert_eq!(t0.progress(), BlockProgress::START);
}

#[test]
fn moves_backward() {
    let mut state = state_with(vec![train("T0", "B1", 0.5, false, 0.25)]);
    state.tick(millis(1000)).unwrap();
    assert_close(get(&state, "T0").progress().value(), 0.25);

    state.tick(millis(2000)).unwrap();
    let t0 = get(&state, "T0");
    assert_eq!(t0.block_id(), &bid("B0"));
    assert_close(t0.progress().value(), 0.75);
}

#[test]
fn single_tick_traverses_several_short_blocks() {
    let mut state = state_on_line(5, vec![train("T0", "B0", 0.5, true, 1.0)]);
    let events = state.tick(millis(3000)).unwrap();

    let t0 = get(&state, "T0");
    assert_eq!(t0.block_id(), &bid("B3"));
    assert_close(t0.progress().value(), 0.5);
    assert_eq!(events.len(), 3);
    state.check_invariants().unwrap();
}

#[test]
fn clock_accumulates_deltas() {
    let mut state = state_with(vec![]);
    state.tick(millis(250)).unwrap();
    state.tick(millis(750)).unwrap();
    assert_eq!(state.sim_time().millis(), 1000);
}

#[test]
fn sub_millisecond_delta_moves_trains_without_advancing_clock() {
    let mut state = state_with(vec![train("T0", "B0", 0.0, true, 1.0)]);
    let dt = TickDelta::new(std::time::Duration::from_micros(500)).unwrap();
    state.tick(dt).unwrap();
    assert_eq!(state.sim_time().millis(), 0);
    assert_close(get(&state, "T0").progress().value(), 0.0005);
}
