use ahash::AHashMap;
use tracing::{debug, trace};

use crate::error::Result;
use crate::train::BOUNDARY_EPSILON;
use crate::{BlockId, Event, Line, SimulationState, TickDelta, Train, TrainId};

/// Advance the simulation by one tick of `dt`.
///
/// Order of operations:
/// 1. Advance the clock.
/// 2. Complete every pending turnback, in ascending train-id order.
/// 3. Move every train, in ascending train-id order. Each train runs to
///    completion (possibly across several blocks) before the next one starts,
///    so later trains see the occupancy left by earlier ones.
///
/// The tick is staged on copies of the clock, trains, and occupancy index and
/// committed only if every train moved without error; on failure the state is
/// left exactly as it was.
///
/// Returns the events produced this tick.
pub fn tick(state: &mut SimulationState, dt: TickDelta) -> Result<Vec<Event>> {
    let sim_time = state.sim_time.checked_add(dt)?;
    let mut trains = state.trains.clone();
    let mut occupied = state.occupied.clone();
    let mut events = Vec::new();

    for train in trains.values_mut() {
        if train.resolve_turnback() {
            debug!(train = %train.id(), forward = train.forward(), "turnback completed");
            events.push(Event::TurnbackCompleted {
                train_id: train.id().clone(),
                forward: train.forward(),
            });
        }
    }

    for train in trains.values_mut() {
        move_train(train, dt, &state.line, &mut occupied, &mut events)?;
    }

    state.sim_time = sim_time;
    state.trains = trains;
    state.occupied = occupied;
    Ok(events)
}

impl SimulationState {
    /// See [`tick`].
    pub fn tick(&mut self, dt: TickDelta) -> Result<Vec<Event>> {
        tick(self, dt)
    }
}

/// Spends `speed * dt` of travel on one train. Travel left over when the
/// train stops at a terminus or behind an occupied block is dropped.
fn move_train(
    train: &mut Train,
    dt: TickDelta,
    line: &Line,
    occupied: &mut AHashMap<BlockId, TrainId>,
    events: &mut Vec<Event>,
) -> Result<()> {
    let mut distance = train.speed() * dt.as_secs_f64();

    while distance > 0.0 {
        let remaining = train.remaining_in_block();
        if distance + BOUNDARY_EPSILON < remaining {
            train.advance_within_block(distance)?;
            return Ok(());
        }

        train.clamp_to_exit();
        distance -= remaining;
        if distance < BOUNDARY_EPSILON {
            distance = 0.0;
        }

        let Some(next) = line.next_block(train.block_id(), train.direction())? else {
            debug!(train = %train.id(), block = %train.block_id(), "terminus reached");
            train.await_reversal();
            events.push(Event::TerminusReached {
                train_id: train.id().clone(),
                block_id: train.block_id().clone(),
            });
            return Ok(());
        };

        if let Some(holder) = occupied.get(next) {
            if holder != train.id() {
                trace!(train = %train.id(), next = %next, holder = %holder, "held at block boundary");
                events.push(Event::HeldByOccupancy {
                    train_id: train.id().clone(),
                    block_id: train.block_id().clone(),
                    occupied_by: holder.clone(),
                });
                return Ok(());
            }
        }

        let from = train.block_id().clone();
        occupied.remove(&from);
        occupied.insert(next.clone(), train.id().clone());
        train.enter_block(next.clone());
        trace!(train = %train.id(), from = %from, to = %next, "entered block");
        events.push(Event::BlockEntered {
            train_id: train.id().clone(),
            from_block_id: from,
            block_id: next.clone(),
        });
    }

    Ok(())
}
