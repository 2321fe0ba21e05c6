use crate::service::{SimulationService, TickUpdate};
use crate::training::TrainingService;
use rail_core::SessionEvent;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything pushed to `/api/v1/stream` subscribers.
#[derive(Debug, Clone)]
pub enum StreamUpdate {
    Tick(TickUpdate),
    Session(SessionEvent),
}

pub type EventTx = broadcast::Sender<StreamUpdate>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SimulationService>,
    pub training: Arc<TrainingService>,
    pub event_tx: EventTx,
    pub paused: Arc<AtomicBool>,
    /// 0 means ticks only happen on request.
    pub ticks_per_sec: f64,
    pub tick_millis: i64,
}
