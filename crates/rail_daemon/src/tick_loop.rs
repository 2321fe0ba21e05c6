use crate::state::{AppState, StreamUpdate};
use anyhow::{bail, Context};
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Wall-clock interval between background ticks. Rejects rates whose period
/// is zero or does not fit a `Duration`.
pub fn tick_period(ticks_per_sec: f64) -> anyhow::Result<Duration> {
    if !ticks_per_sec.is_finite() || ticks_per_sec <= 0.0 {
        bail!("ticks per second must be a positive number, got {ticks_per_sec}");
    }
    let period = Duration::try_from_secs_f64(1.0 / ticks_per_sec)
        .with_context(|| format!("{ticks_per_sec} ticks per second is too slow"))?;
    if period.is_zero() {
        bail!("{ticks_per_sec} ticks per second is too fast");
    }
    Ok(period)
}

/// Ticks the simulation once per `period` with a fixed simulated delta of
/// `tick_millis`. Stops on the first failed tick.
pub async fn run_tick_loop(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if state.paused.load(Ordering::Relaxed) {
            continue;
        }

        match state.service.tick(state.tick_millis) {
            Ok(update) => {
                // No subscribers is fine.
                let _ = state.event_tx.send(StreamUpdate::Tick(update));
            }
            Err(err) => {
                tracing::error!("background tick failed, stopping loop: {err:#}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::stub_service;
    use crate::training::tests::training_service;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn loop_state(fail: bool, paused: bool) -> AppState {
        let (event_tx, _) = tokio::sync::broadcast::channel(16);
        AppState {
            service: Arc::new(stub_service(fail)),
            training: Arc::new(training_service()),
            event_tx,
            paused: Arc::new(AtomicBool::new(paused)),
            ticks_per_sec: 1000.0,
            tick_millis: 100,
        }
    }

    fn tick_time(update: StreamUpdate) -> u64 {
        match update {
            StreamUpdate::Tick(tick) => tick.snapshot.sim_time_millis,
            StreamUpdate::Session(event) => panic!("unexpected session event {event:?}"),
        }
    }

    #[test]
    fn period_is_reciprocal_of_rate() {
        assert_eq!(tick_period(4.0).unwrap(), Duration::from_millis(250));
        assert_eq!(tick_period(1000.0).unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn period_rejects_unrepresentable_rates() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e12, 1e-300] {
            assert!(tick_period(rate).is_err(), "rate {rate} accepted");
        }
    }

    #[tokio::test]
    async fn loop_publishes_updates() {
        let state = loop_state(false, false);
        let mut rx = state.event_tx.subscribe();
        let period = tick_period(state.ticks_per_sec).unwrap();
        let handle = tokio::spawn(run_tick_loop(state.clone(), period));

        assert_eq!(tick_time(rx.recv().await.unwrap()), 100);
        assert_eq!(tick_time(rx.recv().await.unwrap()), 200);
        handle.abort();
    }

    #[tokio::test]
    async fn loop_stops_on_failure() {
        let state = loop_state(true, false);
        tokio::time::timeout(
            Duration::from_secs(5),
            run_tick_loop(state, Duration::from_millis(1)),
        )
        .await
        .expect("loop should exit after the failed tick");
    }

    #[tokio::test]
    async fn paused_loop_does_not_tick() {
        let state = loop_state(false, true);
        let handle = tokio::spawn(run_tick_loop(state.clone(), Duration::from_millis(1)));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(state.service.sim_time_millis(), None);
        handle.abort();
    }
}
