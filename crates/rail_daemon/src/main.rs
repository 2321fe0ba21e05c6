use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use rail_core::{SessionId, TickDelta};
use tracing_subscriber::EnvFilter;

mod routes;
mod service;
mod state;
mod tick_loop;
mod training;

use routes::make_router_with_cors;
use service::{FileLineLoader, SimulationService};
use state::AppState;
use training::TrainingService;

#[derive(Parser)]
#[command(name = "rail_daemon", about = "Single-track rail line simulation daemon")]
struct Cli {
    /// Line topology JSON file.
    #[arg(long, default_value = rail_world::DEFAULT_LINE_PATH)]
    line: PathBuf,
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 3001)]
    port: u16,
    /// Background ticks per wall-clock second. 0 disables the loop; ticks
    /// then only happen through POST /api/v1/simulation/tick.
    #[arg(long, default_value_t = 0.0)]
    ticks_per_sec: f64,
    /// Simulated milliseconds per background tick.
    #[arg(long, default_value_t = 1000)]
    tick_millis: i64,
    /// Start with the background loop paused.
    #[arg(long)]
    paused: bool,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
    #[arg(long, default_value = "default")]
    session: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    TickDelta::from_millis(cli.tick_millis).context("--tick-millis")?;
    if !cli.ticks_per_sec.is_finite() || cli.ticks_per_sec < 0.0 {
        anyhow::bail!("--ticks-per-sec must be a non-negative number");
    }
    let tick_period = if cli.ticks_per_sec > 0.0 {
        Some(tick_loop::tick_period(cli.ticks_per_sec).context("--ticks-per-sec")?)
    } else {
        None
    };
    let cors_origin: HeaderValue = cli.cors_origin.parse().context("--cors-origin")?;
    let session = SessionId::new(&cli.session).context("--session")?;

    let training = Arc::new(TrainingService::new(session.clone()));
    let service = Arc::new(SimulationService::new(
        session,
        Box::new(FileLineLoader::new(&cli.line)),
    ));
    // Fail fast on a bad line file instead of on the first request.
    let initial = service
        .get_simulation()
        .with_context(|| format!("loading line from {}", cli.line.display()))?;
    tracing::info!(
        stations = initial.line.stations.len(),
        blocks = initial.line.blocks.len(),
        trains = initial.trains.len(),
        "line loaded"
    );

    let (event_tx, _) = tokio::sync::broadcast::channel(256);
    let app_state = AppState {
        service,
        training,
        event_tx,
        paused: Arc::new(AtomicBool::new(cli.paused)),
        ticks_per_sec: cli.ticks_per_sec,
        tick_millis: cli.tick_millis,
    };

    if let Some(period) = tick_period {
        tokio::spawn(tick_loop::run_tick_loop(app_state.clone(), period));
    }

    let app = make_router_with_cors(app_state, cors_origin);
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("parsing listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("installing ctrl-c handler failed: {err}");
    }
}
