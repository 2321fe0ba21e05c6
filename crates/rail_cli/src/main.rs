use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rail_core::{Event, SimulationState, TickDelta};
use rail_world::{load_initial_state, load_line, DEFAULT_LINE_PATH};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "rail_cli", about = "Single-track rail line simulator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation for a fixed number of ticks.
    Run {
        #[arg(long)]
        ticks: u64,
        /// Simulated milliseconds per tick.
        #[arg(long, default_value_t = 1000)]
        delta_ms: i64,
        #[arg(long, default_value = DEFAULT_LINE_PATH)]
        line: PathBuf,
        #[arg(long, default_value_t = 1)]
        print_every: u64,
        /// Print full JSON snapshots instead of the one-line summary.
        #[arg(long)]
        json: bool,
        /// Write the final snapshot to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load and validate a line file, then print its topology.
    Validate {
        #[arg(long, default_value = DEFAULT_LINE_PATH)]
        line: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(
    ticks: u64,
    delta_ms: i64,
    line: &Path,
    print_every: u64,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let dt = TickDelta::from_millis(delta_ms).context("--delta-ms")?;
    let print_every = print_every.max(1);
    let mut state = load_initial_state(line)?;

    println!(
        "Starting simulation: ticks={ticks} delta_ms={delta_ms} blocks={} trains={}",
        state.line().block_count(),
        state.train_count(),
    );
    println!("{}", "-".repeat(80));

    for n in 1..=ticks {
        let events = state
            .tick(dt)
            .with_context(|| format!("tick {n} at t={}ms", state.sim_time().millis()))?;

        // Print notable events regardless of print_every.
        for event in &events {
            print_event(&state, event);
        }

        if n % print_every == 0 {
            print_status(&state, json)?;
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state at t={}ms:", state.sim_time().millis());
    print_status(&state, json)?;

    if let Some(path) = output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &state.snapshot())
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Snapshot written to {}", path.display());
    }

    Ok(())
}

fn print_event(state: &SimulationState, event: &Event) {
    let t = state.sim_time().millis();
    match event {
        Event::TerminusReached { train_id, block_id } => {
            println!("*** t={t}ms {train_id} reached terminus in {block_id} ***");
        }
        Event::TurnbackCompleted { train_id, forward } => {
            let heading = if *forward { "forward" } else { "backward" };
            println!("*** t={t}ms {train_id} turned back, now {heading} ***");
        }
        Event::HeldByOccupancy {
            train_id,
            block_id,
            occupied_by,
        } => {
            println!("*** t={t}ms {train_id} held at end of {block_id} by {occupied_by} ***");
        }
        Event::BlockEntered { .. } => {}
    }
}

fn print_status(state: &SimulationState, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string(&state.snapshot()).context("serializing snapshot")?
        );
        return Ok(());
    }

    let trains: Vec<String> = state
        .trains()
        .map(|t| {
            let arrow = if t.forward() { '>' } else { '<' };
            let pending = if t.pending_turnback() { " (turnback)" } else { "" };
            format!(
                "{}@{}:{:.3}{arrow}{pending}",
                t.id(),
                t.block_id(),
                t.progress().value()
            )
        })
        .collect();
    println!(
        "[t={:>8}ms]  {}",
        state.sim_time().millis(),
        trains.join("  ")
    );
    Ok(())
}

fn validate(line: &Path) -> Result<()> {
    let topology = load_line(line)?;
    println!("{} is valid", line.display());
    for block in topology.blocks() {
        let (from, to) = topology.block_ends(block)?;
        println!("  {block}: {from} -> {to}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            ticks,
            delta_ms,
            line,
            print_every,
            json,
            output,
        } => run(ticks, delta_ms, &line, print_every, json, output.as_deref())?,
        Commands::Validate { line } => validate(&line)?,
    }
    Ok(())
}
