#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Skyline Runner session and
//! reports what the level generator produced.

mod config;

use std::{
    cell::RefCell,
    io::{self, Write},
    path::PathBuf,
    rc::Rc,
    time::Duration,
};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use serde::Serialize;
use skyline_runner_core::{Event, RunState, RunSummary, SegmentKind, Viewport};
use skyline_runner_session::Session;

/// Runs the level generator without a renderer.
#[derive(Debug, Parser)]
#[command(name = "skyline-runner", version)]
struct CliArgs {
    /// TOML file overriding the default session tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the placement and spawn-point random stream.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Simulated seconds of running after the first landing.
    #[arg(long, default_value_t = 120.0)]
    duration: f32,
    /// Simulation ticks per second.
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,
    /// Visible world width centred on the origin.
    #[arg(long, default_value_t = 20.0)]
    viewport_width: f32,
    /// Distance the run is measured against for personal-best bonuses.
    #[arg(long, value_name = "DISTANCE")]
    personal_best: Option<f32>,
    /// Print every published event as a JSON line before the summary.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default)]
struct GenerationTally {
    segments_spawned: u32,
    set_pieces: u32,
    spawn_points: u32,
}

#[derive(Debug, Serialize)]
struct Report {
    seed: u64,
    ticks: u64,
    summary: RunSummary,
    difficulty_percentage: f32,
    segments_spawned: u32,
    set_pieces: u32,
    spawn_points: u32,
    live_segments: usize,
}

/// Entry point for the Skyline Runner command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();
    run(&args)
}

fn run(args: &CliArgs) -> Result<()> {
    ensure!(args.tick_rate > 0, "--tick-rate must be at least 1");
    ensure!(
        args.duration.is_finite() && args.duration >= 0.0,
        "--duration must be a non-negative number of seconds"
    );
    ensure!(
        args.viewport_width.is_finite() && args.viewport_width > 0.0,
        "--viewport-width must be positive"
    );

    let config = config::load_session_config(args.config.as_deref())?;
    let mut session = Session::with_personal_best(config, args.seed, args.personal_best)
        .context("failed to start session")?;
    session.set_viewport(Viewport::centred(args.viewport_width));

    let tally = Rc::new(RefCell::new(GenerationTally::default()));
    let sink = Rc::clone(&tally);
    let _ = session.subscribe(move |event| {
        let mut tally = sink.borrow_mut();
        match event {
            Event::SegmentSpawned { kind, .. } => {
                tally.segments_spawned += 1;
                if *kind == SegmentKind::SetPiece {
                    tally.set_pieces += 1;
                }
            }
            Event::SpawnPointOccupied { .. } => tally.spawn_points += 1,
            _ => {}
        }
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let dt = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate));
    let ticks = (f64::from(args.duration) * f64::from(args.tick_rate)).ceil() as u64;
    log::info!(
        "simulating {ticks} ticks of {:.2} ms with seed {:#x}",
        dt.as_secs_f64() * 1_000.0,
        args.seed
    );

    let landing = session.tick(Duration::ZERO).to_vec();
    write_trace(args.trace, &landing, &mut out)?;
    session.set_run_state(RunState::Running);

    for _ in 0..ticks {
        let events = session.tick(dt);
        write_trace(args.trace, events, &mut out)?;
    }

    let tally = tally.borrow();
    let report = Report {
        seed: args.seed,
        ticks,
        summary: session.summary(),
        difficulty_percentage: session.difficulty_percentage(),
        segments_spawned: tally.segments_spawned,
        set_pieces: tally.set_pieces,
        spawn_points: tally.spawn_points,
        live_segments: session.segments().len(),
    };
    serde_json::to_writer_pretty(&mut out, &report).context("failed to write run report")?;
    writeln!(out).context("failed to write run report")?;
    Ok(())
}

fn write_trace(enabled: bool, events: &[Event], out: &mut impl Write) -> Result<()> {
    if !enabled {
        return Ok(());
    }

    for event in events {
        serde_json::to_writer(&mut *out, event).context("failed to write trace event")?;
        writeln!(out).context("failed to write trace event")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_writes_one_json_line_per_event() {
        let mut buffer = Vec::new();
        write_trace(
            true,
            &[
                Event::SegmentsCleared,
                Event::DistanceUpdated { distance: 2.0 },
            ],
            &mut buffer,
        )
        .expect("write to buffer");

        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let restored: Event = serde_json::from_str(lines[1]).expect("valid json");
        assert_eq!(restored, Event::DistanceUpdated { distance: 2.0 });
    }

    #[test]
    fn disabled_trace_writes_nothing() {
        let mut buffer = Vec::new();
        write_trace(false, &[Event::SegmentsCleared], &mut buffer).expect("write to buffer");
        assert!(buffer.is_empty());
    }

    #[test]
    fn short_run_reports_without_error() {
        let args = CliArgs::parse_from(["skyline-runner", "--duration", "0.5", "--seed", "7"]);
        run(&args).expect("headless run succeeds");
    }
}
