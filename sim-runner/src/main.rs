//! Scenario runner
//!
//! Loads a scenario, runs it for a number of frames and writes what the
//! players' track managers hold each frame.
//!
//! Usage:
//!   sim-runner --scenario scenarios/sam_vs_strike.json \
//!              --frames 400 --record tracks.jsonl --summary summary.json

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use flight_sim::{load_scenario, FrameStats, Simulation};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracks::JsonLinesRecorder;

#[derive(Parser, Debug)]
#[command(name = "sim-runner", about = "Run a gimbal / RF sensor scenario")]
struct Args {
    /// Scenario JSON file
    #[arg(short, long, default_value = "scenarios/sam_vs_strike.json")]
    scenario: PathBuf,

    /// Frames to run (defaults to the scenario's own count)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Frame rate in Hz (defaults to 1 / scenario dt)
    #[arg(long)]
    rate_hz: Option<f64>,

    /// Pace frames to the wall clock
    #[arg(long)]
    realtime: bool,

    /// Write every track each frame as JSON lines
    #[arg(short, long)]
    record: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    scenario: String,
    started: chrono::DateTime<Utc>,
    finished: chrono::DateTime<Utc>,
    frames: u64,
    sim_time: f64,
    dt: f64,
    recorded: u64,
    peak_tracks: usize,
    total_reports: usize,
    total_detections: usize,
    last_frame: FrameStats,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "sim_runner=debug,flight_sim=debug,info"
    } else {
        "sim_runner=info,flight_sim=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    info!("{}", "=".repeat(60));
    info!("Gimbal / RF scenario runner");
    info!("{}", "=".repeat(60));

    let config = load_scenario(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;

    let dt = frame_dt(args.rate_hz, config.dt)?;
    let frames = args.frames.unwrap_or(config.frames);

    let mut sim = config.build().context("building scenario")?;
    if let Some(path) = &args.record {
        let recorder = JsonLinesRecorder::create(path)
            .with_context(|| format!("opening recording {}", path.display()))?;
        sim.set_recorder(Some(Box::new(recorder)));
    }

    let started = Utc::now();
    let summary = run(&mut sim, frames, dt, args.realtime, started).await?;
    sim.shutdown()?;

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Frames: {} ({:.2} s simulated)", summary.frames, summary.sim_time);
    info!("Peak tracks: {}", summary.peak_tracks);
    info!("RWR reports: {}", summary.total_reports);
    info!("Radar detections: {}", summary.total_detections);
    info!("Track records written: {}", summary.recorded);
    for p in sim.players() {
        info!("  {:>4} {:20} tracks={}", p.id(), p.name(), p.track_count());
    }

    if let Some(path) = &args.summary {
        info!("Writing summary to {:?}", path);
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
    }

    Ok(())
}

/// Frame period from `--rate-hz`, or the scenario's own step
fn frame_dt(rate_hz: Option<f64>, scenario_dt: f64) -> Result<f64> {
    let dt = match rate_hz {
        Some(hz) => 1.0 / hz,
        None => scenario_dt,
    };
    if !(dt.is_finite() && dt > 0.0) {
        match rate_hz {
            Some(hz) => anyhow::bail!("--rate-hz {hz} does not give a usable frame period"),
            None => anyhow::bail!("scenario dt {scenario_dt} is not a usable frame period"),
        }
    }
    Ok(dt)
}

async fn run(
    sim: &mut Simulation,
    frames: u64,
    dt: f64,
    realtime: bool,
    started: chrono::DateTime<Utc>,
) -> Result<RunSummary> {
    let mut interval = if realtime {
        let period = Duration::try_from_secs_f64(dt)
            .with_context(|| format!("frame period {dt} s"))?;
        Some(time::interval(period))
    } else {
        None
    };
    let mut last = FrameStats::default();
    let mut peak_tracks = 0;
    let mut total_reports = 0;
    let mut total_detections = 0;

    info!(frames, dt, realtime, "running {}", sim.name());
    for _ in 0..frames {
        if let Some(interval) = interval.as_mut() {
            interval.tick().await;
        }
        last = sim.step(dt)?;
        peak_tracks = peak_tracks.max(last.tracks);
        total_reports += last.reported;
        total_detections += last.detections;

        if last.frame % 100 == 0 {
            info!(
                frame = last.frame,
                time = last.time,
                tracks = last.tracks,
                delivered = last.delivered,
                "progress"
            );
        }
    }

    Ok(RunSummary {
        scenario: sim.name().to_string(),
        started,
        finished: Utc::now(),
        frames: sim.frame(),
        sim_time: sim.time(),
        dt,
        recorded: sim.recorded(),
        peak_tracks,
        total_reports,
        total_detections,
        last_frame: last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_dt_from_rate() {
        assert_eq!(frame_dt(Some(20.0), 0.1).unwrap(), 0.05);
        assert_eq!(frame_dt(None, 0.1).unwrap(), 0.1);
    }

    #[test]
    fn test_frame_dt_rejects_unusable_rates() {
        for hz in [0.0, -5.0, f64::NAN, f64::INFINITY, 1e-320] {
            assert!(frame_dt(Some(hz), 0.05).is_err(), "rate {hz} accepted");
        }
        assert!(frame_dt(None, f64::NAN).is_err());
    }

    #[tokio::test]
    async fn test_realtime_rejects_oversized_period() {
        let mut sim = Simulation::new("empty");
        assert!(run(&mut sim, 1, 1e300, true, Utc::now()).await.is_err());
        let summary = run(&mut sim, 2, 1e300, false, Utc::now()).await.unwrap();
        assert_eq!(summary.frames, 2);
    }
}
