// Orbweave headless performer — CLI entry point.
//
// Runs a seeded performance for a fixed stretch of simulated time, records
// every note the sequencer schedules, and writes them to MIDI. Optionally
// dumps a JSON-lines frame snapshot at a fixed interval.
//
// Usage:
//   cargo run -p orbweave_music --bin perform -- [output.mid] [--seconds N]
//     [--seed N] [--config PATH] [--snapshots PATH] [--snapshot-every MS]
//
// Logging goes through `tracing`; set RUST_LOG (default `info`).

use orbweave_music::midi::write_midi;
use orbweave_sim::audio::RecordingAudio;
use orbweave_sim::config::ToyConfig;
use orbweave_sim::sim::Performance;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("orbweave.mid");
    let seconds: u64 = parse_flag(&args, "--seconds").unwrap_or(60);
    let seed: u64 = parse_flag(&args, "--seed").unwrap_or(0);
    let config_path: Option<String> = parse_flag(&args, "--config");
    let snapshots_path: Option<String> = parse_flag(&args, "--snapshots");
    let snapshot_every: u64 = parse_flag(&args, "--snapshot-every").unwrap_or(1_000).max(1);

    let config = match &config_path {
        Some(path) => ToyConfig::load(Path::new(path))?,
        None => ToyConfig::default(),
    };
    let tempo_bpm = config.transport.tempo_bpm;

    info!(output = output_path, seconds, seed, tempo_bpm, "starting performance");
    let mut perf = Performance::with_config(seed, config)?;
    let mut audio = RecordingAudio::new();
    perf.start(&mut audio)?;

    let mut snapshots = match &snapshots_path {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    let end_ms = seconds * 1_000;
    let mut played = 0;
    while perf.now_ms() < end_ms {
        let target = (perf.now_ms() + snapshot_every).min(end_ms);
        played += perf.step(&mut audio, target).notes.len();
        if let Some(out) = snapshots.as_mut() {
            serde_json::to_writer(&mut *out, &perf.snapshot())?;
            out.write_all(b"\n")?;
        }
    }
    if let Some(mut out) = snapshots {
        out.flush()?;
    }

    info!(notes = played, frames = perf.frames(), "performance finished");
    write_midi(&audio.notes, tempo_bpm, Path::new(output_path))?;
    info!(path = output_path, "wrote MIDI");
    if let Some(path) = snapshots_path {
        info!(path = %path, "wrote snapshots");
    }
    Ok(())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
