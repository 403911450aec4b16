//! `corridor`: adaptive max-pressure control of a signalised corridor.
//!
//! Loads a scenario (controller, run, simulator, network), drives the
//! controllers against the built-in point-queue simulator, and writes
//! `tick_records.csv`, `phase_switches.csv`, `warnings.csv` and
//! `summary.json` to the output directory.
//!
//! Run with:
//!   cargo run -p corridor --release -- [scenario.json] [output_dir]
//!
//! Without arguments the bundled three-intersection scenario is used.
//! `RUST_LOG=debug` shows every phase switch.

mod scenario;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use sc_output::{BackgroundObserver, CsvWriter};
use sc_sim::{ControlLoopBuilder, PointQueueSimulator};

use scenario::Scenario;

const DEFAULT_SCENARIO: &str = include_str!("../scenario.json");

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let scenario = match args.first() {
        Some(path) => Scenario::from_path(Path::new(path))?,
        None => Scenario::from_json(DEFAULT_SCENARIO).context("bundled scenario")?,
    };
    let output_dir = args.get(1).map(PathBuf::from).unwrap_or_else(|| scenario.output_dir.clone());

    // 1. Network.
    let corridor = scenario.corridor()?;
    info!(
        "corridor: {} intersection(s), {} lane(s)",
        corridor.intersection_count(),
        corridor.lane_count()
    );

    // 2. Simulator backend and controllers.
    let simulator =
        PointQueueSimulator::new(&corridor, &scenario.simulator).context("simulator section")?;
    let names: Vec<String> = corridor.intersections().iter().map(|j| j.name.clone()).collect();
    let mut control = ControlLoopBuilder::new(corridor, scenario.controller, scenario.run)
        .build()
        .context("controller configuration")?;

    // 3. Output.
    let writer = CsvWriter::new(&output_dir)
        .with_context(|| format!("creating output in {}", output_dir.display()))?;
    let mut obs = BackgroundObserver::spawn(writer)?;

    // 4. Run.  Telemetry is drained even if the run fails.
    let t0 = Instant::now();
    let result = control.run(simulator, &mut obs);
    let written = obs.finish();
    let summary = result.context("control loop")?;
    written.context("telemetry output")?;
    let elapsed = t0.elapsed();

    let summary_path = output_dir.join("summary.json");
    serde_json::to_writer_pretty(File::create(&summary_path)?, &summary)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    // 5. Summary.
    println!();
    println!(
        "Simulated {} in {} ticks ({:.3} s wall){}",
        summary.final_time,
        summary.ticks,
        elapsed.as_secs_f64(),
        if summary.cancelled { ", cancelled" } else { "" }
    );
    println!("{:<12} {:>9}", "Junction", "Switches");
    println!("{}", "-".repeat(22));
    for name in &names {
        println!("{:<12} {:>9}", name, summary.switches.get(name).copied().unwrap_or(0));
    }
    println!();
    println!("Degraded evaluations : {}", summary.degraded_evals);
    println!("Telemetry warnings   : {}", summary.warnings.len());
    println!("Output               : {}", output_dir.display());

    Ok(())
}
