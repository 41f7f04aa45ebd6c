//! beatviz CLI: run a scenario offline and print every visual callback.
//!
//! Usage:
//!   bv-cli path/to/scenario.toml
//!   bv-cli path/to/scenario.toml --verbose --seconds 8
//!   bv-cli path/to/scenario.toml --forced-tick

use bv_master::{Controller, Scenario};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario file (TOML)
    scenario: PathBuf,

    /// Log scheduler traces (add/remove/finish and every tick)
    #[arg(long)]
    verbose: bool,

    /// Override the run length in seconds
    #[arg(long)]
    seconds: Option<f64>,

    /// Drive frames through force_tick instead of tick
    #[arg(long)]
    forced_tick: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut scenario = match Scenario::load(&args.scenario) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.verbose {
        scenario.scheduler.verbose_logs = true;
    }
    if args.forced_tick {
        scenario.scheduler.use_forced_tick = true;
    }
    if let Some(seconds) = args.seconds {
        scenario.run.seconds = seconds;
    }

    let mut ctrl = match Controller::new(scenario) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let clock = &ctrl.scenario().clock;
    println!("Clock:    {} @ {} BPM, {}/4", clock.name, clock.bpm, clock.beats_per_bar);
    println!("Actors:   {}", ctrl.world().len());
    println!("Cues:     {}", ctrl.scenario().cues.len());
    println!();

    let trace = ctrl.run();
    println!("{}", trace);
    ExitCode::SUCCESS
}
