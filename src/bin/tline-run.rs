//! Runs a transmission line scenario headless.
//!
//! Usage: `tline-run [--config FILE] [--scenario 1-4] [--frames N] [--save FILE.h5]`

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telegraph::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "tline-run")]
#[command(about = "Simulate a driven, terminated transmission line frame by frame")]
struct Cli {
    /// TOML scenario configuration. Defaults are used for anything missing.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scenario id: 1 short circuit, 2 matched load, 3 lossy, 4 dispersive
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    scenario: Option<u8>,

    /// Number of line segments
    #[arg(long)]
    npoints: Option<usize>,

    /// Number of frames to simulate
    #[arg(long)]
    frames: Option<usize>,

    /// Solver steps per frame
    #[arg(long)]
    sub_steps: Option<usize>,

    /// Advance the source time on every sub-step instead of once per frame
    #[arg(long)]
    continuous_phase: bool,

    /// Wait the configured frame interval between frames
    #[arg(long)]
    paced: bool,

    /// Save frame snapshots to this HDF5 file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Save every node instead of only the end nodes
    #[arg(long, requires = "save")]
    full: bool,

    /// Show a progress bar
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telegraph=info,tline_run=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => ScenarioConfig::load(path)
            .with_context(|| format!("unable to load config {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    if let Some(id) = cli.scenario {
        config.scenario = Scenario::from_id(id).ok_or_else(|| anyhow!("unknown scenario {}", id))?;
    }
    if let Some(npoints) = cli.npoints {
        config.npoints = npoints;
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(sub_steps) = cli.sub_steps {
        config.sub_steps = sub_steps;
    }
    if cli.continuous_phase {
        config.phase_mode = PhaseMode::Continuous;
    }

    let mut simulation = config.build().context("invalid scenario")?;
    let sim_params = *simulation.sim_params();
    if let Err(e) = sim_params.check_stability() {
        warn!("{}; the run will likely diverge", e);
    }

    info!(
        scenario = %config.scenario,
        npoints = config.npoints,
        delta_t = sim_params.delta_t,
        impedance = sim_params.impedance,
        "running {} frames",
        config.frames
    );

    simulation.run(RunDescriptor {
        frames: config.frames,
        verbose: cli.verbose,
        halt_on_divergence: true,
        frame_interval: cli.paced.then(|| config.frame_interval()),
        save_settings: cli.save.map(|filename| SaveSettings {
            filename,
            save_type: if cli.full { SaveType::Full } else { SaveType::End },
            overwrite: true,
        }),
    })?;

    let state = simulation.state();
    info!(
        time = state.time,
        max_voltage = state.max_abs_voltage(),
        end_voltage = state.voltages[state.npoints()],
        "done"
    );

    Ok(())
}
