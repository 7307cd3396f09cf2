/// Glacier simulation runner: loads a scenario, drives the clock and prints
/// JSON snapshots of the glacier as it evolves.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use glacier_core::{ClimateChange, Glacier, GlacierModel, GlacierSnapshot, ProfileSample, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "glacier-sim", about = "Evolve a valley glacier under a changing climate")]
struct Args {
    /// Scenario JSON file (defaults to the modern alpine scenario).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of simulated years.
    #[arg(long)]
    years: Option<f64>,

    /// Override the clock step (years per tick).
    #[arg(long)]
    dt: Option<f64>,

    /// Temperature offset (°C) applied at year 0.
    #[arg(long, allow_hyphen_values = true)]
    temperature_offset: Option<f64>,

    /// Snowfall (m/yr) applied at year 0.
    #[arg(long)]
    snowfall: Option<f64>,

    /// Emit a snapshot every N ticks.
    #[arg(long, default_value = "50")]
    every: u64,

    /// Stop early once the glacier reaches steady state.
    #[arg(long)]
    until_steady: bool,

    /// Include the final thickness profile in the output.
    #[arg(long)]
    profile: bool,

    /// Print the effective scenario as JSON and exit.
    #[arg(long)]
    dump_config: bool,
}

#[derive(Serialize)]
struct Report {
    snapshots: Vec<GlacierSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Vec<ProfileSample>>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(years) = args.years {
        config.years = years;
    }
    if let Some(dt) = args.dt {
        config.dt = dt;
    }
    if args.temperature_offset.is_some() || args.snowfall.is_some() {
        config.changes.push(ClimateChange {
            year: 0.0,
            temperature_offset: args.temperature_offset,
            snowfall: args.snowfall,
            snowfall_reference_elevation: None,
        });
    }
    config.validate().context("invalid scenario")?;

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut model = GlacierModel::from_config(&config).context("building model")?;
    let every = args.every.max(1);
    let ticks = config.ticks();
    log::info!(
        "simulating {} years in {ticks} ticks of {} yr, initial length {:.0} m",
        config.years,
        config.dt,
        model.glacier().length()
    );

    let mut snapshots = vec![model.snapshot()];
    for tick in 1..=ticks {
        model.step()?;
        let steady = model.glacier().is_steady_state();
        if tick % every == 0 || tick == ticks || (args.until_steady && steady) {
            snapshots.push(model.snapshot());
        }
        if args.until_steady && steady {
            log::info!("steady state after {tick} ticks");
            break;
        }
    }

    let profile = args.profile.then(|| {
        let g = model.glacier();
        g.profile(Glacier::dx(), g.length() + 2.0 * Glacier::dx())
    });

    let report = Report { snapshots, profile };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
