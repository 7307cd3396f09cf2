//! Diagnostic visualizer: renders the valley cross-section, the ice coloured
//! by speed, and the climate's ELA line into a PNG.
//! Not part of the simulation; no tests.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use glacier_core::glacier::velocity::U_SLIDE;
use glacier_core::{ClimateSource, GlacierModel, SimConfig, Terrain};

#[derive(Parser, Debug)]
#[command(name = "visualize", about = "Render a glacier cross-section to PNG")]
struct Args {
    /// Scenario JSON file (defaults to the modern alpine scenario).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Years to simulate before rendering (defaults to the scenario's).
    #[arg(long)]
    years: Option<f64>,

    /// Output image.
    #[arg(short, long, default_value = "data/debug/glacier_profile.png")]
    output: PathBuf,

    #[arg(long, default_value = "1200")]
    width: u32,

    #[arg(long, default_value = "400")]
    height: u32,
}

// ── Colour helpers ────────────────────────────────────────────────────────────

const SKY: [u8; 3] = [225, 238, 250];
const ROCK: [u8; 3] = [120, 104, 90];
const ELA_LINE: [u8; 3] = [220, 40, 40];

/// Ice speed (m/yr) → white-to-blue ramp; sliding-only speed is white.
fn speed_to_rgb(speed: f64, max_speed: f64) -> [u8; 3] {
    let t = ((speed - U_SLIDE) / (max_speed - U_SLIDE).max(1.0)).clamp(0.0, 1.0);
    let lo = (255.0 * (1.0 - 0.7 * t)) as u8;
    [lo, lo, 255]
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(years) = args.years {
        config.years = years;
    }

    let mut model = GlacierModel::from_config(&config).context("building model")?;
    println!("Simulating {} years…", config.years);
    model.run(config.ticks())?;

    let glacier = model.glacier();
    let valley = model.valley();
    let ela = model.climate().ela();

    // World window: the whole valley, floor up to a little above the headwall.
    let x_min = valley.headwall_position().x;
    let x_max = x_min + valley.length().max(glacier.length() * 1.1);
    let z_top = valley.max_elevation() * 1.05;
    let z_bottom = valley.elevation(x_max).min(ela) * 0.9;

    let (w, h) = (args.width.max(2), args.height.max(2));
    let to_x = |col: u32| x_min + (x_max - x_min) * col as f64 / (w - 1) as f64;
    let to_z = |row: u32| z_top - (z_top - z_bottom) * row as f64 / (h - 1) as f64;

    // Fastest surface speed, for the colour ramp.
    let max_speed = glacier
        .profile((x_max - x_min) / w as f64, x_max - x_min)
        .iter()
        .filter(|s| s.thickness > 0.0)
        .map(|s| glacier.ice_speed(s.x, s.surface))
        .fold(0.0f64, f64::max);

    let mut img = image::RgbImage::new(w, h);
    for col in 0..w {
        let x = to_x(col);
        let floor = valley.elevation(x);
        let surface = glacier.surface_elevation(x);
        for row in 0..h {
            let z = to_z(row);
            let px = if z <= floor {
                ROCK
            } else if z <= surface {
                speed_to_rgb(glacier.ice_speed(x, z), max_speed)
            } else {
                SKY
            };
            img.put_pixel(col, row, image::Rgb(px));
        }
    }

    // Dashed ELA line.
    if ela > z_bottom && ela < z_top {
        let row = ((z_top - ela) / (z_top - z_bottom) * (h - 1) as f64).round() as u32;
        for col in (0..w).filter(|c| (c / 8) % 2 == 0) {
            img.put_pixel(col, row, image::Rgb(ELA_LINE));
        }
    }

    if let Some(dir) = args.output.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    img.save(&args.output)
        .with_context(|| format!("saving {}", args.output.display()))?;

    println!(
        "Wrote {} (ELA {:.0} m, length {:.0} m, steady: {})",
        args.output.display(),
        ela,
        glacier.length(),
        glacier.is_steady_state()
    );
    Ok(())
}
