use std::path::Path;

use anyhow::{Context, Result};
use pvarray2d::sim::batch::{count_failures, run_parallel, run_serial};
use pvarray2d::{Engine, Owner, Side, SimulationConfig, SunState};

/// Synthetic clear day: sun rising in the east and setting in the west.
fn synthetic_day(n_steps: usize) -> Vec<SunState> {
    (0..n_steps)
        .map(|k| {
            let t = (k as f64 + 0.5) / n_steps as f64;
            let elevation = 65.0 * (std::f64::consts::PI * t).sin();
            let height = elevation.to_radians().sin();
            SunState::new(90.0 - elevation, 90.0 + 180.0 * t, 850.0 * height, 40.0 + 80.0 * height)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_json_file(Path::new(&path))
            .with_context(|| format!("Failed to load configuration: {path}"))?,
        None => SimulationConfig::default(),
    };
    let engine = Engine::from_config(config)?;
    let suns = synthetic_day(12);

    let serial = run_serial(&engine, &suns);
    let parallel = run_parallel(&engine, &suns);
    anyhow::ensure!(serial == parallel, "serial and parallel runs differ");
    println!(
        "{} timesteps, {} failed",
        serial.len(),
        count_failures(&serial)
    );

    let middle = engine.array().n_rows / 2;
    println!("zenith  azimuth  front [W/m2]  back [W/m2]  ground [W/m2]");
    for (sun, result) in suns.iter().zip(&serial) {
        match result {
            Ok(result) => {
                let total = |owner, side| {
                    result
                        .side_average(owner, side)
                        .map_or(0.0, |c| c.total)
                };
                println!(
                    "{:6.1}  {:7.1}  {:12.1}  {:11.1}  {:13.1}",
                    sun.zenith,
                    sun.azimuth,
                    total(Owner::Row(middle), Side::Front),
                    total(Owner::Row(middle), Side::Back),
                    total(Owner::Ground, Side::Ground),
                );
            }
            Err(e) => println!("{:6.1}  {:7.1}  {e}", sun.zenith, sun.azimuth),
        }
    }
    Ok(())
}
