//! Running many timesteps.
//!
//! Timesteps are independent: each one is computed by [`Engine::run`] and
//! a failure only affects its own entry in the output.

use rayon::prelude::*;
use thiserror::Error;

use crate::error::Error;
use crate::pvarray::sun::SunState;
use crate::sim::engine::Engine;
use crate::sim::result::RadiosityResult;

/// Failure of one timestep in a batch.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("timestep {index}: {error}")]
pub struct TimestepError {
    pub index: usize,
    #[source]
    pub error: Error,
}

pub type TimestepResult = std::result::Result<RadiosityResult, TimestepError>;

fn run_one(engine: &Engine, index: usize, sun: &SunState) -> TimestepResult {
    engine.run(sun).map_err(|error| {
        log::warn!("timestep {index} failed: {error}");
        TimestepError { index, error }
    })
}

/// Runs every timestep in order on the calling thread.
pub fn run_serial(engine: &Engine, suns: &[SunState]) -> Vec<TimestepResult> {
    log::info!("running {} timesteps serially", suns.len());
    suns.iter()
        .enumerate()
        .map(|(index, sun)| run_one(engine, index, sun))
        .collect()
}

/// Runs the timesteps on the rayon thread pool. Output order matches input order.
pub fn run_parallel(engine: &Engine, suns: &[SunState]) -> Vec<TimestepResult> {
    log::info!("running {} timesteps in parallel", suns.len());
    suns.par_iter()
        .enumerate()
        .map(|(index, sun)| run_one(engine, index, sun))
        .collect()
}

/// Number of failed timesteps.
pub fn count_failures(results: &[TimestepResult]) -> usize {
    results.iter().filter(|r| r.is_err()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvarray::config::ArrayConfig;
    use crate::sim::config::ModelConfig;

    fn suns() -> Vec<SunState> {
        vec![
            SunState::new(70.0, 100.0, 300.0, 80.0),
            SunState::new(40.0, 150.0, 700.0, 110.0),
            SunState::new(-5.0, 180.0, 700.0, 110.0),
            SunState::new(45.0, 220.0, 650.0, 100.0),
            SunState::new(110.0, 300.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_failures_are_scoped_to_their_timestep() -> anyhow::Result<()> {
        let engine = Engine::new(ArrayConfig::default(), ModelConfig::default())?;
        let results = run_serial(&engine, &suns());
        assert_eq!(results.len(), 5);
        assert_eq!(count_failures(&results), 1);
        match &results[2] {
            Err(e) => {
                assert_eq!(e.index, 2);
                assert!(matches!(e.error, Error::InvalidInput(_)));
            }
            Ok(_) => panic!("negative zenith accepted"),
        }
        assert!(results[3].is_ok());
        Ok(())
    }

    #[test]
    fn test_serial_and_parallel_match() -> anyhow::Result<()> {
        let engine = Engine::new(ArrayConfig::default(), ModelConfig::default())?;
        let serial = run_serial(&engine, &suns());
        let parallel = run_parallel(&engine, &suns());
        assert_eq!(serial, parallel);
        Ok(())
    }
}
