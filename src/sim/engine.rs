use crate::error::Result;
use crate::pvarray::config::ArrayConfig;
use crate::pvarray::layout::ArrayGeometry;
use crate::pvarray::registry::SurfaceRegistry;
use crate::pvarray::shadows::ShadowSet;
use crate::pvarray::sun::SunState;
use crate::sim::config::{ModelConfig, SimulationConfig};
use crate::sim::irradiance::{self, SkyIrradiance};
use crate::sim::result::{RadiosityResult, SurfaceIrradiance};
use crate::sim::shading::{ShadingFractions, shading_fractions};
use crate::sim::view_factors::ViewFactorMatrix;

/// Everything computed for one timestep.
#[derive(Debug, Clone)]
pub struct Timestep {
    pub sun: SunState,
    pub geometry: ArrayGeometry,
    pub shadows: ShadowSet,
    pub registry: SurfaceRegistry,
    pub shading: Vec<ShadingFractions>,
    pub view_factors: ViewFactorMatrix,
    pub sky: SkyIrradiance,
    pub result: RadiosityResult,
}

/// Validated array and model configuration.
///
/// Each timestep is computed from scratch; the engine itself is never mutated
/// and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Engine {
    array: ArrayConfig,
    model: ModelConfig,
}

impl Engine {
    /// Fails with `Error::Configuration` if either configuration is invalid.
    pub fn new(array: ArrayConfig, model: ModelConfig) -> Result<Self> {
        array.validate()?;
        model.validate()?;
        Ok(Self { array, model })
    }

    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        Self::new(config.array, config.model)
    }

    pub fn array(&self) -> &ArrayConfig {
        &self.array
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Irradiance of every surface for one timestep.
    pub fn run(&self, sun: &SunState) -> Result<RadiosityResult> {
        Ok(self.run_detailed(sun)?.result)
    }

    /// Same as [`Engine::run`], keeping the intermediate results.
    pub fn run_detailed(&self, sun: &SunState) -> Result<Timestep> {
        sun.validate()?;

        let geometry = ArrayGeometry::build(&self.array, sun)?;
        let shadows = ShadowSet::cast(&geometry, self.array.shadow_policy)?;
        let albedo = sun.albedo.unwrap_or(self.array.albedo);
        let registry = SurfaceRegistry::build(&self.array, &geometry, &shadows, albedo)?;
        let shading = shading_fractions(&registry, &geometry, &shadows, &self.model);
        let view_factors = ViewFactorMatrix::build(&registry, &geometry)?;
        let sky = SkyIrradiance::new(sun, &self.model);

        let sources = irradiance::sources(&registry, &geometry, &view_factors, &shading, &sky, sun);
        let reflections =
            irradiance::reflections(self.model.reflections, &registry, &view_factors, &sources)?;
        let components = irradiance::combine(&sources, &reflections)?;

        log::debug!(
            "zenith {:.1} azimuth {:.1}: {} surfaces, tilt {:.1}, {} ground shadows, {:?} reflections",
            sun.zenith,
            sun.azimuth,
            registry.len(),
            geometry.pose.tilt,
            shadows.ground.len(),
            self.model.reflections
        );

        let surfaces = registry
            .surfaces()
            .iter()
            .zip(shading.iter())
            .zip(components)
            .map(|((surface, fractions), irradiance)| SurfaceIrradiance {
                index: surface.index,
                key: surface.key,
                length: surface.length(),
                shaded: surface.shaded,
                shading: *fractions,
                irradiance,
            })
            .collect();

        Ok(Timestep {
            sun: *sun,
            geometry,
            shadows,
            registry,
            shading,
            view_factors,
            sky,
            result: RadiosityResult { surfaces },
        })
    }
}
