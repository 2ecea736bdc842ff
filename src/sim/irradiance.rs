//! Irradiance sources and reflections.
//!
//! Each surface first receives light straight from the sky and the sun (the
//! sources `q0`). Reflections then add the light bounced off the other
//! surfaces, either off the ground only (one bounce) or through the full
//! radiosity system
//!
//! `(I - R F) x = R q0`, `reflection = F x`
//!
//! where `R` holds the surface reflectivities and `F` the surface-to-surface
//! view factors (the sky absorbs everything).

use ndarray as nd;

use crate::error::{Error, Result};
use crate::pvarray::layout::ArrayGeometry;
use crate::pvarray::registry::SurfaceRegistry;
use crate::pvarray::sun::SunState;
use crate::sim::config::{ModelConfig, Reflections, SkyModel};
use crate::sim::perez;
use crate::sim::result::IrradianceComponents;
use crate::sim::shading::ShadingFractions;
use crate::sim::solve::solve_dense;
use crate::sim::view_factors::ViewFactorMatrix;

/// Tolerance on negative reflections caused by round-off [W/m²].
const NEGATIVE_TOLERANCE: f64 = 1e-6;

/// Sky luminance split used by the source terms [W/m²].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkyIrradiance {
    /// Uniform sky part `I`.
    pub isotropic: f64,
    /// Circumsolar intensity `C` on a horizontal surface.
    pub circumsolar: f64,
    /// Horizon-band intensity `H`.
    pub horizon: f64,
}

impl SkyIrradiance {
    /// Splits `dhi` according to the sky model.
    pub fn new(sun: &SunState, model: &ModelConfig) -> Self {
        match model.sky {
            SkyModel::Isotropic => Self {
                isotropic: sun.dhi,
                circumsolar: 0.0,
                horizon: 0.0,
            },
            SkyModel::Perez => {
                let components = sun.diffuse_components.unwrap_or_else(|| {
                    perez::decompose(sun, sun.dni_extra.unwrap_or(model.dni_extra))
                });
                Self {
                    isotropic: (sun.dhi - components.circumsolar).max(0.0),
                    circumsolar: components.circumsolar,
                    horizon: components.horizon,
                }
            }
        }
    }
}

/// Source terms of every surface, `reflection` left at zero.
pub fn sources(
    registry: &SurfaceRegistry,
    geometry: &ArrayGeometry,
    view_factors: &ViewFactorMatrix,
    shading: &[ShadingFractions],
    sky: &SkyIrradiance,
    sun: &SunState,
) -> Vec<IrradianceComponents> {
    let cos_zenith = sun.zenith.to_radians().cos();
    let b = 85f64.to_radians().cos().max(cos_zenith);

    registry
        .surfaces()
        .iter()
        .zip(shading)
        .map(|(surface, fractions)| {
            let normal = surface.segment.normal;
            let cos_aoi = geometry.cos_aoi(normal);
            let sunlit = geometry.sun_up && cos_aoi > 0.0;

            let direct = if sunlit {
                sun.dni * cos_aoi * (1.0 - fractions.direct)
            } else {
                0.0
            };
            let circumsolar = if sunlit {
                sky.circumsolar * (cos_aoi / b) * (1.0 - fractions.circumsolar)
            } else {
                0.0
            };
            // sin(tilt) of the surface
            let horizon = sky.horizon * normal.dx.abs() * (1.0 - fractions.horizon);
            let isotropic = sky.isotropic * view_factors.sky(surface.index);

            IrradianceComponents {
                isotropic,
                circumsolar,
                horizon,
                direct,
                reflection: 0.0,
                total: 0.0,
            }
        })
        .collect()
}

/// Reflected irradiance of every surface.
pub fn reflections(
    mode: Reflections,
    registry: &SurfaceRegistry,
    view_factors: &ViewFactorMatrix,
    sources: &[IrradianceComponents],
) -> Result<Vec<f64>> {
    let n = registry.len();
    let q0 = nd::Array1::from_iter(sources.iter().map(IrradianceComponents::source));
    let rho = nd::Array1::from(registry.reflectivities());
    let f = view_factors.surfaces_block();

    let reflection = match mode {
        Reflections::SingleBounce => {
            // Light leaving the ground after one reflection
            let emitted = nd::Array1::from_iter(
                registry
                    .surfaces()
                    .iter()
                    .map(|s| if s.is_ground() { s.reflectivity * q0[s.index] } else { 0.0 }),
            );
            let mut reflection = f.dot(&emitted);
            for s in registry.ground() {
                reflection[s.index] = 0.0;
            }
            reflection
        }
        Reflections::Full => {
            let mut a = nd::Array2::<f64>::eye(n);
            for i in 0..n {
                for j in 0..n {
                    a[[i, j]] -= rho[i] * f[[i, j]];
                }
            }
            let radiosity = solve_dense(a, &rho * &q0)?;
            f.dot(&radiosity)
        }
    };

    reflection
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            if !r.is_finite() || r < -NEGATIVE_TOLERANCE {
                Err(Error::NumericalInstability(format!(
                    "reflection on surface {i} is {r}"
                )))
            } else {
                Ok(r.max(0.0))
            }
        })
        .collect()
}

/// Combines sources and reflections, and checks the result.
pub fn combine(sources: &[IrradianceComponents], reflections: &[f64]) -> Result<Vec<IrradianceComponents>> {
    sources
        .iter()
        .zip(reflections)
        .enumerate()
        .map(|(i, (source, &reflection))| {
            let c = IrradianceComponents {
                reflection,
                ..*source
            }
            .with_total();
            let valid = c.as_array().iter().all(|v| v.is_finite() && *v >= 0.0)
                && c.total >= c.direct;
            if valid {
                Ok(c)
            } else {
                Err(Error::NumericalInstability(format!(
                    "invalid irradiance on surface {i}: {c:?}"
                )))
            }
        })
        .collect()
}
