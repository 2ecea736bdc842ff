use serde::{Deserialize, Serialize};

use crate::Vector;
use crate::error::{Result, ensure_input};

/// Perez circumsolar and horizon-band intensities [W/m²].
///
/// On a surface with angle of incidence `AOI` and tilt `beta` they contribute
/// `circumsolar * cos(AOI) / max(cos(85°), cos(zenith))` and
/// `horizon * sin(beta)`; the isotropic remainder of the sky is
/// `dhi - circumsolar`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiffuseComponents {
    pub circumsolar: f64,
    pub horizon: f64,
}

/// Sun position and irradiance for one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunState {
    /// Solar zenith angle [deg], in `[0, 180]`.
    pub zenith: f64,
    /// Solar azimuth [deg from north, clockwise].
    pub azimuth: f64,
    /// Direct normal irradiance [W/m²].
    pub dni: f64,
    /// Diffuse horizontal irradiance [W/m²].
    pub dhi: f64,
    /// Ground albedo for this timestep, overriding the array's.
    #[serde(default)]
    pub albedo: Option<f64>,
    /// Precomputed Perez components. Derived from `dni`/`dhi` when absent.
    #[serde(default)]
    pub diffuse_components: Option<DiffuseComponents>,
    /// Extraterrestrial normal irradiance [W/m²] for the Perez decomposition.
    #[serde(default)]
    pub dni_extra: Option<f64>,
}

impl SunState {
    pub fn new(zenith: f64, azimuth: f64, dni: f64, dhi: f64) -> Self {
        Self {
            zenith,
            azimuth,
            dni,
            dhi,
            albedo: None,
            diffuse_components: None,
            dni_extra: None,
        }
    }

    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = Some(albedo);
        self
    }

    pub fn with_diffuse_components(mut self, circumsolar: f64, horizon: f64) -> Self {
        self.diffuse_components = Some(DiffuseComponents {
            circumsolar,
            horizon,
        });
        self
    }

    /// Returns true if the sun is strictly above the horizon.
    pub fn is_up(&self) -> bool {
        self.zenith < 90.0
    }

    /// Solar unit vector projected on the cross-section plane.
    ///
    /// The rows are infinitely long, so the dot product of this vector with a
    /// surface normal is the cosine of the 3D angle of incidence. Its length is
    /// below 1 whenever the sun is not in the cross-section plane.
    pub fn in_plane_vector(&self, axis_azimuth: f64) -> Vector {
        let zenith = self.zenith.to_radians();
        let relative_azimuth = (self.azimuth - axis_azimuth).to_radians();
        Vector::new(zenith.sin() * relative_azimuth.sin(), zenith.cos())
    }

    /// Checks the input ranges. Fails with `Error::InvalidInput`.
    pub fn validate(&self) -> Result<()> {
        ensure_input!(
            self.zenith.is_finite() && (0.0..=180.0).contains(&self.zenith),
            "zenith must be in [0, 180], got {}",
            self.zenith
        );
        ensure_input!(self.azimuth.is_finite(), "azimuth must be finite");
        for (name, value) in [("dni", self.dni), ("dhi", self.dhi)] {
            ensure_input!(
                value.is_finite() && value >= 0.0,
                "{name} must be non-negative and finite, got {value}"
            );
        }
        if let Some(albedo) = self.albedo {
            ensure_input!(
                (0.0..1.0).contains(&albedo),
                "albedo must be in [0, 1), got {albedo}"
            );
        }
        if let Some(DiffuseComponents {
            circumsolar,
            horizon,
        }) = self.diffuse_components
        {
            ensure_input!(
                circumsolar.is_finite() && circumsolar >= 0.0 && circumsolar <= self.dhi,
                "circumsolar must be in [0, dhi], got {circumsolar}"
            );
            ensure_input!(
                horizon.is_finite() && horizon >= 0.0,
                "horizon must be non-negative and finite, got {horizon}"
            );
        }
        if let Some(dni_extra) = self.dni_extra {
            ensure_input!(
                dni_extra.is_finite() && dni_extra > 0.0,
                "dni_extra must be positive, got {dni_extra}"
            );
        }
        Ok(())
    }
}
