use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, ensure_config};
use crate::pvarray::config::ArrayConfig;

/// Sky diffuse model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyModel {
    /// Uniform sky: all diffuse light is isotropic.
    #[default]
    Isotropic,
    /// Isotropic remainder plus circumsolar and horizon-band components.
    Perez,
}

/// How reflected light is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reflections {
    /// One bounce off the ground only.
    #[default]
    SingleBounce,
    /// Full radiosity solve over all surfaces.
    Full,
}

/// Model options shared by every timestep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub sky: SkyModel,
    pub reflections: Reflections,
    /// Angular diameter of the circumsolar disk [deg].
    pub circumsolar_angle: f64,
    /// Elevation span of the horizon band [deg].
    pub horizon_band_angle: f64,
    /// Extraterrestrial DNI used when the sun state carries none [W/m²].
    pub dni_extra: f64,
}

impl ModelConfig {
    pub fn new() -> Self {
        Self {
            sky: SkyModel::Isotropic,
            reflections: Reflections::SingleBounce,
            circumsolar_angle: 30.0,
            horizon_band_angle: 6.5,
            dni_extra: 1366.1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_config!(
            self.circumsolar_angle.is_finite()
                && self.circumsolar_angle > 0.0
                && self.circumsolar_angle < 180.0,
            "circumsolar_angle must be in (0, 180), got {}",
            self.circumsolar_angle
        );
        ensure_config!(
            self.horizon_band_angle.is_finite()
                && self.horizon_band_angle > 0.0
                && self.horizon_band_angle <= 90.0,
            "horizon_band_angle must be in (0, 90], got {}",
            self.horizon_band_angle
        );
        ensure_config!(
            self.dni_extra.is_finite() && self.dni_extra > 0.0,
            "dni_extra must be positive, got {}",
            self.dni_extra
        );
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Array and model configuration of a run, as stored in JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub array: ArrayConfig,
    pub model: ModelConfig,
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("failed to parse JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::Configuration(format!("failed to open file {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::Configuration(format!("failed to parse file {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("failed to serialize: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        self.array.validate()?;
        self.model.validate()
    }
}
