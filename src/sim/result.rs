use std::collections::BTreeMap;
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::pvarray::registry::SurfaceKey;
use crate::pvarray::{Owner, Side};
use crate::sim::shading::ShadingFractions;

/// Irradiance received by a surface [W/m²].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IrradianceComponents {
    pub isotropic: f64,
    pub circumsolar: f64,
    pub horizon: f64,
    pub direct: f64,
    pub reflection: f64,
    pub total: f64,
}

impl IrradianceComponents {
    /// Light arriving without any reflection.
    pub fn source(&self) -> f64 {
        self.isotropic + self.circumsolar + self.horizon + self.direct
    }

    /// Sets `total` from the other components.
    pub fn with_total(mut self) -> Self {
        self.total = self.source() + self.reflection;
        self
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.isotropic,
            self.circumsolar,
            self.horizon,
            self.direct,
            self.reflection,
            self.total,
        ]
    }
}

impl Add for IrradianceComponents {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            isotropic: self.isotropic + other.isotropic,
            circumsolar: self.circumsolar + other.circumsolar,
            horizon: self.horizon + other.horizon,
            direct: self.direct + other.direct,
            reflection: self.reflection + other.reflection,
            total: self.total + other.total,
        }
    }
}

impl Mul<f64> for IrradianceComponents {
    type Output = Self;
    fn mul(self, scale: f64) -> Self {
        Self {
            isotropic: self.isotropic * scale,
            circumsolar: self.circumsolar * scale,
            horizon: self.horizon * scale,
            direct: self.direct * scale,
            reflection: self.reflection * scale,
            total: self.total * scale,
        }
    }
}

/// Result for one registered piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceIrradiance {
    pub index: usize,
    pub key: SurfaceKey,
    pub length: f64,
    pub shaded: bool,
    pub shading: ShadingFractions,
    pub irradiance: IrradianceComponents,
}

/// Irradiance of every surface for one timestep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RadiosityResult {
    /// Per piece, in registry order.
    pub surfaces: Vec<SurfaceIrradiance>,
}

impl RadiosityResult {
    /// Length-weighted average over the pieces accepted by `filter`.
    ///
    /// Returns `None` if no piece is accepted.
    pub fn weighted_average<F>(&self, filter: F) -> Option<IrradianceComponents>
    where
        F: Fn(&SurfaceIrradiance) -> bool,
    {
        let (sum, length) = self
            .surfaces
            .iter()
            .filter(|s| filter(s))
            .fold((IrradianceComponents::default(), 0.0), |(sum, length), s| {
                (sum + s.irradiance * s.length, length + s.length)
            });
        (length > 0.0).then(|| sum * (1.0 / length))
    }

    /// Irradiance of one discretization segment, lit and shaded pieces combined.
    pub fn get(&self, key: &SurfaceKey) -> Option<IrradianceComponents> {
        self.weighted_average(|s| s.key == *key)
    }

    /// Every segment, keyed.
    pub fn by_key(&self) -> BTreeMap<SurfaceKey, IrradianceComponents> {
        let mut sums: BTreeMap<SurfaceKey, (IrradianceComponents, f64)> = BTreeMap::new();
        for s in &self.surfaces {
            let entry = sums
                .entry(s.key)
                .or_insert((IrradianceComponents::default(), 0.0));
            entry.0 = entry.0 + s.irradiance * s.length;
            entry.1 += s.length;
        }
        sums.into_iter()
            .filter(|(_, (_, length))| *length > 0.0)
            .map(|(key, (sum, length))| (key, sum * (1.0 / length)))
            .collect()
    }

    /// Average over a whole row side, or over the ground.
    pub fn side_average(&self, owner: Owner, side: Side) -> Option<IrradianceComponents> {
        self.weighted_average(|s| s.key.owner == owner && s.key.side == side)
    }

    /// Average over one side of every row.
    pub fn array_side_average(&self, side: Side) -> Option<IrradianceComponents> {
        self.weighted_average(|s| s.key.side == side && matches!(s.key.owner, Owner::Row(_)))
    }
}
