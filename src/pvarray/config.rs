use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ensure_config};

/// How the rows are oriented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Orientation {
    /// Fixed-tilt rows.
    Fixed {
        /// Surface tilt from horizontal [deg], in `[0, 180)`.
        tilt: f64,
        /// Azimuth the front surface faces [deg from north, clockwise].
        surface_azimuth: f64,
    },
    /// Single-axis trackers rotating about the row axis.
    SingleAxis {
        /// Maximum rotation from flat [deg].
        max_angle: f64,
        /// Whether rows back off from ideal tracking to avoid row-to-row shading.
        backtrack: bool,
    },
}

/// Policy for overlapping ground shadows of adjacent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowPolicy {
    /// Overlapping shadows are fused into one interval.
    #[default]
    Merge,
    /// Each shadow keeps its own interval, trimmed so that intervals do not overlap.
    KeepDisjoint,
}

/// Number of equal-length segments per row side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCounts {
    pub front: usize,
    pub back: usize,
}

impl Default for SideCounts {
    fn default() -> Self {
        Self { front: 1, back: 1 }
    }
}

/// Discretization of the row sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretization {
    /// Segments on every front side.
    pub front: usize,
    /// Segments on every back side.
    pub back: usize,
    /// Per-row overrides keyed by row index.
    #[serde(default)]
    pub per_row: BTreeMap<usize, SideCounts>,
}

impl Discretization {
    pub fn uniform(front: usize, back: usize) -> Self {
        Self {
            front,
            back,
            per_row: BTreeMap::new(),
        }
    }

    /// Segment counts for a given row.
    pub fn counts(&self, row: usize) -> SideCounts {
        self.per_row.get(&row).copied().unwrap_or(SideCounts {
            front: self.front,
            back: self.back,
        })
    }
}

impl Default for Discretization {
    fn default() -> Self {
        Self::uniform(1, 1)
    }
}

/// Bounded ground baseline [m].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundExtent {
    pub min_x: f64,
    pub max_x: f64,
}

impl Default for GroundExtent {
    fn default() -> Self {
        Self {
            min_x: -100.0,
            max_x: 100.0,
        }
    }
}

/// Immutable array parameters, shared by every timestep of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayConfig {
    /// Number of rows.
    pub n_rows: usize,
    /// Distance between the axes of two consecutive rows [m].
    pub pitch: f64,
    /// Row width in the cross-section [m].
    pub row_width: f64,
    /// Height of the row axis above the ground [m].
    pub row_height: f64,
    /// Fixed tilt or tracker.
    pub orientation: Orientation,
    /// Azimuth of the row axis [deg from north, clockwise].
    pub axis_azimuth: f64,
    /// Ground reflectivity.
    pub albedo: f64,
    /// Reflectivity of the row front surfaces.
    pub rho_front: f64,
    /// Reflectivity of the row back surfaces.
    pub rho_back: f64,
    pub discretization: Discretization,
    pub ground: GroundExtent,
    pub shadow_policy: ShadowPolicy,
}

impl ArrayConfig {
    pub fn new() -> Self {
        Self {
            n_rows: 3,
            pitch: 5.0,
            row_width: 2.0,
            row_height: 1.5,
            orientation: Orientation::Fixed {
                tilt: 20.0,
                surface_azimuth: 180.0,
            },
            axis_azimuth: 90.0,
            albedo: 0.2,
            rho_front: 0.01,
            rho_back: 0.03,
            discretization: Discretization::default(),
            ground: GroundExtent::default(),
            shadow_policy: ShadowPolicy::Merge,
        }
    }

    /// Ground coverage ratio (`row_width / pitch`).
    pub fn gcr(&self) -> f64 {
        self.row_width / self.pitch
    }

    /// Horizontal position of the axis of row `index`.
    pub fn row_center_x(&self, index: usize) -> f64 {
        index as f64 * self.pitch
    }

    /// Checks every parameter. Fails with `Error::Configuration`.
    pub fn validate(&self) -> Result<()> {
        ensure_config!(self.n_rows >= 1, "n_rows must be at least 1");
        for (name, value) in [
            ("pitch", self.pitch),
            ("row_width", self.row_width),
            ("row_height", self.row_height),
        ] {
            ensure_config!(
                value.is_finite() && value > 0.0,
                "{name} must be positive and finite, got {value}"
            );
        }
        for (name, value) in [
            ("albedo", self.albedo),
            ("rho_front", self.rho_front),
            ("rho_back", self.rho_back),
        ] {
            ensure_config!(
                (0.0..1.0).contains(&value),
                "{name} must be in [0, 1), got {value}"
            );
        }
        ensure_config!(
            self.axis_azimuth.is_finite(),
            "axis_azimuth must be finite"
        );

        let uniform = SideCounts {
            front: self.discretization.front,
            back: self.discretization.back,
        };
        let counts = std::iter::once((None, uniform)).chain(
            self.discretization
                .per_row
                .iter()
                .map(|(&row, &c)| (Some(row), c)),
        );
        for (row, c) in counts {
            if let Some(row) = row {
                ensure_config!(
                    row < self.n_rows,
                    "discretization override for row {row}, but there are {} rows",
                    self.n_rows
                );
            }
            ensure_config!(
                c.front >= 1 && c.back >= 1,
                "discretization counts must be at least 1, got front={} back={}",
                c.front,
                c.back
            );
        }

        // Largest tilt the rows can reach, and the smallest horizontal footprint
        let (max_tilt, min_cos) = match self.orientation {
            Orientation::Fixed {
                tilt,
                surface_azimuth,
            } => {
                ensure_config!(
                    tilt.is_finite() && (0.0..180.0).contains(&tilt),
                    "tilt must be in [0, 180), got {tilt}"
                );
                ensure_config!(
                    surface_azimuth.is_finite(),
                    "surface_azimuth must be finite"
                );
                let across = (surface_azimuth - self.axis_azimuth).to_radians().sin();
                ensure_config!(
                    tilt.to_radians().sin() < 1e-9 || across.abs() > 1e-9,
                    "surface_azimuth {surface_azimuth} is parallel to the row axis {}",
                    self.axis_azimuth
                );
                (tilt, tilt.to_radians().cos().abs())
            }
            Orientation::SingleAxis { max_angle, .. } => {
                ensure_config!(
                    max_angle.is_finite() && (0.0..=90.0).contains(&max_angle),
                    "max_angle must be in [0, 90], got {max_angle}"
                );
                (max_angle, 1.0)
            }
        };

        let lowest = self.row_height - 0.5 * self.row_width * max_tilt.to_radians().sin().abs();
        ensure_config!(
            lowest > 1e-6,
            "rows touch the ground: lowest edge at {lowest:.3} m"
        );
        ensure_config!(
            self.pitch > self.row_width * min_cos + 1e-9,
            "rows overlap: pitch {} is not larger than the horizontal row footprint {:.3}",
            self.pitch,
            self.row_width * min_cos
        );

        let GroundExtent { min_x, max_x } = self.ground;
        let first = self.row_center_x(0) - self.row_width;
        let last = self.row_center_x(self.n_rows - 1) + self.row_width;
        ensure_config!(
            min_x.is_finite() && max_x.is_finite() && min_x < first && max_x > last,
            "ground extent [{min_x}, {max_x}] must contain the rows [{first}, {last}]"
        );
        Ok(())
    }
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self::new()
    }
}
