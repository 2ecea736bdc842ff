//! Row orientation for one timestep.
//!
//! Fixed-tilt rows keep the configured pose. Single-axis trackers follow the
//! sun in the cross-section plane, optionally backtracking so that rows do not
//! shade each other, and lie flat while the sun is down.

use crate::Vector;
use crate::pvarray::config::{ArrayConfig, Orientation};
use crate::pvarray::sun::SunState;

/// Direction the front surface faces along the cross-section `x` axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    PositiveX,
    NegativeX,
}

/// Tilt and facing of every row at one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPose {
    /// Surface tilt from horizontal [deg], in `[0, 180)`.
    pub tilt: f64,
    pub facing: Facing,
}

impl RowPose {
    /// Pose from a signed rotation [deg], positive when the front faces `+x`.
    pub fn from_rotation(rotation: f64) -> Self {
        let facing = if rotation >= 0.0 {
            Facing::PositiveX
        } else {
            Facing::NegativeX
        };
        Self {
            tilt: rotation.abs(),
            facing,
        }
    }

    fn sign(&self) -> f64 {
        match self.facing {
            Facing::PositiveX => 1.0,
            Facing::NegativeX => -1.0,
        }
    }

    /// Signed rotation [deg], positive when the front faces `+x`.
    pub fn rotation(&self) -> f64 {
        self.sign() * self.tilt
    }

    /// Outward unit normal of the front surface.
    pub fn front_normal(&self) -> Vector {
        let beta = self.tilt.to_radians();
        Vector::new(self.sign() * beta.sin(), beta.cos())
    }

    /// Unit vector along the row width, from its first to its second edge.
    pub fn along(&self) -> Vector {
        let beta = self.tilt.to_radians();
        Vector::new(beta.cos(), -self.sign() * beta.sin())
    }
}

/// Rotation of a single-axis tracker [deg], positive toward `+x`.
///
/// `sun` is the in-plane solar vector (see [`SunState::in_plane_vector`]).
/// Backtracking uses the ground coverage ratio `gcr`.
pub fn tracker_rotation(sun: Vector, sun_up: bool, gcr: f64, max_angle: f64, backtrack: bool) -> f64 {
    if !sun_up {
        return 0.0;
    }
    let ideal = sun.dx.atan2(sun.dy).to_degrees();
    let mut rotation = ideal;
    if backtrack {
        let temp = (ideal.to_radians().cos() / gcr).min(1.0);
        let correction = temp.acos().to_degrees();
        rotation = if ideal < 0.0 {
            ideal + correction
        } else {
            ideal - correction
        };
    }
    rotation.clamp(-max_angle, max_angle)
}

/// Pose of the rows for the given sun position.
pub fn row_pose(config: &ArrayConfig, sun: &SunState) -> RowPose {
    match config.orientation {
        Orientation::Fixed {
            tilt,
            surface_azimuth,
        } => {
            let across = (surface_azimuth - config.axis_azimuth).to_radians().sin();
            let facing = if across >= 0.0 {
                Facing::PositiveX
            } else {
                Facing::NegativeX
            };
            RowPose { tilt, facing }
        }
        Orientation::SingleAxis {
            max_angle,
            backtrack,
        } => {
            let rotation = tracker_rotation(
                sun.in_plane_vector(config.axis_azimuth),
                sun.is_up(),
                config.gcr(),
                max_angle,
                backtrack,
            );
            RowPose::from_rotation(rotation)
        }
    }
}
