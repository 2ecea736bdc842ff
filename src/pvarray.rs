//! Geometry of an ordered array of PV rows above a flat ground.
//!
//! The array is modelled as a 2D cross-section perpendicular to the row axis:
//! `x` points to `axis_azimuth + 90°` and `y` points up, the ground is `y = 0`.

pub mod config;
pub mod layout;
pub mod registry;
pub mod shadows;
pub mod sun;
pub mod tracking;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Front,
    Back,
    Ground,
}

/// What a surface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    Ground,
    Row(usize),
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Front => write!(f, "front"),
            Side::Back => write!(f, "back"),
            Side::Ground => write!(f, "ground"),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Ground => write!(f, "ground"),
            Owner::Row(i) => write!(f, "row {i}"),
        }
    }
}
