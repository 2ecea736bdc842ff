//! Irradiance model: shading, view factors and the radiosity solve.

pub mod batch;
pub mod config;
pub mod engine;
pub mod irradiance;
pub mod perez;
pub mod result;
pub mod shading;
pub mod solve;
pub mod view_factors;
