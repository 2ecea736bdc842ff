//! Two-dimensional view-factor and radiosity model of PV row arrays.

pub mod error;
pub mod geom;
pub mod pvarray;
pub mod sim;

// Prelude
pub use error::{Error, Result};
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use pvarray::config::{ArrayConfig, Orientation};
pub use pvarray::registry::SurfaceKey;
pub use pvarray::sun::SunState;
pub use pvarray::{Owner, Side};
pub use sim::config::{ModelConfig, Reflections, SimulationConfig, SkyModel};
pub use sim::engine::Engine;
pub use sim::result::{IrradianceComponents, RadiosityResult};
