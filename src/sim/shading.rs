//! Shading fractions of every registered surface.
//!
//! Three fractions are computed per surface, each in `[0, 1]`:
//! - direct: share of the surface length inside a direct-light shadow,
//! - circumsolar: share of the circumsolar disk hidden by rows or by the
//!   ground, seen from the surface midpoint,
//! - horizon: share of the horizon band on the side the surface faces hidden
//!   by rows.
//!
//! Conventions:
//! - Angles in the cross-section are measured from `+x`, counter-clockwise.
//! - The circumsolar disk is centred on the in-plane sun direction and spans
//!   `circumsolar_angle`; its coverage is weighted as a uniform disk seen
//!   edge-on, i.e. proportionally to `sqrt(1 - u^2)` across the window.
//! - The horizon band spans elevations `[0, horizon_band_angle]` and is
//!   weighted uniformly.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::Point;
use crate::geom::interval::{Interval, covered_length, union};
use crate::pvarray::layout::ArrayGeometry;
use crate::pvarray::registry::{Surface, SurfaceRegistry};
use crate::pvarray::shadows::ShadowSet;
use crate::pvarray::{Owner, Side};
use crate::sim::config::ModelConfig;

/// Shaded fractions of one surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadingFractions {
    pub direct: f64,
    pub circumsolar: f64,
    pub horizon: f64,
}

/// Computes the shading fractions of all surfaces, in registry order.
pub fn shading_fractions(
    registry: &SurfaceRegistry,
    geometry: &ArrayGeometry,
    shadows: &ShadowSet,
    model: &ModelConfig,
) -> Vec<ShadingFractions> {
    registry
        .surfaces()
        .iter()
        .map(|surface| ShadingFractions {
            direct: direct_fraction(surface, geometry, shadows),
            circumsolar: circumsolar_fraction(surface, geometry, model.circumsolar_angle),
            horizon: horizon_fraction(surface, geometry, model.horizon_band_angle),
        })
        .collect()
}

/// Share of the surface inside shadow intervals.
pub fn direct_fraction(surface: &Surface, geometry: &ArrayGeometry, shadows: &ShadowSet) -> f64 {
    if !shadows.sun_up {
        return 0.0;
    }
    let length = surface.length();
    let seg = &surface.segment;
    let (span, intervals) = match surface.key.owner {
        Owner::Ground => (
            Interval::new(seg.start.x, seg.end.x),
            shadows.ground_intervals(),
        ),
        Owner::Row(r) => {
            let Some(row) = geometry.rows.get(r) else {
                return 0.0;
            };
            // Shadow positions are measured from the row's first edge
            let span = Interval::new(row.front.abscissa(seg.start), row.front.abscissa(seg.end));
            (span, shadows.on_row(r, surface.key.side).to_vec())
        }
    };
    (covered_length(&intervals, &span) / length).clamp(0.0, 1.0)
}

/// Share of the circumsolar disk hidden from the surface midpoint.
pub fn circumsolar_fraction(surface: &Surface, geometry: &ArrayGeometry, angle: f64) -> f64 {
    if !geometry.sun_up {
        return 0.0;
    }
    let from = surface.segment.midpoint();
    let center = geometry.sun.angle();
    let half = 0.5 * angle.to_radians();

    let mut blocked = row_arcs(from, center, surface, geometry);
    // Ground: every direction below the horizontal
    blocked.extend(relative_arc(center, -PI, 0.0));

    union(&blocked)
        .iter()
        .filter_map(|arc| arc.clip(-half, half))
        .map(|arc| disk_coverage(arc.end / half) - disk_coverage(arc.start / half))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Share of the horizon band hidden by rows from the surface midpoint.
///
/// Ground and horizontal surfaces do not see a horizon band.
pub fn horizon_fraction(surface: &Surface, geometry: &ArrayGeometry, band: f64) -> f64 {
    let normal = surface.segment.normal;
    if surface.key.side == Side::Ground || normal.dx.abs() < 1e-12 {
        return 0.0;
    }
    let band = band.to_radians();
    let half = 0.5 * band;
    // Band centre: just above the horizon, on the side the surface faces
    let center = if normal.dx > 0.0 { half } else { PI - half };
    let from = surface.segment.midpoint();

    let arcs = row_arcs(from, center, surface, geometry);
    (covered_length(&arcs, &Interval::new(-half, half)) / band).clamp(0.0, 1.0)
}

/// Share of a uniform disk lying left of the chord at normalized position `u`.
fn disk_coverage(u: f64) -> f64 {
    let u = u.clamp(-1.0, 1.0);
    (PI - u.acos() + u * (1.0 - u * u).sqrt()) / PI
}

/// Wraps an angle into `[-pi, pi]`.
fn wrap(angle: f64) -> f64 {
    angle - 2.0 * PI * (angle / (2.0 * PI)).round()
}

/// Absolute arc `[a0, a1]` expressed relative to `center`, split if it wraps.
fn relative_arc(center: f64, a0: f64, a1: f64) -> Vec<Interval> {
    let d0 = wrap(a0 - center);
    let d1 = d0 + (a1 - a0);
    if d1 <= PI {
        vec![Interval::new(d0, d1)]
    } else {
        vec![Interval::new(d0, PI), Interval::new(-PI, d1 - 2.0 * PI)]
    }
}

/// Angular extent of every other row seen from `from`, relative to `center`.
fn row_arcs(from: Point, center: f64, surface: &Surface, geometry: &ArrayGeometry) -> Vec<Interval> {
    let mut arcs = Vec::with_capacity(geometry.rows.len());
    for row in &geometry.rows {
        if surface.key.owner == Owner::Row(row.index) {
            continue;
        }
        let angle_to = |p: Point| wrap((p.y - from.y).atan2(p.x - from.x) - center);
        let d0 = angle_to(row.front.start);
        let d1 = angle_to(row.front.end);
        let (lo, hi) = (d0.min(d1), d0.max(d1));
        if hi - lo <= PI {
            arcs.push(Interval::new(lo, hi));
        } else {
            // The row straddles the direction opposite to the centre
            arcs.push(Interval::new(hi, PI));
            arcs.push(Interval::new(-PI, lo));
        }
    }
    arcs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvarray::config::{ArrayConfig, Discretization, Orientation, ShadowPolicy};
    use crate::pvarray::registry::SurfaceKey;
    use crate::pvarray::sun::SunState;

    struct Case {
        geometry: ArrayGeometry,
        registry: SurfaceRegistry,
        fractions: Vec<ShadingFractions>,
    }

    impl Case {
        fn new(config: &ArrayConfig, sun: &SunState) -> anyhow::Result<Self> {
            let geometry = ArrayGeometry::build(config, sun)?;
            let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
            let registry = SurfaceRegistry::build(config, &geometry, &shadows, config.albedo)?;
            let fractions = shading_fractions(&registry, &geometry, &shadows, &ModelConfig::default());
            Ok(Self {
                geometry,
                registry,
                fractions,
            })
        }

        fn of(&self, row: usize, side: Side) -> ShadingFractions {
            self.fractions[self.registry.lookup(&SurfaceKey::row(row, side, 0))[0]]
        }
    }

    fn two_rows() -> ArrayConfig {
        ArrayConfig {
            n_rows: 2,
            pitch: 4.0,
            row_width: 2.0,
            row_height: 1.5,
            discretization: Discretization::uniform(1, 1),
            ..ArrayConfig::default()
        }
    }

    #[test]
    fn test_disk_coverage() {
        assert!(disk_coverage(-1.0).abs() < 1e-12);
        assert!((disk_coverage(0.0) - 0.5).abs() < 1e-12);
        assert!((disk_coverage(1.0) - 1.0).abs() < 1e-12);
        // Centre weighted more than the edges
        assert!(disk_coverage(-0.5) < 0.25);
    }

    #[test]
    fn test_wrap_and_relative_arc() {
        assert!((wrap(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        let arcs = relative_arc(PI - 0.1, -PI, 0.0);
        let total: f64 = arcs.iter().map(Interval::length).sum();
        assert!((total - PI).abs() < 1e-12);
        assert_eq!(arcs.len(), 2);
    }

    #[test]
    fn test_direct_fraction_follows_shaded_pieces() -> anyhow::Result<()> {
        let mut config = two_rows();
        config.discretization = Discretization::uniform(2, 1);
        // Low sun from the south: row 1 shades the front of row 0
        let case = Case::new(&config, &SunState::new(80.0, 180.0, 800.0, 100.0))?;
        let mut shaded_length = 0.0;
        for s in case.registry.surfaces() {
            let f = case.fractions[s.index].direct;
            let expected = if s.shaded { 1.0 } else { 0.0 };
            assert!((f - expected).abs() < 1e-9, "surface {} direct {f}", s.index);
            if s.key.owner == Owner::Row(0) && s.key.side == Side::Front {
                shaded_length += f * s.length();
            }
        }
        assert!(shaded_length > 0.0);
        Ok(())
    }

    #[test]
    fn test_horizon_shading_of_facing_row() -> anyhow::Result<()> {
        let config = ArrayConfig {
            n_rows: 2,
            pitch: 4.0,
            row_width: 2.0,
            row_height: 1.5,
            orientation: Orientation::Fixed {
                tilt: 20.0,
                surface_azimuth: 180.0,
            },
            discretization: Discretization::uniform(1, 1),
            ..ArrayConfig::default()
        };
        let case = Case::new(&config, &SunState::new(30.0, 180.0, 800.0, 100.0))?;
        // Row 0 front faces row 1, row 1 front is open
        assert!(case.of(0, Side::Front).horizon > 0.5);
        assert_eq!(case.of(1, Side::Front).horizon, 0.0);
        // And symmetrically for the backs
        assert!(case.of(1, Side::Back).horizon > 0.0);
        assert_eq!(case.of(0, Side::Back).horizon, 0.0);
        // Ground has no horizon band
        for s in case.registry.ground() {
            assert_eq!(case.fractions[s.index].horizon, 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_circumsolar_shading() -> anyhow::Result<()> {
        let config = two_rows();
        // High sun: the disk is well above the horizon and the other row
        let case = Case::new(&config, &SunState::new(10.0, 180.0, 800.0, 100.0))?;
        assert_eq!(case.of(1, Side::Front).circumsolar, 0.0);

        // Sun at 80 deg zenith: the disk reaches below the horizon
        let case = Case::new(&config, &SunState::new(80.0, 180.0, 800.0, 100.0))?;
        let open = case.of(1, Side::Front).circumsolar;
        let behind = case.of(0, Side::Front).circumsolar;
        assert!(open > 0.0 && open < 1.0, "open row: {open}");
        assert!(behind > open, "row 0 {behind} vs row 1 {open}");

        // Sun down: no direct or circumsolar shading
        let case = Case::new(&config, &SunState::new(95.0, 180.0, 0.0, 0.0))?;
        assert!(!case.geometry.sun_up);
        assert!(case.fractions.iter().all(|f| f.direct == 0.0 && f.circumsolar == 0.0));
        Ok(())
    }
}
