//! Shadows cast by the rows on the ground and on each other.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::EPS;
use crate::geom::interval::{Interval, union};
use crate::geom::segment::line_intersection;
use crate::pvarray::Side;
use crate::pvarray::config::ShadowPolicy;
use crate::pvarray::layout::ArrayGeometry;
use crate::{Point, Vector};

/// Shadow on the ground and the rows casting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundShadow {
    /// Position along the ground `x` axis [m].
    pub interval: Interval,
    pub casters: Vec<usize>,
}

/// All shadows of one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowSet {
    pub sun_up: bool,
    pub illuminated_side: Option<Side>,
    /// Ground shadows sorted by position, never overlapping.
    pub ground: Vec<GroundShadow>,
    /// Shaded intervals on the illuminated side of each row, as distances
    /// from the row's first edge [m].
    pub rows: Vec<Vec<Interval>>,
}

impl ShadowSet {
    /// No shadows at all (sun below the horizon).
    pub fn empty(n_rows: usize) -> Self {
        Self {
            sun_up: false,
            illuminated_side: None,
            ground: Vec::new(),
            rows: vec![Vec::new(); n_rows],
        }
    }

    /// Casts the row shadows for the sun position stored in `geometry`.
    pub fn cast(geometry: &ArrayGeometry, policy: ShadowPolicy) -> Result<Self> {
        if !geometry.sun_up {
            return Ok(Self::empty(geometry.rows.len()));
        }
        let ground = ground_shadows(geometry, policy)?;
        let illuminated_side = geometry.illuminated_side();
        let rows = match illuminated_side {
            Some(_) => row_shadows(geometry)?,
            None => vec![Vec::new(); geometry.rows.len()],
        };
        Ok(Self {
            sun_up: true,
            illuminated_side,
            ground,
            rows,
        })
    }

    /// Shaded intervals on a row side (empty unless the side is illuminated).
    pub fn on_row(&self, row: usize, side: Side) -> &[Interval] {
        match self.rows.get(row) {
            Some(shadows) if self.illuminated_side == Some(side) => shadows,
            _ => &[],
        }
    }

    pub fn ground_intervals(&self) -> Vec<Interval> {
        self.ground.iter().map(|s| s.interval).collect()
    }

    /// Shadow bounds on the ground [m].
    pub fn ground_edges(&self) -> Vec<f64> {
        self.ground
            .iter()
            .flat_map(|s| [s.interval.start, s.interval.end])
            .collect()
    }

    pub fn shaded_ground_length(&self) -> f64 {
        self.ground.iter().map(|s| s.interval.length()).sum()
    }
}

/// Projects a point along the sun rays onto the ground.
fn project_on_ground(pt: Point, sun: Vector) -> Result<f64> {
    let x = pt.x - pt.y * sun.dx / sun.dy;
    if !x.is_finite() {
        return Err(Error::Geometry(format!(
            "shadow of {pt} is not finite for sun vector {sun}"
        )));
    }
    Ok(x)
}

fn ground_shadows(geometry: &ArrayGeometry, policy: ShadowPolicy) -> Result<Vec<GroundShadow>> {
    let mut raw = Vec::with_capacity(geometry.rows.len());
    for row in &geometry.rows {
        let a = project_on_ground(row.front.start, geometry.sun)?;
        let b = project_on_ground(row.front.end, geometry.sun)?;
        raw.push(GroundShadow {
            interval: Interval::new(a, b),
            casters: vec![row.index],
        });
    }
    raw.sort_by(|a, b| a.interval.start.total_cmp(&b.interval.start));

    let mut shadows: Vec<GroundShadow> = Vec::with_capacity(raw.len());
    for shadow in raw {
        match policy {
            ShadowPolicy::Merge => match shadows.last_mut() {
                Some(last) if shadow.interval.start <= last.interval.end + EPS => {
                    last.interval.end = last.interval.end.max(shadow.interval.end);
                    last.casters.extend(shadow.casters);
                }
                _ => shadows.push(shadow),
            },
            ShadowPolicy::KeepDisjoint => {
                let mut shadow = shadow;
                if let Some(last) = shadows.last() {
                    shadow.interval.start = shadow.interval.start.max(last.interval.end);
                }
                if shadow.interval.length() > EPS {
                    shadows.push(shadow);
                }
            }
        }
    }

    let (lo, hi) = (geometry.ground.start.x, geometry.ground.end.x);
    Ok(shadows
        .into_iter()
        .filter_map(|s| {
            s.interval.clip(lo, hi).map(|interval| GroundShadow {
                interval,
                casters: s.casters,
            })
        })
        .collect())
}

/// Traces every row edge along the sun rays onto the lines of the other rows.
fn row_shadows(geometry: &ArrayGeometry) -> Result<Vec<Vec<Interval>>> {
    let ray = -geometry.sun;
    let mut all = Vec::with_capacity(geometry.rows.len());
    for row in &geometry.rows {
        let width = row.width();
        let mut shadows = Vec::new();
        for caster in geometry.rows.iter().filter(|r| r.index != row.index) {
            let mut ends = Vec::with_capacity(2);
            for pt in [caster.front.start, caster.front.end] {
                // The caster must sit between the sun and the row line
                if let Some((s, t)) = line_intersection(pt, ray, row.front.start, row.front.end)
                    && s > EPS
                {
                    ends.push(t * width);
                }
            }
            if let [a, b] = ends[..] {
                if !a.is_finite() || !b.is_finite() {
                    return Err(Error::Geometry(format!(
                        "shadow of row {} on row {} is not finite",
                        caster.index, row.index
                    )));
                }
                if let Some(iv) = Interval::new(a, b).clip(0.0, width) {
                    shadows.push(iv);
                }
            }
        }
        all.push(union(&shadows));
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pvarray::config::{ArrayConfig, GroundExtent, Orientation};
    use crate::pvarray::sun::SunState;

    /// Rows facing +x, sun in the cross-section plane.
    fn config(n_rows: usize, pitch: f64, tilt: f64) -> ArrayConfig {
        ArrayConfig {
            n_rows,
            pitch,
            row_width: 2.0,
            row_height: 1.5,
            axis_azimuth: 0.0,
            orientation: Orientation::Fixed {
                tilt,
                surface_azimuth: 90.0,
            },
            ..ArrayConfig::default()
        }
    }

    fn sun_toward_x(zenith: f64) -> SunState {
        SunState::new(zenith, 90.0, 800.0, 100.0)
    }

    #[test]
    fn test_ground_shadow_of_flat_row() -> anyhow::Result<()> {
        let geometry = ArrayGeometry::build(&config(1, 5.0, 0.0), &sun_toward_x(45.0))?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        assert_eq!(shadows.ground.len(), 1);
        // Shifted away from the sun by height * tan(zenith)
        let iv = shadows.ground[0].interval;
        assert!((iv.start - (-1.0 - 1.5)).abs() < 1e-9, "start = {}", iv.start);
        assert!((iv.end - (1.0 - 1.5)).abs() < 1e-9, "end = {}", iv.end);
        assert_eq!(shadows.ground[0].casters, vec![0]);
        assert!(shadows.rows[0].is_empty());
        Ok(())
    }

    #[test]
    fn test_sun_below_horizon_casts_nothing() -> anyhow::Result<()> {
        let geometry = ArrayGeometry::build(&config(3, 5.0, 20.0), &sun_toward_x(95.0))?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        assert!(!shadows.sun_up);
        assert!(shadows.ground.is_empty());
        assert!(shadows.rows.iter().all(Vec::is_empty));
        assert_eq!(shadows.illuminated_side, None);
        Ok(())
    }

    #[test]
    fn test_merge_and_keep_disjoint() -> anyhow::Result<()> {
        // Low sun: ground shadows of adjacent rows overlap
        let geometry = ArrayGeometry::build(&config(3, 4.0, 40.0), &sun_toward_x(80.0))?;

        let merged = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        assert_eq!(merged.ground.len(), 1);
        assert_eq!(merged.ground[0].casters, vec![0, 1, 2]);

        let disjoint = ShadowSet::cast(&geometry, ShadowPolicy::KeepDisjoint)?;
        assert_eq!(disjoint.ground.len(), 3);
        for pair in disjoint.ground.windows(2) {
            assert!(pair[0].interval.end <= pair[1].interval.start + 1e-12);
        }
        // Both policies shade the same stretch of ground
        let diff = merged.shaded_ground_length() - disjoint.shaded_ground_length();
        assert!(diff.abs() < 1e-9, "diff = {diff}");
        Ok(())
    }

    #[test]
    fn test_row_to_row_shading() -> anyhow::Result<()> {
        let mut config = config(3, 3.0, 30.0);
        config.orientation = Orientation::Fixed {
            tilt: 30.0,
            surface_azimuth: 270.0,
        };
        // Front faces -x, sun low toward -x: rows to the left shade the fronts
        // of the rows to their right
        let sun = SunState::new(75.0, 270.0, 800.0, 100.0);
        let geometry = ArrayGeometry::build(&config, &sun)?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        assert_eq!(shadows.illuminated_side, Some(Side::Front));
        assert!(shadows.rows[0].is_empty(), "first row sees the sun");
        for i in 1..3 {
            let shaded: f64 = shadows.on_row(i, Side::Front).iter().map(Interval::length).sum();
            assert!(shaded > 0.0 && shaded < 2.0, "row {i} shaded {shaded}");
            assert!(shadows.on_row(i, Side::Back).is_empty());
        }
        // Same caster geometry for every shaded row
        let a = shadows.rows[1][0];
        let b = shadows.rows[2][0];
        assert!((a.length() - b.length()).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_high_sun_no_row_shading() -> anyhow::Result<()> {
        let geometry = ArrayGeometry::build(&config(3, 6.0, 20.0), &sun_toward_x(10.0))?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        assert!(shadows.rows.iter().all(Vec::is_empty));
        assert_eq!(shadows.ground.len(), 3);
        Ok(())
    }

    #[test]
    fn test_shadow_clipped_to_ground() -> anyhow::Result<()> {
        let mut config = config(1, 5.0, 0.0);
        config.ground = GroundExtent {
            min_x: -3.0,
            max_x: 3.0,
        };
        // Shadow spans [-1 - 1.5 tan z, 1 - 1.5 tan z]
        let geometry = ArrayGeometry::build(&config, &sun_toward_x(60.0))?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        assert_eq!(shadows.ground.len(), 1);
        assert!((shadows.ground[0].interval.start + 3.0).abs() < 1e-12);

        let geometry = ArrayGeometry::build(&config, &sun_toward_x(85.0))?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        assert!(shadows.ground.is_empty(), "shadow falls outside the ground");
        Ok(())
    }
}
