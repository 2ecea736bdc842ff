//! Discretized surfaces of one timestep.
//!
//! Every row side is split into equal segments, and each segment again at the
//! shadow bounds into lit and shaded pieces. The ground is cut at the shadow
//! bounds and where the row planes cross it. Pieces are stored in a flat arena;
//! their position in it is the index used by the view-factor matrix.
//!
//! Order: ground pieces from `-x` to `+x`, then for every row its front pieces
//! followed by its back pieces, each from the row's first edge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::EPS;
use crate::geom::interval::Interval;
use crate::geom::segment::LineSegment;
use crate::pvarray::config::ArrayConfig;
use crate::pvarray::layout::ArrayGeometry;
use crate::pvarray::shadows::ShadowSet;
use crate::pvarray::{Owner, Side};

/// Identifies a discretization segment.
///
/// Lit and shaded pieces of one row segment share the key. Every ground piece
/// has its own key, numbered from `-x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceKey {
    pub owner: Owner,
    pub side: Side,
    pub segment: usize,
}

impl SurfaceKey {
    pub fn new(owner: Owner, side: Side, segment: usize) -> Self {
        Self {
            owner,
            side,
            segment,
        }
    }

    pub fn ground(segment: usize) -> Self {
        Self::new(Owner::Ground, Side::Ground, segment)
    }

    pub fn row(row: usize, side: Side, segment: usize) -> Self {
        Self::new(Owner::Row(row), side, segment)
    }
}

/// One registered piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub index: usize,
    pub key: SurfaceKey,
    pub segment: LineSegment,
    /// Inside a direct-light shadow.
    pub shaded: bool,
    pub reflectivity: f64,
}

impl Surface {
    pub fn length(&self) -> f64 {
        self.segment.length()
    }

    pub fn is_ground(&self) -> bool {
        self.key.side == Side::Ground
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceRegistry {
    surfaces: Vec<Surface>,
    lookup: BTreeMap<SurfaceKey, Vec<usize>>,
}

impl SurfaceRegistry {
    /// Builds the registry. `albedo` is the ground reflectivity of this timestep.
    pub fn build(
        config: &ArrayConfig,
        geometry: &ArrayGeometry,
        shadows: &ShadowSet,
        albedo: f64,
    ) -> Result<Self> {
        let mut registry = Self::default();

        // Ground
        let ground = &geometry.ground;
        let (lo, hi) = (ground.start.x, ground.end.x);
        let mut cuts: Vec<f64> = shadows.ground_edges();
        cuts.extend(geometry.plane_cut_points().into_iter().flatten().map(|p| p.x));
        let shaded = shadows.ground_intervals();
        for (segment, piece) in split(Interval::new(lo, hi), &cuts).into_iter().enumerate() {
            registry.push_piece(
                ground,
                Interval::new(piece.start - lo, piece.end - lo),
                SurfaceKey::ground(segment),
                is_shaded(&piece, &shaded),
                albedo,
            )?;
        }

        // Rows
        for row in &geometry.rows {
            let counts = config.discretization.counts(row.index);
            for (side, count, reflectivity) in [
                (Side::Front, counts.front, config.rho_front),
                (Side::Back, counts.back, config.rho_back),
            ] {
                let Some(full) = row.side(side) else {
                    continue;
                };
                let width = full.length();
                let row_shadows = shadows.on_row(row.index, side);
                let cuts: Vec<f64> = row_shadows.iter().flat_map(|s| [s.start, s.end]).collect();
                for segment in 0..count {
                    let span = Interval::new(
                        width * segment as f64 / count as f64,
                        width * (segment + 1) as f64 / count as f64,
                    );
                    for piece in split(span, &cuts) {
                        registry.push_piece(
                            full,
                            piece,
                            SurfaceKey::row(row.index, side, segment),
                            is_shaded(&piece, row_shadows),
                            reflectivity,
                        )?;
                    }
                }
            }
        }
        Ok(registry)
    }

    /// Adds the piece of `parent` between two distances from its start.
    fn push_piece(
        &mut self,
        parent: &LineSegment,
        piece: Interval,
        key: SurfaceKey,
        shaded: bool,
        reflectivity: f64,
    ) -> Result<()> {
        let length = parent.length();
        let segment = parent
            .sub_segment(piece.start / length, piece.end / length)
            .ok_or_else(|| {
                Error::Geometry(format!(
                    "degenerate piece [{}, {}] of {} {}",
                    piece.start, piece.end, key.owner, key.side
                ))
            })?;
        let index = self.surfaces.len();
        self.surfaces.push(Surface {
            index,
            key,
            segment,
            shaded,
            reflectivity,
        });
        self.lookup.entry(key).or_default().push(index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn get(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }

    /// Indices of the pieces with a given key.
    pub fn lookup(&self, key: &SurfaceKey) -> &[usize] {
        self.lookup.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &SurfaceKey> {
        self.lookup.keys()
    }

    /// Pieces of one side of one owner, in order.
    pub fn side(&self, owner: Owner, side: Side) -> impl Iterator<Item = &Surface> {
        self.surfaces
            .iter()
            .filter(move |s| s.key.owner == owner && s.key.side == side)
    }

    pub fn ground(&self) -> impl Iterator<Item = &Surface> {
        self.side(Owner::Ground, Side::Ground)
    }

    pub fn lengths(&self) -> Vec<f64> {
        self.surfaces.iter().map(Surface::length).collect()
    }

    pub fn reflectivities(&self) -> Vec<f64> {
        self.surfaces.iter().map(|s| s.reflectivity).collect()
    }
}

/// Splits `span` at the cut positions that fall strictly inside it.
fn split(span: Interval, cuts: &[f64]) -> Vec<Interval> {
    let mut bounds: Vec<f64> = cuts
        .iter()
        .copied()
        .filter(|&c| c > span.start + EPS && c < span.end - EPS)
        .collect();
    bounds.sort_by(f64::total_cmp);
    bounds.dedup_by(|a, b| (*a - *b).abs() <= EPS);

    let mut pieces = Vec::with_capacity(bounds.len() + 1);
    let mut start = span.start;
    for b in bounds {
        pieces.push(Interval::new(start, b));
        start = b;
    }
    pieces.push(Interval::new(start, span.end));
    pieces
}

/// Pieces never straddle a shadow bound, so testing the midpoint is enough.
fn is_shaded(piece: &Interval, shadows: &[Interval]) -> bool {
    let mid = 0.5 * (piece.start + piece.end);
    shadows.iter().any(|s| mid > s.start && mid < s.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;
    use crate::pvarray::config::{Discretization, Orientation, ShadowPolicy, SideCounts};
    use crate::pvarray::sun::SunState;

    fn config() -> ArrayConfig {
        let mut discretization = Discretization::uniform(3, 2);
        discretization.per_row.insert(1, SideCounts { front: 1, back: 4 });
        ArrayConfig {
            n_rows: 3,
            pitch: 3.0,
            row_width: 2.0,
            row_height: 1.5,
            axis_azimuth: 0.0,
            orientation: Orientation::Fixed {
                tilt: 30.0,
                surface_azimuth: 270.0,
            },
            discretization,
            ..ArrayConfig::default()
        }
    }

    fn build(config: &ArrayConfig, sun: &SunState) -> anyhow::Result<SurfaceRegistry> {
        let geometry = ArrayGeometry::build(config, sun)?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        Ok(SurfaceRegistry::build(config, &geometry, &shadows, 0.2)?)
    }

    #[test]
    fn test_pieces_partition_each_side() -> anyhow::Result<()> {
        let config = config();
        let registry = build(&config, &SunState::new(75.0, 270.0, 800.0, 100.0))?;

        let ground: Vec<&Surface> = registry.ground().collect();
        let total: f64 = ground.iter().map(|s| s.length()).sum();
        assert!((total - 200.0).abs() < 1e-9, "ground total = {total}");
        for pair in ground.windows(2) {
            assert!(pair[0].segment.end.is_close(&pair[1].segment.start));
        }

        for row in 0..config.n_rows {
            for side in [Side::Front, Side::Back] {
                let pieces: Vec<&Surface> = registry.side(Owner::Row(row), side).collect();
                let total: f64 = pieces.iter().map(|s| s.length()).sum();
                assert!(total.is_close(2.0), "row {row} {side}: {total}");
                for pair in pieces.windows(2) {
                    assert!(pair[0].segment.end.is_close(&pair[1].segment.start));
                    assert!(pair[0].key.segment <= pair[1].key.segment);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_order_and_lookup() -> anyhow::Result<()> {
        let config = config();
        let registry = build(&config, &SunState::new(30.0, 270.0, 800.0, 100.0))?;
        for (i, s) in registry.surfaces().iter().enumerate() {
            assert_eq!(s.index, i);
            for &j in registry.lookup(&s.key) {
                assert_eq!(registry.get(j).map(|o| o.key), Some(s.key));
            }
        }
        // Ground first, then row 0 front, row 0 back, row 1 front...
        let order: Vec<(Owner, Side)> = registry
            .surfaces()
            .iter()
            .map(|s| (s.key.owner, s.key.side))
            .fold(Vec::new(), |mut acc, k| {
                if acc.last() != Some(&k) {
                    acc.push(k);
                }
                acc
            });
        assert_eq!(order[0], (Owner::Ground, Side::Ground));
        assert_eq!(order[1], (Owner::Row(0), Side::Front));
        assert_eq!(order[2], (Owner::Row(0), Side::Back));
        assert_eq!(order[3], (Owner::Row(1), Side::Front));
        assert_eq!(order.len(), 7);

        // Per-row override: one front segment and four back segments on row 1
        assert!(registry.lookup(&SurfaceKey::row(1, Side::Front, 1)).is_empty());
        assert!(!registry.lookup(&SurfaceKey::row(1, Side::Back, 3)).is_empty());
        assert!(!registry.lookup(&SurfaceKey::row(0, Side::Front, 2)).is_empty());
        Ok(())
    }

    #[test]
    fn test_shaded_pieces_and_reflectivity() -> anyhow::Result<()> {
        let config = config();
        let registry = build(&config, &SunState::new(75.0, 270.0, 800.0, 100.0))?;

        // Row 0 is not shaded, rows 1 and 2 have shaded front pieces
        assert!(registry.side(Owner::Row(0), Side::Front).all(|s| !s.shaded));
        assert!(registry.side(Owner::Row(1), Side::Front).any(|s| s.shaded));
        assert!(registry.side(Owner::Row(1), Side::Back).all(|s| !s.shaded));
        assert!(registry.ground().any(|s| s.shaded));

        for s in registry.surfaces() {
            let expected = match s.key.side {
                Side::Ground => 0.2,
                Side::Front => config.rho_front,
                Side::Back => config.rho_back,
            };
            assert_eq!(s.reflectivity, expected);
        }
        Ok(())
    }

    #[test]
    fn test_ground_cut_at_plane_points() -> anyhow::Result<()> {
        let config = config();
        let geometry = ArrayGeometry::build(&config, &SunState::new(100.0, 270.0, 0.0, 0.0))?;
        let shadows = ShadowSet::cast(&geometry, ShadowPolicy::Merge)?;
        let registry = SurfaceRegistry::build(&config, &geometry, &shadows, 0.2)?;
        // Night: only the three plane cut points split the ground
        assert_eq!(registry.ground().count(), 4);
        for cut in geometry.plane_cut_points().into_iter().flatten() {
            assert!(
                registry.ground().any(|s| s.segment.start.is_close(&cut)),
                "no ground piece starts at {cut}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_split() {
        let pieces = split(Interval::new(0.0, 4.0), &[3.0, -1.0, 1.0, 1.0 + 1e-12, 4.0]);
        assert_eq!(
            pieces,
            vec![
                Interval::new(0.0, 1.0),
                Interval::new(1.0, 3.0),
                Interval::new(3.0, 4.0)
            ]
        );
    }
}
