//! View factors between the registered surfaces and the sky.
//!
//! Pairs of mutually facing segments use Hottel's crossed-strings rule:
//!
//! `L_i * F_ij = ((ad + bc) - (ac + bd)) / 2`
//!
//! When rows stand between two surfaces, `i` is cut into pieces along which
//! the same edges (ends of `j` or of a blocking row) bound the part of `j`
//! that is visible. On each piece the rule holds again with strings tied to
//! those edges, since `d|PQ|/ds = -sin(theta)` for a point `P` moving along
//! `i` and `theta` the direction of `Q` from the normal of `i`. A pair hidden
//! by a row has no visible part and exchanges nothing.
//!
//! The last row and column of the matrix belong to the sky. It receives
//! whatever each surface does not see of the other surfaces, and emits nothing
//! back (its row is zero).

use ndarray as nd;

use crate::error::{Error, Result};
use crate::geom::EPS;
use crate::geom::segment::{LineSegment, line_intersection};
use crate::pvarray::Owner;
use crate::pvarray::layout::ArrayGeometry;
use crate::pvarray::registry::SurfaceRegistry;
use crate::{Point, Vector};

/// Round-off allowed on the sum of the view factors leaving one surface.
const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Angular precision [rad].
const ANGLE_EPS: f64 = 1e-12;

/// Dense `(N+1) x (N+1)` view-factor matrix, the last index being the sky.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFactorMatrix {
    matrix: nd::Array2<f64>,
}

impl ViewFactorMatrix {
    /// Computes the view factors of every registered surface.
    ///
    /// Fails with `Error::NumericalInstability` if the view factors leaving a
    /// surface add up to more than one.
    pub fn build(registry: &SurfaceRegistry, geometry: &ArrayGeometry) -> Result<Self> {
        let n = registry.len();
        let surfaces = registry.surfaces();
        let lengths = registry.lengths();
        let edges = geometry.row_edges();

        let mut matrix = nd::Array2::<f64>::zeros((n + 1, n + 1));
        for i in 0..n {
            for j in (i + 1)..n {
                let (si, sj) = (&surfaces[i], &surfaces[j]);
                if !si.segment.faces(&sj.segment) {
                    continue;
                }
                // Rows of the two surfaces never stand between them
                let blockers: Vec<(Point, Point)> = edges
                    .iter()
                    .enumerate()
                    .filter(|&(row, _)| {
                        let owner = Owner::Row(row);
                        owner != si.key.owner && owner != sj.key.owner
                    })
                    .map(|(_, &edge)| edge)
                    .collect();
                // Exchange L_i F_ij, shared by both directions
                let exchange = crossed_strings(&si.segment, &sj.segment, &blockers);
                if !exchange.is_finite() || exchange <= 0.0 {
                    continue;
                }
                matrix[[i, j]] = exchange / lengths[i];
                matrix[[j, i]] = exchange / lengths[j];
            }
        }

        enforce_reciprocity_and_normalize(&mut matrix, &lengths)?;
        Ok(Self { matrix })
    }

    /// Number of registered surfaces (the sky excluded).
    pub fn n_surfaces(&self) -> usize {
        self.matrix.nrows().saturating_sub(1)
    }

    pub fn sky_index(&self) -> usize {
        self.n_surfaces()
    }

    /// `F_ij`; `j == sky_index()` gives the sky view factor.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[[i, j]]
    }

    /// View factor from surface `i` to the sky.
    pub fn sky(&self, i: usize) -> f64 {
        self.matrix[[i, self.sky_index()]]
    }

    /// Sum of the view factors from surface `i` to the other surfaces.
    pub fn surface_sum(&self, i: usize) -> f64 {
        let n = self.n_surfaces();
        self.matrix.row(i).slice(nd::s![..n]).sum()
    }

    pub fn matrix(&self) -> &nd::Array2<f64> {
        &self.matrix
    }

    /// Surface-to-surface block, the sky excluded.
    pub fn surfaces_block(&self) -> nd::ArrayView2<'_, f64> {
        let n = self.n_surfaces();
        self.matrix.slice(nd::s![..n, ..n])
    }
}

/// Symmetrizes `L_i F_ij`, clears the diagonal and fills the sky column with
/// the remainder.
///
/// Row sums above one by round-off are scaled down. Larger excesses fail.
fn enforce_reciprocity_and_normalize(matrix: &mut nd::Array2<f64>, lengths: &[f64]) -> Result<()> {
    let n = lengths.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let (li, lj) = (lengths[i], lengths[j]);
            if li <= 0.0 || lj <= 0.0 {
                continue;
            }
            let avg = 0.5 * (li * matrix[[i, j]] + lj * matrix[[j, i]]);
            matrix[[i, j]] = avg / li;
            matrix[[j, i]] = avg / lj;
        }
    }

    for i in 0..n {
        matrix[[i, i]] = 0.0;
    }

    for i in 0..n {
        let row_sum: f64 = (0..n).map(|j| matrix[[i, j]]).sum();
        if row_sum > 1.0 + ROW_SUM_TOLERANCE {
            return Err(Error::NumericalInstability(format!(
                "view factors of surface {i} add up to {row_sum:.6}"
            )));
        }
        if row_sum > 1.0 {
            for j in 0..n {
                matrix[[i, j]] /= row_sum;
            }
        }
        let sky = 1.0 - (0..n).map(|j| matrix[[i, j]]).sum::<f64>();
        matrix[[i, n]] = sky.clamp(0.0, 1.0);
    }
    Ok(())
}

/// `L_i F_ij` for two facing segments, with `blockers` standing between them.
fn crossed_strings(si: &LineSegment, sj: &LineSegment, blockers: &[(Point, Point)]) -> f64 {
    let blockers: Vec<(Point, Point)> = blockers
        .iter()
        .filter_map(|&(a, b)| clip_in_front(si, a, b))
        .collect();
    let frame = Frame::new(si);
    let length = si.length();

    // Points that can bound the visible part of `sj`
    let mut edges = vec![sj.start, sj.end];
    edges.extend(blockers.iter().flat_map(|&(a, b)| [a, b]));

    // The bounding edges change where a line through two of them crosses `si`
    let margin = EPS / length;
    let mut cuts = vec![0.0, 1.0];
    for (k, &p) in edges.iter().enumerate() {
        for &q in &edges[k + 1..] {
            if let Some((_, t)) = line_intersection(p, Vector::from_points(p, q), si.start, si.end)
                && t > margin
                && t < 1.0 - margin
            {
                cuts.push(t);
            }
        }
    }
    cuts.sort_by(f64::total_cmp);
    cuts.dedup_by(|a, b| (*a - *b).abs() <= margin);

    let mut exchange = 0.0;
    for piece in cuts.windows(2) {
        let (p0, p1) = (si.point_at(piece[0]), si.point_at(piece[1]));
        let mid = si.point_at(0.5 * (piece[0] + piece[1]));
        let stretch = |q: Point| q.distance(&p1) - q.distance(&p0);
        for window in visible_windows(&frame, mid, (sj.start, sj.end), &blockers) {
            exchange += 0.5 * (stretch(window.lo.point) - stretch(window.hi.point));
        }
    }
    exchange
}

/// Part of the segment `a`-`b` on the normal side of `si`.
fn clip_in_front(si: &LineSegment, a: Point, b: Point) -> Option<(Point, Point)> {
    let (da, db) = (si.signed_distance(a), si.signed_distance(b));
    if da <= EPS && db <= EPS {
        return None;
    }
    if da >= 0.0 && db >= 0.0 {
        return Some((a, b));
    }
    let crossing = Point::new_between_2_points(a, b, da / (da - db));
    Some(if da > 0.0 { (a, crossing) } else { (crossing, b) })
}

/// Directions seen from a point of a surface, as angles from its normal,
/// positive towards the surface end.
struct Frame {
    normal: Vector,
    along: Vector,
}

impl Frame {
    fn new(seg: &LineSegment) -> Self {
        Self {
            normal: seg.normal,
            along: seg.direction(),
        }
    }

    fn angle(&self, from: Point, to: Point) -> f64 {
        let v = Vector::from_points(from, to);
        v.dot(self.along).atan2(v.dot(self.normal))
    }

    fn direction(&self, angle: f64) -> Vector {
        self.normal * angle.cos() + self.along * angle.sin()
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    angle: f64,
    point: Point,
}

/// Angular window bounded by two edges.
#[derive(Debug, Clone, Copy)]
struct Window {
    lo: Edge,
    hi: Edge,
}

impl Window {
    fn new(frame: &Frame, from: Point, a: Point, b: Point) -> Option<Self> {
        let ea = Edge {
            angle: frame.angle(from, a),
            point: a,
        };
        let eb = Edge {
            angle: frame.angle(from, b),
            point: b,
        };
        let (lo, hi) = if ea.angle <= eb.angle { (ea, eb) } else { (eb, ea) };
        (hi.angle - lo.angle > ANGLE_EPS).then_some(Self { lo, hi })
    }

    /// What is left of this window once `other` is removed.
    fn subtract(self, other: &Self) -> Vec<Self> {
        if other.hi.angle <= self.lo.angle || other.lo.angle >= self.hi.angle {
            return vec![self];
        }
        let mut left = Vec::with_capacity(2);
        if other.lo.angle > self.lo.angle + ANGLE_EPS {
            left.push(Self {
                lo: self.lo,
                hi: other.lo,
            });
        }
        if other.hi.angle < self.hi.angle - ANGLE_EPS {
            left.push(Self {
                lo: other.hi,
                hi: self.hi,
            });
        }
        left
    }
}

/// Windows of `target` seen from `from` past the blockers.
fn visible_windows(
    frame: &Frame,
    from: Point,
    target: (Point, Point),
    blockers: &[(Point, Point)],
) -> Vec<Window> {
    let Some(full) = Window::new(frame, from, target.0, target.1) else {
        return Vec::new();
    };
    let mut visible = vec![full];
    for &(a, b) in blockers {
        let Some(blocker) = Window::new(frame, from, a, b) else {
            continue;
        };
        let lo = blocker.lo.angle.max(full.lo.angle);
        let hi = blocker.hi.angle.min(full.hi.angle);
        if hi - lo <= ANGLE_EPS {
            continue;
        }
        // Segments that do not cross keep the same depth order over the overlap
        let ray = frame.direction(0.5 * (lo + hi));
        let depth = |p: Point, q: Point| {
            line_intersection(from, ray, p, q).map_or(f64::INFINITY, |(s, _)| s)
        };
        if depth(a, b) >= depth(target.0, target.1) {
            continue;
        }
        visible = visible
            .into_iter()
            .flat_map(|w| w.subtract(&blocker))
            .collect();
    }
    visible
}
