//! Line segment operations in the 2D cross-section plane.
//!
//! This module provides the oriented [`LineSegment`] used for every row side and
//! ground piece, plus the line intersection used to trace sun rays and to
//! find where visibility changes.

use crate::geom::EPS;
use crate::{Point, Vector};
use serde::{Deserialize, Serialize};

/// Oriented segment with an outward unit normal.
///
/// The normal is carried explicitly because the front and back sides of a row
/// share the same endpoints and only differ by the direction they face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
    pub normal: Vector,
}

impl LineSegment {
    /// Creates a segment. Returns `None` for a zero-length segment or a zero normal.
    pub fn new(start: Point, end: Point, normal: Vector) -> Option<Self> {
        if start.distance(&end) < EPS {
            return None;
        }
        let normal = normal.normalize()?;
        Some(Self { start, end, normal })
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    pub fn midpoint(&self) -> Point {
        Point::new_between_2_points(self.start, self.end, 0.5)
    }

    /// Unit vector from `start` to `end`.
    pub fn direction(&self) -> Vector {
        let v = Vector::from_points(self.start, self.end);
        v * (1.0 / v.length())
    }

    /// Point at relative position `rel_d` (0 = start, 1 = end).
    pub fn point_at(&self, rel_d: f64) -> Point {
        Point::new_between_2_points(self.start, self.end, rel_d)
    }

    /// Distance of the orthogonal projection of `pt` from `start`, along the segment.
    pub fn abscissa(&self, pt: Point) -> f64 {
        Vector::from_points(self.start, pt).dot(self.direction())
    }

    /// Signed distance of `pt` from the segment's line, positive on the normal side.
    pub fn signed_distance(&self, pt: Point) -> f64 {
        Vector::from_points(self.start, pt).dot(self.normal)
    }

    /// Piece between two relative positions, keeping the normal.
    pub fn sub_segment(&self, rel_start: f64, rel_end: f64) -> Option<Self> {
        Self::new(self.point_at(rel_start), self.point_at(rel_end), self.normal)
    }

    /// Returns true if `other` lies in front of this segment (on the normal side),
    /// touching the line at most with one end.
    pub fn sees(&self, other: &Self) -> bool {
        let d0 = self.signed_distance(other.start);
        let d1 = self.signed_distance(other.end);
        d0.min(d1) > -EPS && d0.max(d1) > EPS
    }

    /// Returns true if both segments lie in front of each other.
    pub fn faces(&self, other: &Self) -> bool {
        self.sees(other) && other.sees(self)
    }
}

/// Intersects the line `origin + s * dir` with the line through `p1` and `p2`.
///
/// Returns `(s, t)` such that `origin + s * dir == p1 + t * (p2 - p1)`,
/// or `None` when the lines are parallel.
pub fn line_intersection(origin: Point, dir: Vector, p1: Point, p2: Point) -> Option<(f64, f64)> {
    let d2 = Vector::from_points(p1, p2);
    let denom = dir.cross(d2);
    if denom.abs() < EPS * dir.length().max(1.0) * d2.length().max(1.0) {
        return None;
    }
    let r = Vector::from_points(origin, p1);
    let s = r.cross(d2) / denom;
    let t = r.cross(dir) / denom;
    Some((s, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    fn horizontal(x0: f64, x1: f64, y: f64) -> LineSegment {
        LineSegment::new(Point::new(x0, y), Point::new(x1, y), Vector::new(0., 1.)).unwrap()
    }

    #[test]
    fn test_zero_length_segment_rejected() {
        let p = Point::new(1., 1.);
        assert!(LineSegment::new(p, p, Vector::new(0., 1.)).is_none());
    }

    #[test]
    fn test_length_midpoint_abscissa() {
        let seg = horizontal(1., 3., 2.);
        assert!(seg.length().is_close(2.0));
        assert!(seg.midpoint().is_close(&Point::new(2., 2.)));
        assert!(seg.abscissa(Point::new(2.5, 7.)).is_close(1.5));
        assert!(seg.signed_distance(Point::new(0., 5.)).is_close(3.0));
    }

    #[test]
    fn test_sub_segment_keeps_normal() {
        let seg = horizontal(0., 4., 1.);
        let sub = seg.sub_segment(0.25, 0.5).unwrap();
        assert!(sub.start.is_close(&Point::new(1., 1.)));
        assert!(sub.end.is_close(&Point::new(2., 1.)));
        assert!(sub.normal.is_close(&seg.normal));
    }

    #[test]
    fn test_faces() {
        let floor = horizontal(0., 1., 0.);
        let ceiling = LineSegment::new(
            Point::new(0., 1.),
            Point::new(1., 1.),
            Vector::new(0., -1.),
        )
        .unwrap();
        assert!(floor.faces(&ceiling));

        // Same line: no exchange
        let neighbour = horizontal(1., 2., 0.);
        assert!(!floor.faces(&neighbour));

        // Ceiling facing up does not see the floor
        let roof = horizontal(0., 1., 1.);
        assert!(!floor.faces(&roof));
    }

    #[test]
    fn test_line_intersection() {
        let (s, t) = line_intersection(
            Point::new(0., 2.),
            Vector::new(1., -1.),
            Point::new(-5., 0.),
            Point::new(5., 0.),
        )
        .unwrap();
        assert!(s.is_close(2.0));
        assert!(t.is_close(0.7));

        let parallel = line_intersection(
            Point::new(0., 2.),
            Vector::new(1., 0.),
            Point::new(-5., 0.),
            Point::new(5., 0.),
        );
        assert!(parallel.is_none());
    }
}
