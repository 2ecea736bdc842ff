//! Closed 1D intervals and their unions.
//!
//! Used for shadows (positions along the ground or along a row) and for
//! angular coverage of the sky by row silhouettes.

use crate::geom::EPS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    /// Creates an interval, swapping the bounds if needed.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Intersection with `[lo, hi]`, `None` if shorter than the precision.
    pub fn clip(&self, lo: f64, hi: f64) -> Option<Self> {
        let start = self.start.max(lo);
        let end = self.end.min(hi);
        if end - start > EPS {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn overlap(&self, other: &Self) -> f64 {
        (self.end.min(other.end) - self.start.max(other.start)).max(0.0)
    }
}

/// Sorts intervals and merges the ones that overlap or touch.
pub fn union(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = intervals.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end + EPS => {
                last.end = last.end.max(iv.end);
            }
            _ => merged.push(iv),
        }
    }
    merged
}

/// Total length of `span` covered by a set of (possibly overlapping) intervals.
pub fn covered_length(intervals: &[Interval], span: &Interval) -> f64 {
    union(intervals).iter().map(|iv| iv.overlap(span)).sum()
}
