use crate::Point;
use crate::geom::EPS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn from_points(beg: Point, end: Point) -> Self {
        Self {
            dx: end.x - beg.x,
            dy: end.y - beg.y,
        }
    }

    /// Scalar cross product (z component of the 3D cross product).
    ///
    /// Positive when `other` is counter-clockwise from `self`.
    pub fn cross(self, other: Self) -> f64 {
        self.dx * other.dy - self.dy * other.dx
    }

    /// Dot product between 2 vectors.
    pub fn dot(self, other: Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy
    }

    /// Returns the length of the vector.
    pub fn length(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    /// Angle from the +x axis in radians, in `(-pi, pi]`.
    pub fn angle(&self) -> f64 {
        self.dy.atan2(self.dx)
    }

    pub fn is_close(&self, other: &Self) -> bool {
        (self.dx - other.dx).abs() < EPS && (self.dy - other.dy).abs() < EPS
    }

    /// Normalizes the vector (divides by its length) and returns a copy.
    pub fn normalize(&self) -> Option<Self> {
        let len = self.length();
        if len < EPS {
            None
        } else {
            Some(Self {
                dx: self.dx / len,
                dy: self.dy / len,
            })
        }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(f, "Vector({:.prec$}, {:.prec$})", self.dx, self.dy, prec = prec)
    }
}

// Implement +
impl Add for Vector {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
        }
    }
}

// Implement -
impl Sub for Vector {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            dx: self.dx - other.dx,
            dy: self.dy - other.dy,
        }
    }
}

// Implement * with a scalar
impl Mul<f64> for Vector {
    type Output = Self;
    fn mul(self, scale: f64) -> Self {
        Self {
            dx: self.dx * scale,
            dy: self.dy * scale,
        }
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_sign() {
        let x = Vector::new(1., 0.);
        let y = Vector::new(0., 1.);
        assert!((x.cross(y) - 1.0).abs() < 1e-12);
        assert!((y.cross(x) + 1.0).abs() < 1e-12);
        assert!(x.cross(x * 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize() {
        let v = Vector::new(3., 4.).normalize().unwrap();
        assert!(v.is_close(&Vector::new(0.6, 0.8)));
        assert!(Vector::new(0., 0.).normalize().is_none());
    }

    #[test]
    fn test_angle() {
        assert!((Vector::new(0., 2.).angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((Vector::new(-1., 0.).angle() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_ops() {
        let a = Vector::new(1., 2.);
        let b = Vector::new(0.5, -1.);
        assert!((a + b).is_close(&Vector::new(1.5, 1.)));
        assert!((a - b).is_close(&Vector::new(0.5, 3.)));
        assert!((-a).is_close(&Vector::new(-1., -2.)));
        assert!((a.dot(b) - (-1.5)).abs() < 1e-12);
    }
}
