pub mod interval;
pub mod point;
pub mod segment;
pub mod vector;

/// Geometric precision [m]
pub const EPS: f64 = 1e-9;

/// Approximate comparison using the crate-wide geometric precision.
pub trait IsClose {
    fn is_close(&self, other: Self) -> bool;
}

impl IsClose for f64 {
    fn is_close(&self, other: f64) -> bool {
        (self - other).abs() < EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_close_f64() {
        assert!(1.0_f64.is_close(1.0 + 1e-12));
        assert!(!1.0_f64.is_close(1.0 + 1e-6));
    }
}
