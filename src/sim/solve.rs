use ndarray as nd;

use crate::error::{Error, Result};

/// Smallest pivot magnitude accepted before the system is declared singular.
const PIVOT_TOLERANCE: f64 = 1e-14;

/// Solves the dense reflection system `(I - R F) x = R q0` for the surface
/// radiosities `x`.
///
/// `a` holds `I - R F` (one row and one column per registered surface, the
/// sky excluded) and `b` holds `R q0`. With reflectivities below one and view
/// factor rows summing to at most one, `a` is diagonally dominant, so row
/// swaps only happen for round-off. Elimination is done in place with partial
/// pivoting.
///
/// Fails with `Error::NumericalInstability` on a vanishing pivot or a
/// non-finite radiosity.
pub fn solve_dense(mut a: nd::Array2<f64>, mut b: nd::Array1<f64>) -> Result<nd::Array1<f64>> {
    let n = a.nrows();
    if n == 0 {
        return Ok(nd::Array1::zeros(0));
    }
    if a.ncols() != n || b.len() != n {
        return Err(Error::NumericalInstability(format!(
            "system shape mismatch: A is {}x{}, b has {} entries",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    // Eliminate the surface `col` from the equations of the following surfaces
    for col in 0..n {
        let mut pivot_row = col;
        let mut pivot_val = a[[col, col]].abs();
        for r in (col + 1)..n {
            let v = a[[r, col]].abs();
            if v > pivot_val {
                pivot_val = v;
                pivot_row = r;
            }
        }

        if !pivot_val.is_finite() || pivot_val <= PIVOT_TOLERANCE {
            return Err(Error::NumericalInstability(format!(
                "singular reflection system (pivot {pivot_val:e}) at surface {col}"
            )));
        }

        if pivot_row != col {
            for c in 0..n {
                a.swap([pivot_row, c], [col, c]);
            }
            b.swap(pivot_row, col);
        }

        let pivot = a[[col, col]];
        for r in (col + 1)..n {
            let factor = a[[r, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            a[[r, col]] = 0.0;
            for c in (col + 1)..n {
                a[[r, c]] -= factor * a[[col, c]];
            }
            b[r] -= factor * b[col];
        }
    }

    // Radiosities from the last surface back to the first
    let mut x = nd::Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut rhs = b[i];
        for j in (i + 1)..n {
            rhs -= a[[i, j]] * x[j];
        }
        x[i] = rhs / a[[i, i]];
    }

    if let Some((i, xi)) = x.iter().enumerate().find(|(_, xi)| !xi.is_finite()) {
        return Err(Error::NumericalInstability(format!(
            "non-finite radiosity on surface {i}: {xi}"
        )));
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_with_pivoting() -> anyhow::Result<()> {
        // Zero on the first diagonal entry requires a row swap
        let a = nd::array![[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [2.0, 0.0, 3.0]];
        let expected = nd::array![1.0, -2.0, 3.0];
        let b = a.dot(&expected);
        let x = solve_dense(a, b)?;
        for (xi, ei) in x.iter().zip(expected.iter()) {
            assert!((xi - ei).abs() < 1e-12, "x = {x}");
        }
        Ok(())
    }

    #[test]
    fn test_two_facing_plates_reflection_system() -> anyhow::Result<()> {
        // x = R q0 + R F x with F12 = F21 = f: x = rho q0 / (1 - rho f)
        let (f, rho, q0) = (0.4, 0.3, 500.0);
        let a = nd::array![[1.0, -rho * f], [-rho * f, 1.0]];
        let b = nd::array![rho * q0, rho * q0];
        let x = solve_dense(a, b)?;
        let expected = rho * q0 / (1.0 - rho * f);
        for xi in x.iter() {
            assert!((xi - expected).abs() < 1e-9, "x = {x}");
        }
        Ok(())
    }

    #[test]
    fn test_singular_matrix() {
        let a = nd::array![[1.0, 2.0], [2.0, 4.0]];
        let b = nd::array![1.0, 2.0];
        assert!(matches!(
            solve_dense(a, b),
            Err(Error::NumericalInstability(_))
        ));
    }

    #[test]
    fn test_non_finite_input() {
        let a = nd::array![[f64::NAN, 0.0], [0.0, 1.0]];
        let b = nd::array![1.0, 2.0];
        assert!(solve_dense(a, b).is_err());
    }

    #[test]
    fn test_empty_system() -> anyhow::Result<()> {
        let x = solve_dense(nd::Array2::zeros((0, 0)), nd::Array1::zeros(0))?;
        assert!(x.is_empty());
        Ok(())
    }
}
