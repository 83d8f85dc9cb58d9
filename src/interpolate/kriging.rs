//! Ordinary kriging over a handful of neighbors.
//!
//! The neighbor pools here are tiny (a few points per date), so the dense
//! linear system is rebuilt and solved per call with an LU factorization.
//! The covariance model is a unit squared-exponential over (lon, lat)
//! degrees: `exp(-0.5 * h^2)`.

use log::warn;
use nalgebra::{DMatrix, DVector};

fn covariance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (-0.5 * (dx * dx + dy * dy)).exp()
}

/// Ordinary-kriging estimate at `target` from samples at `coords`
/// ((lon, lat) degrees) with `values`.
///
/// The augmented system carries a Lagrange row forcing the weights to sum
/// to one, so the estimate is unbiased for a constant field. Returns `None`
/// for an empty sample set or a singular system (coincident samples).
pub fn estimate(coords: &[(f64, f64)], values: &[f64], target: (f64, f64)) -> Option<f64> {
    let n = coords.len();
    if n == 0 || values.len() != n {
        return None;
    }

    // [[C, 1], [1^T, 0]] * [w; mu] = [c0; 1]
    let mut system = DMatrix::zeros(n + 1, n + 1);
    for i in 0..n {
        for j in 0..n {
            system[(i, j)] = covariance(coords[i], coords[j]);
        }
        system[(i, n)] = 1.0;
        system[(n, i)] = 1.0;
    }

    let mut rhs = DVector::zeros(n + 1);
    for i in 0..n {
        rhs[i] = covariance(coords[i], target);
    }
    rhs[n] = 1.0;

    let Some(solution) = system.lu().solve(&rhs) else {
        warn!("singular kriging system for {n} samples, skipping estimate");
        return None;
    };

    Some((0..n).map(|i| solution[i] * values[i]).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduces_a_constant_field() {
        let coords = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let values = [7.5, 7.5, 7.5];
        let got = estimate(&coords, &values, (0.4, 0.6)).expect("well-posed system");
        assert!((got - 7.5).abs() < 1e-9);
    }

    #[test]
    fn a_target_on_a_sample_returns_that_sample() {
        let coords = [(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)];
        let values = [3.0, 9.0, 5.0];
        let got = estimate(&coords, &values, (0.0, 0.0)).expect("well-posed system");
        assert!((got - 3.0).abs() < 1e-6);
    }

    #[test]
    fn a_nearby_target_stays_close_to_the_nearest_sample() {
        let coords = [(0.0, 0.0), (3.0, 0.0)];
        let values = [10.0, 20.0];
        let got = estimate(&coords, &values, (0.1, 0.0)).expect("well-posed system");
        assert!((got - 10.0).abs() < 1.0, "got {got}");
    }

    #[test]
    fn coincident_samples_make_the_system_singular() {
        let coords = [(1.0, 1.0), (1.0, 1.0)];
        let values = [1.0, 2.0];
        assert!(estimate(&coords, &values, (0.0, 0.0)).is_none());
    }

    #[test]
    fn empty_samples_yield_none() {
        assert!(estimate(&[], &[], (0.0, 0.0)).is_none());
    }
}
