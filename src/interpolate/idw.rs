//! Inverse-distance weighting.

/// Smallest distance (km) treated as "on top of a sample": below this the
/// sample value is returned directly instead of letting 1/d^p blow up.
const DISTANCE_TOLERANCE_KM: f64 = 1e-10;

/// Inverse-distance-weighted estimate from parallel `distances` (km) and
/// sample `values`, with exponent `power`.
///
/// Returns `None` for an empty sample set.
pub fn estimate(distances: &[f64], values: &[f64], power: f64) -> Option<f64> {
    if distances.is_empty() || distances.len() != values.len() {
        return None;
    }

    if let Some(i) = distances.iter().position(|d| *d < DISTANCE_TOLERANCE_KM) {
        return Some(values[i]);
    }

    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for (d, v) in distances.iter().zip(values) {
        let w = 1.0 / d.powf(power);
        weighted += w * v;
        weight_sum += w;
    }
    Some(weighted / weight_sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_fall_off_with_distance() {
        // (10/1 + 20/2) / (1/1 + 1/2) = 20 / 1.5
        let got = estimate(&[1.0, 2.0], &[10.0, 20.0], 1.0).expect("non-empty samples");
        assert!((got - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn result_stays_within_the_sample_range() {
        let got = estimate(&[3.0, 7.0, 11.0], &[5.0, 9.0, 1.0], 2.0).expect("non-empty samples");
        assert!((1.0..=9.0).contains(&got));
    }

    #[test]
    fn a_coincident_sample_wins_outright() {
        let got = estimate(&[0.0, 5.0], &[42.0, 100.0], 1.0).expect("non-empty samples");
        assert_eq!(got, 42.0);
    }

    #[test]
    fn higher_power_pulls_toward_the_nearest_sample() {
        let gentle = estimate(&[1.0, 2.0], &[0.0, 100.0], 1.0).expect("non-empty samples");
        let sharp = estimate(&[1.0, 2.0], &[0.0, 100.0], 4.0).expect("non-empty samples");
        assert!(sharp < gentle);
    }

    #[test]
    fn empty_samples_yield_none() {
        assert!(estimate(&[], &[], 1.0).is_none());
        assert!(estimate(&[1.0], &[], 1.0).is_none());
    }
}
