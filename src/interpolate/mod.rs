//! Spatial interpolation of grid cells from a sparse reference pool.

pub mod error;
pub mod idw;
pub mod kriging;
pub mod neighbors;

use crate::geometry::point::GeoPoint;
use crate::interpolate::error::InterpolateError;
use crate::interpolate::neighbors::{NeighborSelector, ReferencePoint};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Which estimator turns neighbor values into a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationAlgorithm {
    #[default]
    Idw,
    Kriging,
}

impl FromStr for InterpolationAlgorithm {
    type Err = InterpolateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "idw" => Ok(InterpolationAlgorithm::Idw),
            "kriging" => Ok(InterpolationAlgorithm::Kriging),
            other => Err(InterpolateError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for InterpolationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationAlgorithm::Idw => write!(f, "idw"),
            InterpolationAlgorithm::Kriging => write!(f, "kriging"),
        }
    }
}

/// Estimator configuration: the algorithm, how many neighbors feed each
/// estimate and the IDW exponent.
#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    pub algorithm: InterpolationAlgorithm,
    pub neighbors: usize,
    pub idw_power: f64,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self {
            algorithm: InterpolationAlgorithm::Idw,
            neighbors: 3,
            idw_power: 1.0,
        }
    }
}

impl Interpolator {
    pub fn new(algorithm: InterpolationAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    /// Estimates every variable at `target` from its nearest pool entries.
    ///
    /// `selector` must index the same `pool` slice. Returns `Ok(None)` when
    /// the pool offers no usable neighbor or the kriging system is
    /// singular; the caller skips the cell for that date. A zero neighbor
    /// count or a ragged pool (points with differing value widths) is a
    /// configuration error.
    pub fn estimate_at(
        &self,
        target: &GeoPoint,
        pool: &[ReferencePoint],
        selector: &NeighborSelector,
    ) -> Result<Option<Vec<f64>>, InterpolateError> {
        if self.neighbors == 0 {
            return Err(InterpolateError::ZeroNeighbors);
        }

        let picked = selector.select(target, self.neighbors);
        if picked.is_empty() {
            return Ok(None);
        }

        let columns = pool[picked[0].index].values.len();
        for neighbor in &picked {
            let found = pool[neighbor.index].values.len();
            if found != columns {
                return Err(InterpolateError::ColumnMismatch {
                    expected: columns,
                    found,
                });
            }
        }

        let distances: Vec<f64> = picked.iter().map(|n| n.distance_km).collect();
        let coords: Vec<(f64, f64)> = picked
            .iter()
            .map(|n| (n.location.lon, n.location.lat))
            .collect();

        let mut estimates = Vec::with_capacity(columns);
        for col in 0..columns {
            let values: Vec<f64> = picked
                .iter()
                .map(|n| pool[n.index].values[col])
                .collect();
            let estimate = match self.algorithm {
                InterpolationAlgorithm::Idw => idw::estimate(&distances, &values, self.idw_power),
                InterpolationAlgorithm::Kriging => {
                    kriging::estimate(&coords, &values, (target.lon, target.lat))
                }
            };
            match estimate {
                Some(value) => estimates.push(value),
                None => return Ok(None),
            }
        }
        Ok(Some(estimates))
    }
}

/// One interpolated cell-date row.
#[derive(Debug, Clone)]
pub struct InterpolationResult {
    pub target: GeoPoint,
    pub date: NaiveDate,
    pub region: Option<String>,
    pub values: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<ReferencePoint> {
        vec![
            ReferencePoint {
                location: GeoPoint::new(0.0, 1.0),
                values: vec![10.0, 100.0],
            },
            ReferencePoint {
                location: GeoPoint::new(0.0, 2.0),
                values: vec![20.0, 200.0],
            },
        ]
    }

    #[test]
    fn algorithm_names_parse_case_insensitively() {
        assert_eq!(
            "IDW".parse::<InterpolationAlgorithm>().expect("known name"),
            InterpolationAlgorithm::Idw
        );
        assert_eq!(
            "Kriging".parse::<InterpolationAlgorithm>().expect("known name"),
            InterpolationAlgorithm::Kriging
        );
        assert!(matches!(
            "cubic".parse::<InterpolationAlgorithm>(),
            Err(InterpolateError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn idw_estimates_every_column() {
        let pool = pool();
        let selector = NeighborSelector::new(&pool);
        let interp = Interpolator::default();
        let got = interp
            .estimate_at(&GeoPoint::new(0.0, 0.0), &pool, &selector)
            .expect("uniform pool")
            .expect("non-empty pool");

        assert_eq!(got.len(), 2);
        // Distances are 1 and 2 degrees of longitude at the equator.
        assert!((got[0] - 40.0 / 3.0).abs() < 1e-6, "got {}", got[0]);
        assert!((got[1] - 400.0 / 3.0).abs() < 1e-6, "got {}", got[1]);
    }

    #[test]
    fn kriging_reproduces_a_constant_pool() {
        let pool = vec![
            ReferencePoint {
                location: GeoPoint::new(0.0, 0.0),
                values: vec![5.0],
            },
            ReferencePoint {
                location: GeoPoint::new(1.0, 0.0),
                values: vec![5.0],
            },
            ReferencePoint {
                location: GeoPoint::new(0.0, 1.0),
                values: vec![5.0],
            },
        ];
        let selector = NeighborSelector::new(&pool);
        let interp = Interpolator::new(InterpolationAlgorithm::Kriging);
        let got = interp
            .estimate_at(&GeoPoint::new(0.4, 0.4), &pool, &selector)
            .expect("uniform pool")
            .expect("well-posed system");
        assert!((got[0] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn empty_pool_yields_none() {
        let pool: Vec<ReferencePoint> = Vec::new();
        let selector = NeighborSelector::new(&pool);
        let interp = Interpolator::default();
        assert!(matches!(
            interp.estimate_at(&GeoPoint::new(0.0, 0.0), &pool, &selector),
            Ok(None)
        ));
    }

    #[test]
    fn ragged_pool_is_a_configuration_error() {
        let pool = vec![
            ReferencePoint {
                location: GeoPoint::new(0.0, 1.0),
                values: vec![10.0, 100.0],
            },
            ReferencePoint {
                location: GeoPoint::new(0.0, 2.0),
                values: vec![20.0],
            },
        ];
        let selector = NeighborSelector::new(&pool);
        let interp = Interpolator::default();
        let err = interp
            .estimate_at(&GeoPoint::new(0.0, 0.0), &pool, &selector)
            .expect_err("value widths differ");
        assert!(matches!(
            err,
            InterpolateError::ColumnMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn zero_neighbors_is_a_configuration_error() {
        let pool = pool();
        let selector = NeighborSelector::new(&pool);
        let interp = Interpolator {
            neighbors: 0,
            ..Interpolator::default()
        };
        assert!(matches!(
            interp.estimate_at(&GeoPoint::new(0.0, 0.0), &pool, &selector),
            Err(InterpolateError::ZeroNeighbors)
        ));
    }
}
