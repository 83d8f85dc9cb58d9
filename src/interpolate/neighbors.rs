//! Nearest-neighbor selection over a reference pool.
//!
//! Candidates come from an R-tree in plain (lat, lon) coordinate space,
//! then get re-ranked by the pipeline's great-circle distance. The R-tree
//! pass over-fetches, since coordinate-space order and kilometer order can
//! disagree slightly near the cut.

use crate::geometry::point::GeoPoint;
use log::warn;
use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// One known location and its values for the date under interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    pub location: GeoPoint,
    pub values: Vec<f64>,
}

/// R-tree entry: a pool position plus its coordinates.
#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    index: usize,
    lat: f64,
    lon: f64,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lon])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d_lat = self.lat - point[0];
        let d_lon = self.lon - point[1];
        d_lat * d_lat + d_lon * d_lon
    }
}

/// A selected neighbor: its pool index, location and distance to the target
/// in kilometers.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub index: usize,
    pub location: GeoPoint,
    pub distance_km: f64,
}

/// Spatial index over a reference pool, reusable across targets.
#[derive(Debug)]
pub struct NeighborSelector {
    rtree: RTree<IndexedPoint>,
}

impl NeighborSelector {
    /// Indexes `pool`. Points sharing the exact same coordinates as an
    /// earlier entry are dropped with a warning so a duplicated reference
    /// cannot occupy two neighbor slots.
    pub fn new(pool: &[ReferencePoint]) -> Self {
        let mut entries: Vec<IndexedPoint> = Vec::with_capacity(pool.len());
        for (index, point) in pool.iter().enumerate() {
            let duplicate = entries
                .iter()
                .any(|e| e.lat == point.location.lat && e.lon == point.location.lon);
            if duplicate {
                warn!("duplicate reference location {} dropped from the pool", point.location);
                continue;
            }
            entries.push(IndexedPoint {
                index,
                lat: point.location.lat,
                lon: point.location.lon,
            });
        }
        Self {
            rtree: RTree::bulk_load(entries),
        }
    }

    /// Up to `k` pool entries nearest to `target`, ascending by kilometer
    /// distance (pool order breaks ties). An entry exactly at `target` is
    /// excluded so a cell never interpolates from itself.
    pub fn select(&self, target: &GeoPoint, k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }

        // Over-fetch in coordinate space before re-ranking in kilometers.
        let candidate_limit = (k * 2).max(20);
        let mut candidates: Vec<Neighbor> = self
            .rtree
            .nearest_neighbor_iter(&[target.lat, target.lon])
            .take(candidate_limit)
            .filter(|entry| entry.lat != target.lat || entry.lon != target.lon)
            .map(|entry| {
                let location = GeoPoint::new(entry.lat, entry.lon);
                Neighbor {
                    index: entry.index,
                    distance_km: target.distance_km(&location),
                    location,
                }
            })
            .collect();

        candidates.sort_by_key(|n| (OrderedFloat(n.distance_km), n.index));
        candidates.truncate(k);
        candidates
    }
}
