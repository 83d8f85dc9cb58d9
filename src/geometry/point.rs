//! Geographic point primitives and the distance function used for
//! interpolation weighting.

use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Earth radius in kilometers used by [`GeoPoint::distance_km`].
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// A geographic coordinate in degrees (WGS-84-like datum).
///
/// `GeoPoint` is an immutable value type. Two points are considered the same
/// location only on *exact* coordinate equality; there is no epsilon
/// tolerance. Downstream code (neighbor selection, duplicate detection)
/// relies on this.
///
/// # Examples
///
/// ```
/// use climgrid::GeoPoint;
///
/// let joao_pessoa = GeoPoint::new(-7.1195, -34.8450);
/// assert_eq!(joao_pessoa.lat, -7.1195);
/// assert_eq!(joao_pessoa.lon, -34.8450);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees (positive north).
    pub lat: f64,
    /// Longitude in decimal degrees (positive east).
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle-style distance to `other`, in kilometers.
    ///
    /// Deliberately NOT the textbook haversine: the cosine terms halve the
    /// raw latitude in degrees instead of converting the angular delta to
    /// radians. The formula is kept literally so that numeric outputs stay
    /// bit-compatible with datasets already produced by this pipeline. At
    /// the equator it coincides with the standard haversine.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let dx = (self.lon - other.lon).to_radians();
        let dy = (self.lat - other.lat).to_radians();

        let a = (dy / 2.0).sin().powi(2)
            + (self.lat / 2.0).cos() * (other.lat / 2.0).cos() * (dx / 2.0).sin().powi(2);
        EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// The same location as a `geo` point (x = longitude, y = latitude).
    pub(crate) fn to_geo(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}
