//! Polygon primitives: square envelopes, clipping, union and WKT encoding.

use crate::geometry::point::GeoPoint;
use geo::{coord, BooleanOps, BoundingRect, Centroid, Intersects, MultiPolygon, Polygon, Rect};
use wkt::ToWkt;

/// The footprint of a grid cell.
///
/// Starts life as an axis-aligned square of side `resolution` centered on a
/// [`GeoPoint`]; boundary-clip mode may replace it with the intersection of
/// that square and the boundary, which can be an arbitrary (multi)polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope(MultiPolygon<f64>);

impl Envelope {
    /// Axis-aligned square of side `resolution` centered on `center`.
    pub fn square(center: &GeoPoint, resolution: f64) -> Self {
        let half = resolution / 2.0;
        let rect = Rect::new(
            coord! { x: center.lon - half, y: center.lat - half },
            coord! { x: center.lon + half, y: center.lat + half },
        );
        Self(MultiPolygon::new(vec![rect.to_polygon()]))
    }

    pub fn footprint(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    /// Width and height of the footprint's bounding rectangle, in degrees.
    /// For an unclipped envelope both equal the grid resolution.
    pub fn extent(&self) -> (f64, f64) {
        match self.0.bounding_rect() {
            Some(rect) => (rect.width(), rect.height()),
            None => (0.0, 0.0),
        }
    }

    /// Centroid of the footprint, if the footprint has any area.
    pub fn centroid(&self) -> Option<GeoPoint> {
        self.0.centroid().map(|p| GeoPoint::new(p.y(), p.x()))
    }

    pub fn intersects(&self, boundary: &MultiPolygon<f64>) -> bool {
        self.0.intersects(boundary)
    }

    /// Geometric intersection of this footprint and `boundary`.
    pub fn clip(&self, boundary: &MultiPolygon<f64>) -> Envelope {
        Envelope(self.0.intersection(boundary))
    }

    /// WKT encoding of the footprint, used for the persisted CSV layout.
    /// A single-polygon footprint is encoded as `POLYGON`, not a
    /// one-element `MULTIPOLYGON`.
    pub fn to_wkt(&self) -> String {
        if self.0 .0.len() == 1 {
            self.0 .0[0].wkt_string()
        } else {
            self.0.wkt_string()
        }
    }
}

/// Merges a collection of polygons into one boundary shape.
pub fn union_all<I>(polygons: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = Polygon<f64>>,
{
    polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |merged, poly| {
            if merged.0.is_empty() {
                MultiPolygon::new(vec![poly])
            } else {
                merged.union(&MultiPolygon::new(vec![poly]))
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn square(min_x: f64, min_y: f64, side: f64) -> Polygon<f64> {
        Rect::new(
            coord! { x: min_x, y: min_y },
            coord! { x: min_x + side, y: min_y + side },
        )
        .to_polygon()
    }

    #[test]
    fn square_envelope_has_the_requested_side() {
        let center = GeoPoint::new(-7.0, -35.0);
        let env = Envelope::square(&center, 0.5);
        let (w, h) = env.extent();
        assert!((w - 0.5).abs() < 1e-12);
        assert!((h - 0.5).abs() < 1e-12);
    }

    #[test]
    fn square_envelope_is_centered() {
        let center = GeoPoint::new(-7.25, -35.75);
        let env = Envelope::square(&center, 0.5);
        let c = env.centroid().expect("square has area");
        assert!((c.lat - center.lat).abs() < 1e-9);
        assert!((c.lon - center.lon).abs() < 1e-9);
    }

    #[test]
    fn clip_against_overlapping_boundary() {
        let env = Envelope::square(&GeoPoint::new(0.0, 0.0), 0.4);
        let boundary = MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]);

        let clipped = env.clip(&boundary);
        assert!(!clipped.is_empty());

        // Envelope [-0.2, 0.2]^2 ∩ [0, 1]^2 = [0, 0.2]^2.
        let c = clipped.centroid().expect("clipped has area");
        assert!((c.lat - 0.1).abs() < 1e-9);
        assert!((c.lon - 0.1).abs() < 1e-9);
        let area: f64 = clipped.footprint().unsigned_area();
        assert!((area - 0.04).abs() < 1e-9);
    }

    #[test]
    fn clip_fully_outside_is_empty() {
        let env = Envelope::square(&GeoPoint::new(10.0, 10.0), 0.4);
        let boundary = MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]);
        assert!(env.clip(&boundary).is_empty());
    }

    #[test]
    fn union_merges_adjacent_squares() {
        let merged = union_all(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)]);
        assert!((merged.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_nothing_is_empty() {
        let merged = union_all(Vec::new());
        assert!(merged.0.is_empty());
    }

    #[test]
    fn wkt_of_a_square_is_a_polygon() {
        let env = Envelope::square(&GeoPoint::new(0.0, 0.0), 1.0);
        let wkt = env.to_wkt();
        assert!(wkt.starts_with("POLYGON"), "got {wkt}");
    }
}
