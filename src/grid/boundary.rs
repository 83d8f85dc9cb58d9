//! The reference shape a grid is tiled over or clipped to.

use crate::geometry::polygon::union_all;
use geo::{coord, BoundingRect, Intersects, MultiPolygon, Polygon, Rect};

/// One piece of a multi-piece boundary, optionally carrying an identifier
/// (e.g. a municipality name) used to tag the grid cells it covers.
#[derive(Debug, Clone)]
pub struct BoundaryPiece {
    pub name: Option<String>,
    pub shape: MultiPolygon<f64>,
}

/// The boundary a grid is generated against: either the union of a set of
/// polygons (typically an administrative multi-polygon layer) or an explicit
/// rectangle derived from four bounds.
///
/// The merged shape drives cell retention; the individual pieces survive so
/// cells can be tagged with the piece they fall in.
#[derive(Debug, Clone)]
pub struct Boundary {
    pieces: Vec<BoundaryPiece>,
    merged: MultiPolygon<f64>,
}

impl Boundary {
    /// Builds a boundary from named polygon pieces. The merged shape is the
    /// union of all pieces.
    pub fn from_polygons<I>(pieces: I) -> Self
    where
        I: IntoIterator<Item = (Option<String>, Polygon<f64>)>,
    {
        let pieces: Vec<BoundaryPiece> = pieces
            .into_iter()
            .map(|(name, poly)| BoundaryPiece {
                name,
                shape: MultiPolygon::new(vec![poly]),
            })
            .collect();
        let merged = union_all(pieces.iter().flat_map(|p| p.shape.0.iter().cloned()));
        Self { pieces, merged }
    }

    /// Builds a rectangular boundary from explicit bounds, in degrees.
    pub fn from_bounds(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> Self {
        let rect = Rect::new(
            coord! { x: lon_min, y: lat_min },
            coord! { x: lon_max, y: lat_max },
        );
        Self::from_polygons(vec![(None, rect.to_polygon())])
    }

    /// The union of all pieces.
    pub fn merged(&self) -> &MultiPolygon<f64> {
        &self.merged
    }

    pub fn is_empty(&self) -> bool {
        self.merged.0.is_empty()
    }

    /// Bounding rectangle of the merged shape, `None` when empty.
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.merged.bounding_rect()
    }

    /// Identifier of the first named piece that `shape` intersects.
    pub(crate) fn tag_for(&self, shape: &MultiPolygon<f64>) -> Option<&str> {
        self.pieces
            .iter()
            .find(|piece| piece.name.is_some() && piece.shape.intersects(shape))
            .and_then(|piece| piece.name.as_deref())
    }
}
