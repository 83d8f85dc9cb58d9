//! Tiles a boundary into a regular lattice of cells.

use crate::geometry::point::GeoPoint;
use crate::geometry::polygon::Envelope;
use crate::grid::boundary::Boundary;
use crate::grid::error::GridError;
use geo::EuclideanDistance;
use log::{debug, info};

/// A grid unit: a center point, its square (or clipped) footprint and an
/// optional tag naming the boundary piece it belongs to.
#[derive(Debug, Clone)]
pub struct Cell {
    pub center: GeoPoint,
    pub envelope: Envelope,
    pub region: Option<String>,
}

/// An ordered sequence of [`Cell`]s.
///
/// The order carries no meaning but is stable for a given
/// (boundary, resolution, border) input, so output file row order is
/// reproducible across runs.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    cells: Vec<Cell>,
    resolution: f64,
}

impl Grid {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lattice spacing the grid was generated with, in degrees.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }
}

/// Tiles `boundary` into a regular grid at `resolution` degrees.
///
/// A full lattice of candidate centers is generated over the boundary's
/// bounding box, expanded by one `resolution` on the min side and
/// 1.2 × `resolution` on the max side so border cells are always covered.
/// Exactly one retention mode then applies:
///
/// * **Border mode** (`border >= 0`): a cell is kept iff the distance from
///   its center to the merged boundary is less than `border` (degrees).
///   Centers inside the boundary are at distance zero and always kept.
/// * **Boundary-clip mode** (`border < 0`): a cell is kept iff its envelope
///   intersects the boundary at all; the envelope is then replaced with the
///   intersection and the center recomputed as the clipped shape's centroid.
///
/// An empty boundary yields an empty grid; a non-positive resolution is a
/// configuration error.
pub fn build_grid(boundary: &Boundary, resolution: f64, border: f64) -> Result<Grid, GridError> {
    if resolution <= 0.0 {
        return Err(GridError::InvalidResolution(resolution));
    }

    let Some(bbox) = boundary.bounding_box() else {
        debug!("empty boundary, returning an empty grid");
        return Ok(Grid {
            cells: Vec::new(),
            resolution,
        });
    };

    let (lon_min, lat_min) = (bbox.min().x, bbox.min().y);
    let (lon_max, lat_max) = (bbox.max().x, bbox.max().y);

    let longitudes = lattice_axis(lon_min, lon_max, resolution);
    let latitudes = lattice_axis(lat_min, lat_max, resolution);
    debug!(
        "candidate lattice: {} x {} at resolution {resolution}",
        longitudes.len(),
        latitudes.len()
    );

    let merged = boundary.merged();
    let mut cells = Vec::new();

    for &lon in &longitudes {
        for &lat in &latitudes {
            let center = GeoPoint::new(lat, lon);
            let envelope = Envelope::square(&center, resolution);

            if border >= 0.0 {
                let dist = merged.euclidean_distance(&center.to_geo());
                if dist < border {
                    let region = boundary.tag_for(envelope.footprint()).map(str::to_owned);
                    cells.push(Cell {
                        center,
                        envelope,
                        region,
                    });
                }
            } else {
                if !envelope.intersects(merged) {
                    continue;
                }
                let clipped = envelope.clip(merged);
                let Some(center) = clipped.centroid() else {
                    // Intersection degenerated to a shared edge or point.
                    continue;
                };
                let region = boundary.tag_for(clipped.footprint()).map(str::to_owned);
                cells.push(Cell {
                    center,
                    envelope: clipped,
                    region,
                });
            }
        }
    }

    info!(
        "grid built: {} cells retained (resolution {resolution}, border {border})",
        cells.len()
    );
    Ok(Grid { cells, resolution })
}

/// Candidate coordinates from `min - step` up to (excluding)
/// `max + 1.2 * step`, spaced by `step`.
fn lattice_axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    let mut v = min - step;
    while v < max + 1.2 * step {
        values.push(v);
        v += step;
    }
    values
}
