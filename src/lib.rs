mod climgrid;
mod error;
mod fetch;
mod geometry;
mod grid;
mod interpolate;
mod pipeline;
mod series;

pub use climgrid::*;
pub use error::ClimGridError;

pub use geometry::point::{GeoPoint, EARTH_RADIUS_KM};
pub use geometry::polygon::{union_all, Envelope};

pub use grid::boundary::{Boundary, BoundaryPiece};
pub use grid::builder::{build_grid, Cell, Grid};
pub use grid::error::GridError;

pub use series::aggregate::{
    aggregate, AggregationSpec, ExtremalSpec, Horizon, HorizonRecord, HorizonTable, Stat,
};
pub use series::daily_table::{DailyRow, DailyTable};
pub use series::error::SeriesError;
pub use series::timeseries::{TimeSeries, SENTINEL};

pub use fetch::client::{
    DailyPointSource, Granularity, PointQuery, PowerClient, WIND_ENERGY_VARIABLES,
};
pub use fetch::error::FetchError;
pub use fetch::retry::RetryPolicy;

pub use interpolate::error::InterpolateError;
pub use interpolate::neighbors::{Neighbor, NeighborSelector, ReferencePoint};
pub use interpolate::{InterpolationAlgorithm, InterpolationResult, Interpolator};

pub use pipeline::error::PipelineError;
pub use pipeline::writer::{DatasetWriter, DATE_FORMAT};
pub use pipeline::{interpolate_grid, LocationDataset, Pipeline};
