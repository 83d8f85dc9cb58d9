//! The main entry point for building climate grids.
//!
//! [`ClimGrid`] ties the stages together: tile a boundary into cells,
//! download and aggregate a daily series per cell, and interpolate a dense
//! target grid from a sparse reference grid. Each stage is also usable on
//! its own through the underlying modules.

use crate::error::ClimGridError;
use crate::fetch::client::PowerClient;
use crate::fetch::retry::RetryPolicy;
use crate::grid::boundary::Boundary;
use crate::grid::builder::{build_grid, Grid};
use crate::interpolate::{InterpolationAlgorithm, InterpolationResult, Interpolator};
use crate::pipeline::writer::DatasetWriter;
use crate::pipeline::{interpolate_grid, LocationDataset, Pipeline};
use crate::series::aggregate::AggregationSpec;
use bon::bon;
use chrono::NaiveDate;
use std::path::PathBuf;

/// High-level client for the grid pipeline.
///
/// Create one with [`ClimGrid::builder()`]; every parameter is optional and
/// defaults to the public NASA POWER service, the wind-energy variable set
/// and five concurrent requests. Pass `output_dir` to persist everything
/// the client produces as the on-disk CSV layout.
///
/// # Examples
///
/// ```no_run
/// use climgrid::{Boundary, ClimGrid};
/// use chrono::NaiveDate;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), climgrid::ClimGridError> {
/// let client = ClimGrid::builder().output_dir("./dataset").build();
///
/// let boundary = Boundary::from_bounds(-8.3, -38.8, -6.0, -34.8);
/// let grid = ClimGrid::grid()
///     .boundary(&boundary)
///     .resolution(0.5)
///     .call()?;
///
/// let datasets = client
///     .download()
///     .grid(&grid)
///     .start(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
///     .end(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
///     .call()
///     .await?;
/// println!("downloaded {} locations", datasets.len());
/// # Ok(())
/// # }
/// ```
pub struct ClimGrid {
    client: PowerClient,
    spec: AggregationSpec,
    retry: RetryPolicy,
    concurrency: usize,
    output_dir: Option<PathBuf>,
}

#[bon]
impl ClimGrid {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `client` - a configured [`PowerClient`]; defaults to the public
    ///   POWER host.
    /// * `spec` - the variable/statistic mapping; defaults to
    ///   [`AggregationSpec::wind_energy_default`].
    /// * `retry` - the retry policy for transient service errors.
    /// * `concurrency` - maximum in-flight point requests (default 5).
    /// * `output_dir` - when set, downloads and interpolations are also
    ///   written beneath this directory.
    #[builder]
    pub fn new(
        client: Option<PowerClient>,
        spec: Option<AggregationSpec>,
        retry: Option<RetryPolicy>,
        concurrency: Option<usize>,
        #[builder(into)] output_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            client: client.unwrap_or_else(|| PowerClient::builder().build()),
            spec: spec.unwrap_or_else(AggregationSpec::wind_energy_default),
            retry: retry.unwrap_or_default(),
            concurrency: concurrency.unwrap_or(5),
            output_dir,
        }
    }

    /// Tiles `boundary` into a regular grid.
    ///
    /// `resolution` defaults to 0.5 degrees. `border` picks the retention
    /// mode: non-negative (default 0.5) keeps whole square cells whose
    /// center sits within `border` degrees of the boundary, negative clips
    /// cells to the boundary and recenters them on the clipped shape.
    ///
    /// # Example
    ///
    /// ```
    /// use climgrid::{Boundary, ClimGrid};
    ///
    /// # fn main() -> Result<(), climgrid::ClimGridError> {
    /// let boundary = Boundary::from_bounds(0.0, 0.0, 1.0, 1.0);
    /// let bordered = ClimGrid::grid().boundary(&boundary).call()?;
    /// assert_eq!(bordered.len(), 9);
    ///
    /// let clipped = ClimGrid::grid()
    ///     .boundary(&boundary)
    ///     .resolution(0.4)
    ///     .border(-1.0)
    ///     .call()?;
    /// assert!(!clipped.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    #[builder(start_fn = grid)]
    pub fn build_grid_for(
        boundary: &Boundary,
        resolution: Option<f64>,
        border: Option<f64>,
    ) -> Result<Grid, ClimGridError> {
        Ok(build_grid(
            boundary,
            resolution.unwrap_or(0.5),
            border.unwrap_or(0.5),
        )?)
    }

    /// Downloads and aggregates a daily series for every cell of `grid`.
    ///
    /// Returns one [`LocationDataset`] per cell, in grid order. With an
    /// `output_dir` configured, also writes the per-location horizon files
    /// and each horizon's `compacted.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`ClimGridError::Pipeline`] when the service answers with a
    /// malformed payload or the output directory cannot be written.
    /// Transient service errors are retried, not surfaced.
    #[builder]
    pub async fn download(
        &self,
        grid: &Grid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LocationDataset>, ClimGridError> {
        let pipeline = self.pipeline();
        let datasets = pipeline.run(grid, start, end).await?;

        if let Some(root) = &self.output_dir {
            let writer = DatasetWriter::new(root);
            for dataset in &datasets {
                writer.write_location(dataset)?;
            }
            writer.write_compacted(&datasets)?;
        }
        Ok(datasets)
    }

    /// Estimates a daily series for every cell of `targets` from data
    /// fetched at the cells of `reference`.
    ///
    /// The reference grid is typically coarse (cheap to download) and the
    /// target grid fine. With an `output_dir` configured, also writes
    /// `interpolated.csv`.
    #[builder]
    pub async fn interpolate(
        &self,
        targets: &Grid,
        reference: &Grid,
        start: NaiveDate,
        end: NaiveDate,
        algorithm: Option<InterpolationAlgorithm>,
        neighbors: Option<usize>,
        idw_power: Option<f64>,
    ) -> Result<Vec<InterpolationResult>, ClimGridError> {
        let table = self.pipeline().run_daily(reference, start, end).await?;

        let mut interpolator = Interpolator::new(algorithm.unwrap_or_default());
        if let Some(neighbors) = neighbors {
            interpolator.neighbors = neighbors;
        }
        if let Some(power) = idw_power {
            interpolator.idw_power = power;
        }

        let results = interpolate_grid(targets, &table, &interpolator, start, end)?;

        if let Some(root) = &self.output_dir {
            let writer = DatasetWriter::new(root);
            writer.write_interpolated(&results, table.columns())?;
        }
        Ok(results)
    }

    fn pipeline(&self) -> Pipeline<PowerClient> {
        Pipeline::builder()
            .source(self.client.clone())
            .spec(self.spec.clone())
            .retry(self.retry)
            .concurrency(self.concurrency)
            .build()
    }
}
