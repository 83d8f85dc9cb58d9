//! Orchestration: fetch every grid cell, aggregate, interpolate.

pub mod error;
pub mod writer;

use crate::fetch::client::{DailyPointSource, PointQuery};
use crate::fetch::retry::RetryPolicy;
use crate::geometry::point::GeoPoint;
use crate::grid::builder::{Cell, Grid};
use crate::interpolate::neighbors::NeighborSelector;
use crate::interpolate::{InterpolationResult, Interpolator};
use crate::pipeline::error::PipelineError;
use crate::series::aggregate::{aggregate, AggregationSpec, HorizonTable};
use crate::series::daily_table::DailyTable;
use crate::series::timeseries::TimeSeries;
use bon::bon;
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};
use log::{info, warn};

const DEFAULT_CONCURRENCY: usize = 5;

/// Everything produced for one grid cell: its geometry plus the six
/// aggregated horizon tables.
#[derive(Debug, Clone)]
pub struct LocationDataset {
    pub cell_index: usize,
    pub cell: Cell,
    pub tables: Vec<HorizonTable>,
}

/// Drives the per-cell fetch and aggregation over a bounded number of
/// concurrent requests.
///
/// A cell either yields a complete dataset or fails the run: there are no
/// partially-fetched locations in the output. Transient service errors are
/// retried indefinitely per [`RetryPolicy`]; only malformed responses
/// surface as errors.
pub struct Pipeline<S: DailyPointSource> {
    source: S,
    spec: AggregationSpec,
    retry: RetryPolicy,
    concurrency: usize,
}

#[bon]
impl<S: DailyPointSource> Pipeline<S> {
    /// Creates a pipeline over `source`.
    ///
    /// `spec` defaults to [`AggregationSpec::wind_energy_default`], `retry`
    /// to [`RetryPolicy::default`] and `concurrency` to 5 in-flight
    /// requests.
    #[builder]
    pub fn new(
        source: S,
        spec: Option<AggregationSpec>,
        retry: Option<RetryPolicy>,
        concurrency: Option<usize>,
    ) -> Self {
        Self {
            source,
            spec: spec.unwrap_or_else(AggregationSpec::wind_energy_default),
            retry: retry.unwrap_or_default(),
            concurrency: concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
        }
    }

    pub fn spec(&self) -> &AggregationSpec {
        &self.spec
    }

    /// Fetches and aggregates every cell of `grid` for `[start, end]`.
    ///
    /// Results come back in grid order regardless of completion order.
    pub async fn run(
        &self,
        grid: &Grid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<LocationDataset>, PipelineError> {
        let variables = self.spec.raw_variables();
        info!(
            "fetching {} cells from {start} to {end} ({} in flight)",
            grid.len(),
            self.concurrency
        );

        let mut pending = stream::iter(grid.iter().enumerate().map(|(cell_index, cell)| {
            let variables = variables.clone();
            async move {
                let query = PointQuery {
                    location: cell.center,
                    variables,
                    start,
                    end,
                };
                let series = self.fetch_with_retry(query).await?;
                let tables = aggregate(&series, &self.spec)?;
                Ok::<_, PipelineError>(LocationDataset {
                    cell_index,
                    cell: cell.clone(),
                    tables,
                })
            }
        }))
        .buffer_unordered(self.concurrency);

        let mut datasets = Vec::with_capacity(grid.len());
        while let Some(result) = pending.next().await {
            datasets.push(result?);
        }
        datasets.sort_by_key(|d| d.cell_index);
        Ok(datasets)
    }

    /// Fetches the raw daily series for every cell, as a flat table ready
    /// for interpolation.
    pub async fn run_daily(
        &self,
        grid: &Grid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyTable, PipelineError> {
        let variables = self.spec.raw_variables();
        let mut pending = stream::iter(grid.iter().map(|cell| {
            let variables = variables.clone();
            async move {
                let query = PointQuery {
                    location: cell.center,
                    variables,
                    start,
                    end,
                };
                let series = self.fetch_with_retry(query).await?;
                Ok::<_, PipelineError>((cell.center, series))
            }
        }))
        .buffer_unordered(self.concurrency);

        let mut fetched: Vec<(GeoPoint, TimeSeries)> = Vec::new();
        while let Some(result) = pending.next().await {
            fetched.push(result?);
        }
        drop(pending);

        let mut table = DailyTable::new(variables);
        for (location, series) in &fetched {
            table.push_series(*location, series);
        }
        Ok(table)
    }

    async fn fetch_with_retry(&self, query: PointQuery) -> Result<TimeSeries, PipelineError> {
        loop {
            match self.source.fetch_daily(query.clone()).await {
                Ok(series) => return Ok(series),
                Err(err) => match self.retry.delay_for(&err) {
                    Some(delay) => {
                        warn!(
                            "fetch for {} failed ({err}), retrying in {:.0}s",
                            query.location,
                            delay.as_secs_f64()
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    None => return Err(err.into()),
                },
            }
        }
    }
}

/// Estimates every target cell for every date of `reference`.
///
/// Interpolation runs date by date: the pool is the set of locations that
/// reported that date; dates without a single reporting location are
/// skipped, as are cells the estimator cannot answer for. A misconfigured
/// estimator fails the whole run.
pub fn interpolate_grid(
    targets: &Grid,
    reference: &DailyTable,
    interpolator: &Interpolator,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<InterpolationResult>, PipelineError> {
    let mut results = Vec::new();
    for date in reference.dates() {
        if date < start || date > end {
            continue;
        }
        let pool = reference.pool_for(date);
        if pool.is_empty() {
            continue;
        }
        let selector = NeighborSelector::new(&pool);
        for cell in targets.iter() {
            if let Some(values) = interpolator.estimate_at(&cell.center, &pool, &selector)? {
                results.push(InterpolationResult {
                    target: cell.center,
                    date,
                    region: cell.region.clone(),
                    values,
                });
            }
        }
    }
    info!(
        "interpolated {} cell-dates over {} targets",
        results.len(),
        targets.len()
    );
    Ok(results)
}
