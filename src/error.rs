use crate::fetch::error::FetchError;
use crate::grid::error::GridError;
use crate::interpolate::error::InterpolateError;
use crate::pipeline::error::PipelineError;
use crate::series::error::SeriesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimGridError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Interpolate(#[from] InterpolateError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
