use crate::fetch::error::FetchError;
use crate::interpolate::error::InterpolateError;
use crate::series::error::SeriesError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Interpolate(#[from] InterpolateError),

    #[error("could not create output directory {0}")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("could not write {0}")]
    OutputIo(PathBuf, #[source] std::io::Error),

    #[error("could not encode {0}")]
    OutputEncode(PathBuf, #[source] PolarsError),
}
