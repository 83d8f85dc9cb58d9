use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpolateError {
    #[error("unknown interpolation algorithm '{0}' (expected 'idw' or 'kriging')")]
    UnknownAlgorithm(String),

    #[error("neighbor count must be positive")]
    ZeroNeighbors,

    #[error("reference pool has {found} values per point but {expected} columns were requested")]
    ColumnMismatch { expected: usize, found: usize },
}
