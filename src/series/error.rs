use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("variable '{0}' not found in the series")]
    MissingVariable(String),

    #[error("row has {found} values but the series tracks {expected} variables")]
    ColumnMismatch { expected: usize, found: usize },

    #[error("variable '{0}' already exists in the series")]
    DuplicateVariable(String),

    #[error("cannot aggregate an empty series")]
    EmptySeries,
}
