use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid resolution must be positive, got {0}")]
    InvalidResolution(f64),
}
