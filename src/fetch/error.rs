use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("data service overloaded (HTTP {0})")]
    Overloaded(StatusCode),

    #[error("data service error (HTTP {0})")]
    Service(StatusCode),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("network error requesting {0}")]
    Network(String, #[source] reqwest::Error),

    #[error("could not decode the data service response")]
    Decode(#[source] reqwest::Error),

    #[error("variable '{0}' missing from the data service response")]
    MissingVariable(String),

    #[error("unparseable date '{0}' in the data service response")]
    BadDate(String),
}
