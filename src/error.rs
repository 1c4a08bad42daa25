use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Primary classifier failed or could not be reached. Recovered inside the
    /// classifier facade by the keyword fallback.
    #[error("classifier backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Input rejected before the pipeline runs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
