use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Transient fetch error: {0}")]
    TransientFetch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}
