use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("cannot start monitor with no watched symbols")]
    EmptyRegistry,

    #[error("poll task did not stop within the shutdown deadline")]
    StopTimeout,

    #[error("symbol is not being watched: {0}")]
    UnknownSymbol(String),

    #[error("price fetch failed: {0}")]
    Fetch(String),
}
