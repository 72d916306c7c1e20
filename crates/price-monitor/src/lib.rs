//! Background price monitoring with edge-triggered alerts. Prices come
//! from an injected provider; alerts leave through an injected sink on a
//! dedicated dispatch task so slow delivery never stalls polling.

pub mod error;
mod monitor;
pub mod types;

pub use error::MonitorError;
pub use monitor::{poll_interval_from_env, AlertSink, PriceMonitor};
pub use types::{
    AlertEvent, AlertKind, MonitorReport, MonitorStatus, PositionSnapshot, WatchSpec,
    DEFAULT_MOVEMENT_THRESHOLD_PCT,
};
