use std::sync::{Arc, Mutex};
use std::time::Duration;

use analysis_core::PriceProvider;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::error::MonitorError;
use crate::types::{
    AlertEvent, AlertKind, MonitorReport, MonitorStatus, PositionSnapshot, WatchSpec,
    WatchedPosition,
};

const STOP_DEADLINE: Duration = Duration::from_secs(5);
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Poll interval from `MONITOR_CHECK_INTERVAL_SECS`, defaulting to 60s.
pub fn poll_interval_from_env() -> Duration {
    let secs = std::env::var("MONITOR_CHECK_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&s: &u64| s > 0)
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    Duration::from_secs(secs)
}

/// Receives alerts off the dispatch channel. Implementations may be
/// arbitrarily slow; the poll loop never waits on them.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, event: &AlertEvent);
}

/// Background watcher over a registry of positions. Prices come from the
/// injected provider on a fixed interval; crossings and large moves are
/// pushed to the injected sink.
pub struct PriceMonitor {
    provider: Arc<dyn PriceProvider>,
    positions: Arc<DashMap<String, WatchedPosition>>,
    status: Arc<Mutex<MonitorStatus>>,
    shutdown: Arc<Notify>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
    alert_tx: mpsc::UnboundedSender<AlertEvent>,
}

impl PriceMonitor {
    /// Spawns the alert dispatch task immediately; polling starts on
    /// `start`. Must be called within a tokio runtime.
    pub fn new(provider: Arc<dyn PriceProvider>, sink: Arc<dyn AlertSink>) -> Self {
        let (alert_tx, mut alert_rx) = mpsc::unbounded_channel::<AlertEvent>();
        tokio::spawn(async move {
            while let Some(event) = alert_rx.recv().await {
                sink.notify(&event).await;
            }
        });
        Self {
            provider,
            positions: Arc::new(DashMap::new()),
            status: Arc::new(Mutex::new(MonitorStatus::Stopped)),
            shutdown: Arc::new(Notify::new()),
            poll_handle: Mutex::new(None),
            alert_tx,
        }
    }

    /// Registers or replaces a watch. Replacing resets alert history.
    pub fn add_symbol(&self, spec: WatchSpec) {
        let symbol = spec.symbol.clone();
        self.positions
            .insert(symbol.clone(), WatchedPosition::new(spec));
        tracing::info!("Watching {}", symbol);
    }

    pub fn remove_symbol(&self, symbol: &str) -> bool {
        let removed = self.positions.remove(symbol).is_some();
        if removed {
            tracing::info!("Stopped watching {}", symbol);
        }
        removed
    }

    /// Updates the supplied levels in place; `None` leaves a level
    /// unchanged. Returns false for an unknown symbol.
    pub fn update_targets(
        &self,
        symbol: &str,
        target_price: Option<f64>,
        stop_loss: Option<f64>,
    ) -> bool {
        match self.positions.get_mut(symbol) {
            Some(mut pos) => {
                if let Some(target) = target_price {
                    pos.target_price = Some(target);
                }
                if let Some(stop) = stop_loss {
                    pos.stop_loss = Some(stop);
                }
                true
            }
            None => false,
        }
    }

    /// Starts the poll loop. A no-op when already running or paused;
    /// refuses to start over an empty registry and parks in the `Error`
    /// state so callers can see why nothing is happening.
    pub fn start(&self, poll_interval: Duration) -> Result<(), MonitorError> {
        {
            let mut status = self.status.lock().unwrap();
            match *status {
                MonitorStatus::Running | MonitorStatus::Paused => {
                    tracing::warn!("Monitor already running, ignoring start");
                    return Ok(());
                }
                _ => {}
            }
            if self.positions.is_empty() {
                *status = MonitorStatus::Error;
                return Err(MonitorError::EmptyRegistry);
            }
            *status = MonitorStatus::Running;
        }

        let positions = Arc::clone(&self.positions);
        let provider = Arc::clone(&self.provider);
        let status = Arc::clone(&self.status);
        let shutdown = Arc::clone(&self.shutdown);
        let alert_tx = self.alert_tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Paused keeps the loop ticking but skips the work
                        if *status.lock().unwrap() != MonitorStatus::Running {
                            continue;
                        }
                        Self::poll_cycle(&positions, provider.as_ref(), &alert_tx).await;
                    }
                    _ = shutdown.notified() => {
                        tracing::info!("Price monitor shutdown requested");
                        break;
                    }
                }
            }
        });
        *self.poll_handle.lock().unwrap() = Some(handle);
        tracing::info!("Price monitor started (interval {:?})", poll_interval);
        Ok(())
    }

    /// Signals the poll loop and waits for it to exit, bounded by a
    /// shutdown deadline.
    pub async fn stop(&self) -> Result<(), MonitorError> {
        let handle = self.poll_handle.lock().unwrap().take();
        let Some(handle) = handle else {
            *self.status.lock().unwrap() = MonitorStatus::Stopped;
            return Ok(());
        };
        self.shutdown.notify_one();
        match tokio::time::timeout(STOP_DEADLINE, handle).await {
            Ok(_) => {
                *self.status.lock().unwrap() = MonitorStatus::Stopped;
                tracing::info!("Price monitor stopped");
                Ok(())
            }
            Err(_) => Err(MonitorError::StopTimeout),
        }
    }

    pub fn pause(&self) {
        let mut status = self.status.lock().unwrap();
        if *status == MonitorStatus::Running {
            *status = MonitorStatus::Paused;
            tracing::info!("Price monitor paused");
        }
    }

    pub fn resume(&self) {
        let mut status = self.status.lock().unwrap();
        if *status == MonitorStatus::Paused {
            *status = MonitorStatus::Running;
            tracing::info!("Price monitor resumed");
        }
    }

    pub fn status(&self) -> MonitorReport {
        let positions: Vec<PositionSnapshot> =
            self.positions.iter().map(|entry| entry.snapshot()).collect();
        MonitorReport {
            status: *self.status.lock().unwrap(),
            watched_count: positions.len(),
            total_alerts: positions.iter().map(|p| p.alert_count as u64).sum(),
            positions,
        }
    }

    pub fn position_status(&self, symbol: &str) -> Option<PositionSnapshot> {
        self.positions.get(symbol).map(|pos| pos.snapshot())
    }

    /// Runs one check for a single symbol right now, regardless of the
    /// loop state. Returns the kinds of any alerts fired, in evaluation
    /// order.
    pub async fn force_check(&self, symbol: &str) -> Result<Vec<AlertKind>, MonitorError> {
        if !self.positions.contains_key(symbol) {
            return Err(MonitorError::UnknownSymbol(symbol.to_string()));
        }
        let price = self
            .provider
            .fetch_current_price(symbol)
            .await
            .map_err(|e| MonitorError::Fetch(e.to_string()))?;

        let Some(mut pos) = self.positions.get_mut(symbol) else {
            return Err(MonitorError::UnknownSymbol(symbol.to_string()));
        };
        let events = pos.evaluate(price, Utc::now());
        let kinds = events.iter().map(|event| event.kind).collect();
        drop(pos);
        for event in events {
            let _ = self.alert_tx.send(event);
        }
        Ok(kinds)
    }

    async fn poll_cycle(
        positions: &DashMap<String, WatchedPosition>,
        provider: &dyn PriceProvider,
        alert_tx: &mpsc::UnboundedSender<AlertEvent>,
    ) {
        let symbols: Vec<String> = positions.iter().map(|entry| entry.key().clone()).collect();
        let now = Utc::now();
        for symbol in symbols {
            let expired = positions
                .get(&symbol)
                .and_then(|pos| pos.expires_at)
                .is_some_and(|expires| expires <= now);
            if expired {
                positions.remove(&symbol);
                tracing::info!("Watch on {} expired, removing", symbol);
                continue;
            }

            // Work on a snapshot so no map reference is held across the
            // fetch, and so a removal mid-check still gets its alerts
            // delivered rather than half-firing.
            let Some(mut checked) = positions.get(&symbol).map(|pos| pos.clone()) else {
                continue;
            };
            let price = match provider.fetch_current_price(&symbol).await {
                Ok(price) => price,
                Err(e) => {
                    tracing::warn!("Price fetch failed for {}: {}", symbol, e);
                    continue;
                }
            };

            let events = checked.evaluate(price, now);

            // Merge evaluation results back; a watch removed during the
            // fetch stays removed, and concurrent target updates are
            // preserved
            if let Some(mut live) = positions.get_mut(&symbol) {
                live.current_price = checked.current_price;
                live.last_alert_price = checked.last_alert_price;
                live.alert_count = checked.alert_count;
            }
            for event in events {
                tracing::info!("Alert for {}: {:?} at {:.2}", symbol, event.kind, price);
                let _ = alert_tx.send(event);
            }
        }
    }
}
