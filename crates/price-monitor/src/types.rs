use analysis_core::TradePlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MOVEMENT_THRESHOLD_PCT: f64 = 5.0;

/// Caller-supplied description of a position to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSpec {
    pub symbol: String,
    pub current_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub entry_price: Option<f64>,
    /// Percent move from the last alerted price that triggers a
    /// significant-movement alert.
    pub movement_threshold_pct: f64,
    /// When set, the position is dropped from the watchlist once this
    /// instant passes. `None` means watch until explicitly removed.
    pub expires_at: Option<DateTime<Utc>>,
}

impl WatchSpec {
    pub fn new(symbol: impl Into<String>, current_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            current_price,
            target_price: None,
            stop_loss: None,
            entry_price: None,
            movement_threshold_pct: DEFAULT_MOVEMENT_THRESHOLD_PCT,
            expires_at: None,
        }
    }

    /// Watch a planned trade: targets from the plan, expiry at the
    /// expected exit date.
    pub fn from_plan(plan: &TradePlan) -> Self {
        Self {
            symbol: plan.symbol.clone(),
            current_price: plan.entry_price,
            target_price: Some(plan.take_profit),
            stop_loss: Some(plan.stop_loss),
            entry_price: Some(plan.entry_price),
            movement_threshold_pct: DEFAULT_MOVEMENT_THRESHOLD_PCT,
            expires_at: Some(plan.expected_exit_date),
        }
    }
}

/// Monitor-owned per-symbol state.
#[derive(Debug, Clone)]
pub(crate) struct WatchedPosition {
    pub symbol: String,
    pub current_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub entry_price: Option<f64>,
    pub movement_threshold_pct: f64,
    pub expires_at: Option<DateTime<Utc>>,
    /// Price at the moment the last alert fired. Unset until the first
    /// alert; significant-movement checks are measured against it.
    pub last_alert_price: Option<f64>,
    pub alert_count: u32,
    pub created_at: DateTime<Utc>,
}

impl WatchedPosition {
    pub fn new(spec: WatchSpec) -> Self {
        Self {
            symbol: spec.symbol,
            current_price: spec.current_price,
            target_price: spec.target_price,
            stop_loss: spec.stop_loss,
            entry_price: spec.entry_price,
            movement_threshold_pct: spec.movement_threshold_pct,
            expires_at: spec.expires_at,
            last_alert_price: None,
            alert_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            symbol: self.symbol.clone(),
            current_price: self.current_price,
            target_price: self.target_price,
            stop_loss: self.stop_loss,
            entry_price: self.entry_price,
            movement_threshold_pct: self.movement_threshold_pct,
            expires_at: self.expires_at,
            last_alert_price: self.last_alert_price,
            alert_count: self.alert_count,
            created_at: self.created_at,
        }
    }

    /// Apply one observed price. Every triggered alert type fires, in
    /// fixed order: target, stop-loss, significant movement — so a price
    /// that crosses the target while also moving sharply reports the
    /// target first. Target and stop are edge-triggered on the crossing,
    /// so a price that stays beyond the level does not re-alert.
    /// Movement is measured from the last alerted price and therefore
    /// only arms after some alert has fired. However many types trigger,
    /// `last_alert_price` and `alert_count` update once per call.
    pub fn evaluate(&mut self, new_price: f64, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let old_price = self.current_price;
        let mut fired: Vec<(AlertKind, Option<f64>)> = Vec::new();

        if let Some(target) = self.target_price {
            if old_price < target && new_price >= target {
                fired.push((AlertKind::TargetHit, None));
            }
        }
        if let Some(stop) = self.stop_loss {
            if old_price > stop && new_price <= stop {
                fired.push((AlertKind::StopLossHit, None));
            }
        }
        if let Some(last_alert) = self.last_alert_price {
            let movement_pct = (new_price - last_alert).abs() / last_alert * 100.0;
            if movement_pct >= self.movement_threshold_pct {
                fired.push((AlertKind::SignificantMovement, Some(movement_pct)));
            }
        }

        self.current_price = new_price;
        if fired.is_empty() {
            return Vec::new();
        }
        self.last_alert_price = Some(new_price);
        self.alert_count += 1;

        let snapshot = self.snapshot();
        fired
            .into_iter()
            .map(|(kind, movement_pct)| AlertEvent {
                kind,
                snapshot: snapshot.clone(),
                movement_pct,
                triggered_at: now,
            })
            .collect()
    }
}

/// Read-only copy of a watched position, handed out by status queries
/// and carried inside alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub entry_price: Option<f64>,
    pub movement_threshold_pct: f64,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_alert_price: Option<f64>,
    pub alert_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlertKind {
    TargetHit,
    StopLossHit,
    SignificantMovement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub snapshot: PositionSnapshot,
    /// Only set for `SignificantMovement`.
    pub movement_pct: Option<f64>,
    pub triggered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MonitorStatus {
    Stopped,
    Running,
    Paused,
    Error,
}

/// Aggregate view returned by `PriceMonitor::status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorReport {
    pub status: MonitorStatus,
    pub watched_count: usize,
    pub total_alerts: u64,
    pub positions: Vec<PositionSnapshot>,
}
