use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

/// Relative weights of the five sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub technical: f64,
    pub fundamental: f64,
    pub sentiment: f64,
    pub catalyst: f64,
    pub market: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            technical: 0.30,
            fundamental: 0.25,
            sentiment: 0.20,
            catalyst: 0.15,
            market: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.technical + self.fundamental + self.sentiment + self.catalyst + self.market
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Composite score at or above which the decision is BUY. Deliberately
    /// permissive: the product goal is surfacing candidates, not hard gating.
    pub buy_threshold: f64,
    /// Scales (composite - threshold) into target-price upside.
    pub upside_factor: f64,
    /// Fixed stop-loss distance below the current price.
    pub stop_loss_pct: f64,
    /// Confidence ceiling, in percent.
    pub max_confidence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            buy_threshold: 0.35,
            upside_factor: 0.40,
            stop_loss_pct: 0.08,
            max_confidence: 95.0,
        }
    }
}

impl ScoringConfig {
    /// Environment overrides on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_f64("SCORING_BUY_THRESHOLD") {
            config.buy_threshold = v;
        }
        if let Some(v) = env_f64("SCORING_UPSIDE_FACTOR") {
            config.upside_factor = v;
        }
        if let Some(v) = env_f64("SCORING_STOP_LOSS_PCT") {
            config.stop_loss_pct = v;
        }
        config
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(AnalysisError::Configuration(format!(
                "Score weights must sum to 1.0, got {:.6}",
                sum
            )));
        }
        if !(0.0..=1.0).contains(&self.buy_threshold) {
            return Err(AnalysisError::Configuration(format!(
                "buy_threshold must be in [0, 1], got {}",
                self.buy_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.stop_loss_pct) {
            return Err(AnalysisError::Configuration(format!(
                "stop_loss_pct must be in [0, 1), got {}",
                self.stop_loss_pct
            )));
        }
        if self.upside_factor < 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "upside_factor must be non-negative, got {}",
                self.upside_factor
            )));
        }
        Ok(())
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
