use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched news article — the unit of deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// Point-in-time technical indicator values for one symbol.
/// Every field is optional: an indicator the upstream analyzer could not
/// compute degrades to a neutral contribution during scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub williams_r: Option<f64>,
    pub macd: Option<f64>,
    pub sma_10: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
    pub price_change_5d: Option<f64>,
    pub volume_ratio_20: Option<f64>,
}

/// Fundamental analyzer output. "Unavailable" (never attempted) scores
/// neutral; "Failed" (attempted, errored) is penalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FundamentalSnapshot {
    /// Normalized score in [0, 1].
    Score(f64),
    Unavailable,
    Failed,
}

impl FundamentalSnapshot {
    pub fn to_subscore(self) -> f64 {
        match self {
            FundamentalSnapshot::Score(s) => s.clamp(0.0, 1.0),
            FundamentalSnapshot::Unavailable => 0.5,
            FundamentalSnapshot::Failed => 0.0,
        }
    }
}

/// Sentiment signal from an external LLM analyzer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LlmSentiment {
    /// Signed polarity, -1.0 (very negative) to 1.0 (very positive).
    pub score: f64,
    /// Analyzer's own confidence, 0.0 to 1.0.
    pub confidence: f64,
}

impl LlmSentiment {
    /// Map to a [0, 1] sub-score, shrinking toward neutral 0.5 when the
    /// analyzer is unsure.
    pub fn to_unit_score(self) -> f64 {
        (0.5 + self.score * self.confidence * 0.5).clamp(0.0, 1.0)
    }
}

/// Direction of a market trend signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrendSignal {
    Bullish,
    Neutral,
    Bearish,
}

impl TrendSignal {
    /// Contribution to the market sub-score (±0.15 per aligned signal).
    pub fn bias(self) -> f64 {
        match self {
            TrendSignal::Bullish => 0.15,
            TrendSignal::Neutral => 0.0,
            TrendSignal::Bearish => -0.15,
        }
    }
}

/// Broad-market context for scoring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketTrend {
    pub short_term: TrendSignal,
    pub medium_term: TrendSignal,
}

impl Default for MarketTrend {
    fn default() -> Self {
        Self {
            short_term: TrendSignal::Neutral,
            medium_term: TrendSignal::Neutral,
        }
    }
}

/// Immutable snapshot handed to the scoring engine. Built by the
/// orchestrator from the external analyzers; consumed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub symbol: String,
    pub current_price: f64,
    pub technicals: TechnicalSnapshot,
    pub fundamental: FundamentalSnapshot,
    #[serde(default)]
    pub llm_sentiment: Option<LlmSentiment>,
    /// Classic news polarity in [-1, 1]; fallback when no LLM signal exists.
    pub news_sentiment: f64,
    pub catalyst_count: u32,
    pub market_trend: MarketTrend,
}

/// Scoring outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Skip,
}

/// Per-factor sub-scores, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub technical: f64,
    pub fundamental: f64,
    pub sentiment: f64,
    pub catalyst: f64,
    pub market: f64,
}

/// Scoring engine output. Immutable; SKIP decisions carry zero
/// confidence/target/stop and must not be traded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub symbol: String,
    pub action: TradeAction,
    /// 0-100.
    pub confidence: f64,
    pub current_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    /// Weighted composite in [0, 1].
    pub composite_score: f64,
    pub subscores: SubScores,
    pub reasoning: String,
    pub generated_at: DateTime<Utc>,
}

impl Decision {
    pub fn is_buy(&self) -> bool {
        self.action == TradeAction::Buy
    }
}

/// A concrete, human-auditable trade plan derived from a BUY decision.
/// Created once per decision; a new plan supersedes an old one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePlan {
    pub symbol: String,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size_shares: u64,
    pub investment_amount: f64,
    pub risk_amount: f64,
    pub risk_pct_of_portfolio: f64,
    pub risk_reward_ratio: f64,
    /// Confidence carried over from the decision, 0-100.
    pub confidence: f64,
    pub entry_date: DateTime<Utc>,
    pub expected_exit_date: DateTime<Utc>,
    pub holding_period_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fundamental_asymmetry() {
        assert_eq!(FundamentalSnapshot::Unavailable.to_subscore(), 0.5);
        assert_eq!(FundamentalSnapshot::Failed.to_subscore(), 0.0);
        assert_eq!(FundamentalSnapshot::Score(0.8).to_subscore(), 0.8);
        // Out-of-range scores are clamped, not rejected
        assert_eq!(FundamentalSnapshot::Score(1.7).to_subscore(), 1.0);
    }

    #[test]
    fn llm_sentiment_unit_mapping() {
        let confident_positive = LlmSentiment { score: 1.0, confidence: 1.0 };
        assert!((confident_positive.to_unit_score() - 1.0).abs() < 1e-9);

        let unsure_positive = LlmSentiment { score: 1.0, confidence: 0.2 };
        assert!((unsure_positive.to_unit_score() - 0.6).abs() < 1e-9);

        let neutral = LlmSentiment { score: 0.0, confidence: 0.9 };
        assert!((neutral.to_unit_score() - 0.5).abs() < 1e-9);
    }
}
