//! Weighted multi-signal scoring: turns an [`AnalysisInput`] snapshot into a
//! BUY/SKIP [`Decision`] with price targets. Pure and deterministic — the
//! same input always produces the same decision.

mod config;
mod subscores;

pub use config::{ScoreWeights, ScoringConfig};
pub use subscores::{catalyst_subscore, market_subscore, technical_subscore};

use analysis_core::{AnalysisError, AnalysisInput, Decision, SubScores, TradeAction};
use chrono::Utc;

pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Sentiment sub-score: prefer the LLM signal when present, otherwise
    /// map the classic [-1, 1] polarity onto [0, 1].
    fn sentiment_subscore(input: &AnalysisInput) -> f64 {
        match input.llm_sentiment {
            Some(llm) => llm.to_unit_score(),
            None => ((input.news_sentiment + 1.0) / 2.0).clamp(0.0, 1.0),
        }
    }

    /// Score a snapshot. Missing or partial data degrades to documented
    /// neutral defaults; this never fails. A non-positive price forces SKIP
    /// since no meaningful target or stop can be derived from it.
    pub fn score(&self, input: &AnalysisInput) -> Decision {
        let w = &self.config.weights;

        let subscores = SubScores {
            technical: technical_subscore(&input.technicals, input.current_price),
            fundamental: input.fundamental.to_subscore(),
            sentiment: Self::sentiment_subscore(input),
            catalyst: catalyst_subscore(input.catalyst_count),
            market: market_subscore(&input.market_trend),
        };

        let composite = (subscores.technical * w.technical
            + subscores.fundamental * w.fundamental
            + subscores.sentiment * w.sentiment
            + subscores.catalyst * w.catalyst
            + subscores.market * w.market)
            .clamp(0.0, 1.0);

        if input.current_price <= 0.0 {
            tracing::warn!(
                "Non-positive price for {} ({}), skipping",
                input.symbol,
                input.current_price
            );
            return self.skip(input, subscores, composite, "Invalid price data".to_string());
        }

        if composite < self.config.buy_threshold {
            let reasoning = format!(
                "Composite {:.2} below buy threshold {:.2} ({})",
                composite,
                self.config.buy_threshold,
                Self::summarize(&subscores)
            );
            return self.skip(input, subscores, composite, reasoning);
        }

        let confidence = (composite * 100.0).min(self.config.max_confidence);
        let target_price = input.current_price
            * (1.0 + (composite - self.config.buy_threshold) * self.config.upside_factor);
        let stop_loss = input.current_price * (1.0 - self.config.stop_loss_pct);

        let reasoning = format!(
            "Composite {:.2} >= threshold {:.2} ({}); target {:.2}, stop {:.2}",
            composite,
            self.config.buy_threshold,
            Self::summarize(&subscores),
            target_price,
            stop_loss
        );

        tracing::info!(
            "BUY {} at {:.2} (composite {:.2}, confidence {:.0}%)",
            input.symbol,
            input.current_price,
            composite,
            confidence
        );

        Decision {
            symbol: input.symbol.clone(),
            action: TradeAction::Buy,
            confidence,
            current_price: input.current_price,
            target_price,
            stop_loss,
            composite_score: composite,
            subscores,
            reasoning,
            generated_at: Utc::now(),
        }
    }

    fn skip(
        &self,
        input: &AnalysisInput,
        subscores: SubScores,
        composite: f64,
        reasoning: String,
    ) -> Decision {
        Decision {
            symbol: input.symbol.clone(),
            action: TradeAction::Skip,
            confidence: 0.0,
            current_price: input.current_price,
            target_price: 0.0,
            stop_loss: 0.0,
            composite_score: composite,
            subscores,
            reasoning,
            generated_at: Utc::now(),
        }
    }

    fn summarize(s: &SubScores) -> String {
        format!(
            "tech {:.2}, fund {:.2}, sent {:.2}, cat {:.2}, mkt {:.2}",
            s.technical, s.fundamental, s.sentiment, s.catalyst, s.market
        )
    }
}
