//! 7-day swing trading strategy: turns a BUY decision into a sized,
//! risk-managed trade plan and scores how well the setup suits the
//! strategy's profile. Risk is fixed; reward is what gets adjusted.

use analysis_core::{AnalysisError, AnalysisInput, Decision, TradePlan};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub holding_period_days: i64,
    /// Hard cap on one position as a fraction of portfolio value.
    pub max_position_fraction: f64,
    /// Maximum fraction of portfolio value risked per trade.
    pub max_risk_fraction: f64,
    /// Positions below this fraction of the portfolio are bumped up so
    /// trivial trades are not proposed.
    pub min_position_fraction: f64,
    pub stop_loss_pct: f64,
    /// Confidence-scaled take-profit used when the decision carries no
    /// usable target.
    pub take_profit_pct: f64,
    pub min_risk_reward: f64,
    /// Decision targets implying more upside than this are capped.
    pub max_upside_cap: f64,
    /// Penny-stock floor for the suitability check.
    pub min_price: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            holding_period_days: 7,
            max_position_fraction: 0.10,
            max_risk_fraction: 0.02,
            min_position_fraction: 0.01,
            stop_loss_pct: 0.08,
            take_profit_pct: 0.15,
            min_risk_reward: 1.5,
            max_upside_cap: 0.30,
            min_price: 50.0,
        }
    }
}

impl StrategyConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = std::env::var("STRATEGY_HOLDING_DAYS").ok().and_then(|s| s.parse().ok()) {
            config.holding_period_days = v;
        }
        if let Some(v) = std::env::var("STRATEGY_MAX_RISK_FRACTION").ok().and_then(|s| s.parse().ok())
        {
            config.max_risk_fraction = v;
        }
        if let Some(v) = std::env::var("STRATEGY_MIN_RISK_REWARD").ok().and_then(|s| s.parse().ok())
        {
            config.min_risk_reward = v;
        }
        config
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.holding_period_days <= 0 {
            return Err(AnalysisError::Configuration(format!(
                "holding_period_days must be positive, got {}",
                self.holding_period_days
            )));
        }
        if !(0.0..1.0).contains(&self.stop_loss_pct) || self.stop_loss_pct == 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "stop_loss_pct must be in (0, 1), got {}",
                self.stop_loss_pct
            )));
        }
        if self.max_risk_fraction <= 0.0 || self.max_position_fraction <= 0.0 {
            return Err(AnalysisError::Configuration(
                "risk and position fractions must be positive".to_string(),
            ));
        }
        if self.min_risk_reward < 1.0 {
            return Err(AnalysisError::Configuration(format!(
                "min_risk_reward below 1.0 makes losing trades structural, got {}",
                self.min_risk_reward
            )));
        }
        Ok(())
    }
}

/// Advisory suitability report. Never gates plan creation — it annotates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingValidation {
    pub symbol: String,
    pub is_suitable: bool,
    /// 0-100.
    pub score: u32,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendation: String,
}

/// Strategy parameters and rules in human-readable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy_name: String,
    pub holding_period_days: i64,
    pub max_position_fraction: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub min_risk_reward: f64,
    pub key_rules: Vec<String>,
}

pub struct SwingStrategy {
    config: StrategyConfig,
}

impl SwingStrategy {
    pub fn new(config: StrategyConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: StrategyConfig::default(),
        }
    }

    /// Shares to buy: the minimum of risk-based and confidence-based sizing
    /// (the risk cap is a hard ceiling confidence can only shrink under),
    /// then floored at the minimum meaningful position.
    fn position_size(&self, entry: f64, risk_per_share: f64, confidence: f64, portfolio: f64) -> u64 {
        let shares_by_risk = (portfolio * self.config.max_risk_fraction / risk_per_share) as u64;
        let shares_by_confidence =
            (portfolio * self.config.max_position_fraction * (confidence / 100.0) / entry) as u64;

        let optimal = shares_by_risk.min(shares_by_confidence);
        let min_shares = (portfolio * self.config.min_position_fraction / entry).ceil() as u64;
        optimal.max(min_shares)
    }

    /// Build a trade plan for a BUY decision. Returns `None` for SKIP or
    /// unusable inputs.
    pub fn plan(&self, decision: &Decision, portfolio_value: f64) -> Option<TradePlan> {
        if !decision.is_buy() {
            return None;
        }
        let entry = decision.current_price;
        if entry <= 0.0 || portfolio_value <= 0.0 {
            tracing::warn!(
                "Cannot plan {}: entry {:.2}, portfolio {:.2}",
                decision.symbol,
                entry,
                portfolio_value
            );
            return None;
        }

        let stop_loss = entry * (1.0 - self.config.stop_loss_pct);
        let risk_per_share = entry - stop_loss;

        // Take-profit: prefer the decision's target, capped at the maximum
        // reasonable upside; otherwise scale the default by confidence.
        let mut take_profit = if decision.target_price > entry {
            decision.target_price.min(entry * (1.0 + self.config.max_upside_cap))
        } else {
            entry * (1.0 + self.config.take_profit_pct * (decision.confidence / 100.0).min(1.0))
        };

        // A bad ratio is fixed by widening the reward, never by loosening
        // the stop.
        let mut risk_reward = (take_profit - entry) / risk_per_share;
        if risk_reward < self.config.min_risk_reward {
            take_profit = entry + risk_per_share * self.config.min_risk_reward;
            risk_reward = self.config.min_risk_reward;
        }

        let shares = self.position_size(entry, risk_per_share, decision.confidence, portfolio_value);
        let investment_amount = shares as f64 * entry;
        let risk_amount = shares as f64 * risk_per_share;

        let entry_date = Utc::now();
        let plan = TradePlan {
            symbol: decision.symbol.clone(),
            entry_price: entry,
            stop_loss,
            take_profit,
            position_size_shares: shares,
            investment_amount,
            risk_amount,
            risk_pct_of_portfolio: risk_amount / portfolio_value * 100.0,
            risk_reward_ratio: risk_reward,
            confidence: decision.confidence,
            entry_date,
            expected_exit_date: entry_date + Duration::days(self.config.holding_period_days),
            holding_period_days: self.config.holding_period_days,
        };

        tracing::info!(
            "Plan for {}: {} shares at {:.2}, stop {:.2}, target {:.2} (rr {:.2})",
            plan.symbol,
            plan.position_size_shares,
            plan.entry_price,
            plan.stop_loss,
            plan.take_profit,
            plan.risk_reward_ratio
        );
        Some(plan)
    }

    /// Score how well a candidate suits a 7-day swing, 0-100. Oversold RSI
    /// scores higher than overbought (contrarian bounce bias); violent
    /// recent moves are penalized as too volatile for the holding period.
    pub fn validate_opportunity(
        &self,
        decision: &Decision,
        input: &AnalysisInput,
    ) -> SwingValidation {
        let mut score = 0u32;
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        let confidence = decision.confidence;
        if confidence >= 70.0 {
            score += 30;
            reasons.push(format!("High confidence: {:.1}%", confidence));
        } else if confidence >= 50.0 {
            score += 20;
            reasons.push(format!("Medium confidence: {:.1}%", confidence));
        } else {
            score += 10;
            warnings.push(format!("Low confidence: {:.1}%", confidence));
        }

        let rsi = input.technicals.rsi.unwrap_or(50.0);
        if (30.0..=70.0).contains(&rsi) {
            score += 20;
            reasons.push(format!("RSI in good range: {:.1}", rsi));
        } else if rsi < 30.0 {
            score += 15;
            reasons.push(format!("RSI oversold: {:.1} (potential bounce)", rsi));
        } else {
            warnings.push(format!("RSI overbought: {:.1}", rsi));
        }

        let change_5d = input.technicals.price_change_5d.unwrap_or(0.0);
        if (-5.0..=10.0).contains(&change_5d) {
            score += 15;
            reasons.push(format!("Reasonable 5-day change: {:.1}%", change_5d));
        } else {
            warnings.push(format!("High volatility: {:.1}% 5-day change", change_5d));
        }

        if let Some(llm) = input.llm_sentiment {
            let unit = llm.to_unit_score();
            if unit >= 0.6 {
                score += 20;
                reasons.push(format!("Strong sentiment signal: {:.2}", unit));
            } else {
                warnings.push(format!("Weak sentiment signal: {:.2}", unit));
            }
        }

        if input.current_price >= self.config.min_price {
            score += 15;
            reasons.push(format!("Good price level: {:.2}", input.current_price));
        } else {
            warnings.push(format!("Low price stock: {:.2}", input.current_price));
        }

        let (is_suitable, recommendation) = if score >= 70 {
            (true, "Strong swing trading opportunity".to_string())
        } else if score >= 50 {
            (true, "Moderate swing trading opportunity".to_string())
        } else {
            (false, "Not suitable for swing trading".to_string())
        };

        tracing::info!(
            "Validated swing opportunity for {}: score {}/100",
            decision.symbol,
            score
        );

        SwingValidation {
            symbol: decision.symbol.clone(),
            is_suitable,
            score,
            reasons,
            warnings,
            recommendation,
        }
    }

    pub fn summary(&self) -> StrategySummary {
        let c = &self.config;
        StrategySummary {
            strategy_name: format!("{}-Day Swing Strategy", c.holding_period_days),
            holding_period_days: c.holding_period_days,
            max_position_fraction: c.max_position_fraction,
            stop_loss_pct: c.stop_loss_pct,
            take_profit_pct: c.take_profit_pct,
            min_risk_reward: c.min_risk_reward,
            key_rules: vec![
                format!("Hold positions for maximum {} days", c.holding_period_days),
                format!("Stop loss at {:.1}% below entry", c.stop_loss_pct * 100.0),
                format!("Target {:.1}% profit per trade", c.take_profit_pct * 100.0),
                format!("Maintain minimum {}:1 risk-reward ratio", c.min_risk_reward),
                format!(
                    "Limit position size to {:.1}% of portfolio",
                    c.max_position_fraction * 100.0
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{
        FundamentalSnapshot, MarketTrend, SubScores, TechnicalSnapshot, TradeAction,
    };

    fn buy_decision(price: f64, confidence: f64, target: f64) -> Decision {
        Decision {
            symbol: "TCS".to_string(),
            action: TradeAction::Buy,
            confidence,
            current_price: price,
            target_price: target,
            stop_loss: price * 0.92,
            composite_score: confidence / 100.0,
            subscores: SubScores::default(),
            reasoning: String::new(),
            generated_at: Utc::now(),
        }
    }

    fn skip_decision() -> Decision {
        Decision {
            action: TradeAction::Skip,
            confidence: 0.0,
            target_price: 0.0,
            stop_loss: 0.0,
            ..buy_decision(100.0, 0.0, 0.0)
        }
    }

    fn input_for(price: f64, rsi: Option<f64>, change_5d: Option<f64>) -> AnalysisInput {
        AnalysisInput {
            symbol: "TCS".to_string(),
            current_price: price,
            technicals: TechnicalSnapshot {
                rsi,
                price_change_5d: change_5d,
                ..TechnicalSnapshot::default()
            },
            fundamental: FundamentalSnapshot::Unavailable,
            llm_sentiment: None,
            news_sentiment: 0.0,
            catalyst_count: 0,
            market_trend: MarketTrend::default(),
        }
    }

    #[test]
    fn skip_decisions_get_no_plan() {
        let strategy = SwingStrategy::with_defaults();
        assert!(strategy.plan(&skip_decision(), 100_000.0).is_none());
    }

    #[test]
    fn plan_invariants_hold() {
        let strategy = SwingStrategy::with_defaults();
        let plan = strategy.plan(&buy_decision(100.0, 60.0, 110.0), 100_000.0).unwrap();

        assert!(plan.stop_loss < plan.entry_price);
        assert!(plan.entry_price < plan.take_profit);
        assert!(plan.risk_reward_ratio >= 1.5);
        assert!((plan.stop_loss - 92.0).abs() < 1e-9);
        assert_eq!(plan.holding_period_days, 7);
        assert_eq!(
            plan.expected_exit_date - plan.entry_date,
            Duration::days(7)
        );
    }

    #[test]
    fn risk_cap_is_a_hard_ceiling() {
        let strategy = SwingStrategy::with_defaults();
        // entry 100, stop 92: risk/share 8, so 100_000 * 2% / 8 = 250 shares
        for confidence in [10.0, 50.0, 95.0] {
            let plan = strategy
                .plan(&buy_decision(100.0, confidence, 110.0), 100_000.0)
                .unwrap();
            assert!(
                plan.position_size_shares <= 250,
                "confidence {} produced {} shares",
                confidence,
                plan.position_size_shares
            );
        }
    }

    #[test]
    fn confidence_shrinks_position_below_risk_cap() {
        let strategy = SwingStrategy::with_defaults();
        // 10% * 20% confidence / 100 entry = 20 shares, well under the
        // 250-share risk cap but above the 10-share minimum
        let plan = strategy.plan(&buy_decision(100.0, 20.0, 110.0), 100_000.0).unwrap();
        assert_eq!(plan.position_size_shares, 20);
    }

    #[test]
    fn minimum_position_floor_applies() {
        let strategy = SwingStrategy::with_defaults();
        // Near-zero confidence would size to 0; the 1% floor bumps it to
        // ceil(1_000 / 100) = 10 shares
        let plan = strategy.plan(&buy_decision(100.0, 1.0, 110.0), 100_000.0).unwrap();
        assert_eq!(plan.position_size_shares, 10);
    }

    #[test]
    fn target_capped_at_max_upside() {
        let strategy = SwingStrategy::with_defaults();
        // Decision target implies 80% upside; plan caps at 30%
        let plan = strategy.plan(&buy_decision(100.0, 80.0, 180.0), 100_000.0).unwrap();
        assert!((plan.take_profit - 130.0).abs() < 1e-9);
    }

    #[test]
    fn poor_ratio_widens_take_profit_not_stop() {
        let strategy = SwingStrategy::with_defaults();
        // Target barely above entry: rr would be ~0.25, must be widened to
        // entry + 8 * 1.5 = 112 while the stop stays at 92
        let plan = strategy.plan(&buy_decision(100.0, 60.0, 102.0), 100_000.0).unwrap();
        assert!((plan.take_profit - 112.0).abs() < 1e-9);
        assert!((plan.stop_loss - 92.0).abs() < 1e-9);
        assert!((plan.risk_reward_ratio - 1.5).abs() < 1e-9);
    }

    #[test]
    fn validation_scores_strong_setup() {
        let strategy = SwingStrategy::with_defaults();
        let decision = buy_decision(3000.0, 75.0, 3200.0);
        let input = input_for(3000.0, Some(45.0), Some(2.0));
        let result = strategy.validate_opportunity(&decision, &input);

        // 30 (confidence) + 20 (RSI) + 15 (momentum) + 15 (price) = 80
        assert_eq!(result.score, 80);
        assert!(result.is_suitable);
        assert_eq!(result.recommendation, "Strong swing trading opportunity");
    }

    #[test]
    fn validation_flags_overbought_and_volatile() {
        let strategy = SwingStrategy::with_defaults();
        let decision = buy_decision(30.0, 40.0, 35.0);
        let input = input_for(30.0, Some(78.0), Some(15.0));
        let result = strategy.validate_opportunity(&decision, &input);

        // Only the low-confidence 10 points accrue
        assert_eq!(result.score, 10);
        assert!(!result.is_suitable);
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn validation_is_advisory_not_a_gate() {
        let strategy = SwingStrategy::with_defaults();
        let decision = buy_decision(30.0, 40.0, 35.0);
        let input = input_for(30.0, Some(78.0), Some(15.0));

        let validation = strategy.validate_opportunity(&decision, &input);
        assert!(!validation.is_suitable);
        // The plan is still produced for the BUY decision
        assert!(strategy.plan(&decision, 100_000.0).is_some());
    }

    #[test]
    fn rejects_bad_config() {
        let config = StrategyConfig {
            min_risk_reward: 0.5,
            ..StrategyConfig::default()
        };
        assert!(SwingStrategy::new(config).is_err());
    }
}
