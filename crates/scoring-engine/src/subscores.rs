use analysis_core::{MarketTrend, TechnicalSnapshot};

/// Momentum component: RSI band, stochastic %K, Williams %R. Oversold maps
/// high (bullish reversal), overbought maps low. Missing values take the
/// neutral band's contribution.
fn momentum_score(t: &TechnicalSnapshot) -> f64 {
    let mut score: f64 = 0.0;

    score += match t.rsi {
        Some(rsi) if rsi < 30.0 => 0.8,
        Some(rsi) if rsi < 40.0 => 0.6,
        Some(rsi) if rsi > 70.0 => 0.2,
        Some(rsi) if rsi > 60.0 => 0.4,
        _ => 0.5,
    };

    score += match t.stoch_k {
        Some(k) if k < 20.0 => 0.3,
        Some(k) if k > 80.0 => 0.1,
        _ => 0.2,
    };

    score += match t.williams_r {
        Some(w) if w < -80.0 => 0.3,
        Some(w) if w > -20.0 => 0.1,
        _ => 0.2,
    };

    score.min(1.0)
}

/// Trend component: moving-average ordering plus MACD sign.
fn trend_score(t: &TechnicalSnapshot, price: f64) -> f64 {
    let mut score: f64 = 0.0;

    score += match (t.sma_10, t.sma_20) {
        (Some(s10), Some(s20)) if price > s10 && s10 > s20 => 0.8,
        (Some(s10), Some(s20)) if price < s10 && s10 < s20 => 0.2,
        (Some(s10), _) if price > s10 => 0.6,
        (Some(s10), _) if price < s10 => 0.4,
        _ => 0.5,
    };

    score += match t.macd {
        Some(m) if m > 0.0 => 0.2,
        _ => 0.1,
    };

    score.min(1.0)
}

/// Volatility component: position within the Bollinger bands plus the
/// ATR-to-price ratio. Components the analyzer did not supply contribute
/// nothing, matching the upstream behavior.
fn volatility_score(t: &TechnicalSnapshot, price: f64) -> f64 {
    let mut score: f64 = 0.0;

    if let (Some(upper), Some(lower)) = (t.bb_upper, t.bb_lower) {
        if upper > lower && price > 0.0 {
            let position = (price - lower) / (upper - lower);
            score += if position < 0.2 {
                0.8 // near lower band, potential bounce
            } else if position > 0.8 {
                0.3 // near upper band, potential pullback
            } else {
                0.5
            };
        }
    }

    if let Some(atr) = t.atr {
        if atr > 0.0 && price > 0.0 {
            let ratio = atr / price;
            score += if ratio > 0.05 { 0.2 } else { 0.3 };
        }
    }

    score.min(1.0)
}

/// Technical sub-score: momentum 40%, trend 35%, volatility 25%, each
/// component clamped to [0, 1] before blending.
pub fn technical_subscore(t: &TechnicalSnapshot, price: f64) -> f64 {
    let score =
        momentum_score(t) * 0.40 + trend_score(t, price) * 0.35 + volatility_score(t, price) * 0.25;
    score.clamp(0.0, 1.0)
}

/// Catalyst sub-score: saturates at three catalysts.
pub fn catalyst_subscore(count: u32) -> f64 {
    (count as f64 / 3.0).min(1.0)
}

/// Market sub-score: neutral base shifted by the short- and medium-term
/// trend alignment.
pub fn market_subscore(trend: &MarketTrend) -> f64 {
    (0.5 + trend.short_term.bias() + trend.medium_term.bias()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::TrendSignal;

    #[test]
    fn oversold_beats_overbought() {
        let oversold = TechnicalSnapshot {
            rsi: Some(25.0),
            stoch_k: Some(15.0),
            williams_r: Some(-85.0),
            ..TechnicalSnapshot::default()
        };
        let overbought = TechnicalSnapshot {
            rsi: Some(75.0),
            stoch_k: Some(85.0),
            williams_r: Some(-10.0),
            ..TechnicalSnapshot::default()
        };
        assert!(technical_subscore(&oversold, 100.0) > technical_subscore(&overbought, 100.0));
    }

    #[test]
    fn empty_snapshot_scores_neutral_bands() {
        // No indicators at all: momentum 0.9, trend 0.6, volatility 0
        let score = technical_subscore(&TechnicalSnapshot::default(), 100.0);
        assert!((score - (0.9 * 0.40 + 0.6 * 0.35)).abs() < 1e-9);
    }

    #[test]
    fn strong_uptrend_ordering() {
        let t = TechnicalSnapshot {
            sma_10: Some(98.0),
            sma_20: Some(95.0),
            macd: Some(0.5),
            ..TechnicalSnapshot::default()
        };
        // price > sma10 > sma20 and bullish MACD caps the trend component
        assert!((trend_score(&t, 100.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bollinger_band_position() {
        let near_lower = TechnicalSnapshot {
            bb_upper: Some(110.0),
            bb_lower: Some(99.0),
            ..TechnicalSnapshot::default()
        };
        assert!((volatility_score(&near_lower, 100.0) - 0.8).abs() < 1e-9);

        let near_upper = TechnicalSnapshot {
            bb_upper: Some(101.0),
            bb_lower: Some(90.0),
            ..TechnicalSnapshot::default()
        };
        assert!((volatility_score(&near_upper, 100.0) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn catalyst_saturation() {
        assert_eq!(catalyst_subscore(0), 0.0);
        assert!((catalyst_subscore(2) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(catalyst_subscore(3), 1.0);
        assert_eq!(catalyst_subscore(10), 1.0);
    }

    #[test]
    fn market_alignment_shifts() {
        let both_up = MarketTrend {
            short_term: TrendSignal::Bullish,
            medium_term: TrendSignal::Bullish,
        };
        assert!((market_subscore(&both_up) - 0.8).abs() < 1e-9);

        let mixed = MarketTrend {
            short_term: TrendSignal::Bullish,
            medium_term: TrendSignal::Bearish,
        };
        assert!((market_subscore(&mixed) - 0.5).abs() < 1e-9);

        assert!((market_subscore(&MarketTrend::default()) - 0.5).abs() < 1e-9);
    }
}
