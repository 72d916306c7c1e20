use crate::AnalysisError;
use async_trait::async_trait;

/// Live price source backing the monitor and the orchestrator.
/// Implementations wrap a market-data provider; tests substitute fakes.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_current_price(&self, symbol: &str) -> Result<f64, AnalysisError>;
}
