use std::future::Future;

use crate::errors::AnalysisError;
use crate::models::candle::Candle;
use crate::models::timeframe::Timeframe;

/// Supplies validated, chronologically ordered candle windows.
pub trait CandleSource: Send + Sync {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candle>, AnalysisError>> + Send;
}

/// Lists the instruments worth scanning.
pub trait InstrumentSource: Send + Sync {
    /// Symbols whose 24h turnover is at least `min_turnover`, sorted.
    fn list_symbols_above_turnover(
        &self,
        min_turnover: f64,
    ) -> impl Future<Output = anyhow::Result<Vec<String>>> + Send;
}

/// Best-effort delivery of alert text. Implementations log their own
/// failures; callers never see them.
pub trait Notifier: Send + Sync {
    fn notify(&self, text: &str) -> impl Future<Output = ()> + Send;
}
