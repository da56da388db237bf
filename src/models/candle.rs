use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Candle {
    /// Candle open time (epoch ms)
    pub timestamp: u64,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume in base units
    pub volume: f64,
}

/// Checks that a fetched series can be handed to the analysis core:
/// strictly increasing timestamps and finite OHLC values.
pub fn validate_series(candles: &[Candle]) -> Result<(), String> {
    for (idx, candle) in candles.iter().enumerate() {
        let prices = [candle.open, candle.high, candle.low, candle.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(format!("non-finite price at index {idx}"));
        }
        if candle.high < candle.low {
            return Err(format!("high below low at index {idx}"));
        }
    }

    if let Some(pair) = candles
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        return Err(format!(
            "timestamps not strictly increasing at index {}",
            pair + 1
        ));
    }

    Ok(())
}
