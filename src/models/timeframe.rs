use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Timeframes the scanner analyses for every instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Timeframe {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "5m")]
    FiveMinute,
}

impl Timeframe {
    pub fn label(self) -> &'static str {
        match self {
            Timeframe::Daily => "1d",
            Timeframe::Hour => "1h",
            Timeframe::FiveMinute => "5m",
        }
    }

    /// Interval code used by the Bybit kline endpoint
    pub fn bybit_interval(self) -> &'static str {
        match self {
            Timeframe::Daily => "D",
            Timeframe::Hour => "60",
            Timeframe::FiveMinute => "5",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
