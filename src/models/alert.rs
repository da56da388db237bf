use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const SUPPORTED_CATEGORIES: [&str; 4] = [
    "TREND_FOLLOWING",
    "COUNTER_TREND",
    "POSSIBLE_REVERSAL",
    "PATTERN_ALERT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    TrendFollowing,
    CounterTrend,
    PossibleReversal,
    PatternAlert,
}

impl AlertCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertCategory::TrendFollowing => "TREND_FOLLOWING",
            AlertCategory::CounterTrend => "COUNTER_TREND",
            AlertCategory::PossibleReversal => "POSSIBLE_REVERSAL",
            AlertCategory::PatternAlert => "PATTERN_ALERT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TREND_FOLLOWING" => Some(AlertCategory::TrendFollowing),
            "COUNTER_TREND" => Some(AlertCategory::CounterTrend),
            "POSSIBLE_REVERSAL" => Some(AlertCategory::PossibleReversal),
            "PATTERN_ALERT" => Some(AlertCategory::PatternAlert),
            _ => None,
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert handed to the notifier. Never stored beyond the current
/// cycle snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AlertMessage {
    pub category: AlertCategory,
    pub symbol: String,
    pub body: String,
}
