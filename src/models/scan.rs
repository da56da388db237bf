use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::business_logic::patterns::PatternMatch;
use crate::business_logic::structure::{ChochEvent, Trend};
use crate::models::alert::{AlertCategory, AlertMessage, SUPPORTED_CATEGORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentState {
    Signals,
    NoSignal,
    Failed,
}

/// Per-timeframe structure figures shown in the status API
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StructureSummary {
    pub bos_count: u32,
    pub choch_occurred: bool,
    pub last_trend: Option<Trend>,
    pub swing_count: usize,
    pub choch_count: usize,
    pub last_choch: Option<ChochEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InstrumentStatus {
    pub symbol: String,
    pub state: InstrumentState,
    pub daily: Option<StructureSummary>,
    pub hourly: Option<StructureSummary>,
    pub five_minute: Option<StructureSummary>,
    pub pattern: Option<PatternMatch>,
    pub alerts: Vec<AlertMessage>,
    pub error: Option<String>,
    pub summary: String,
}

/// Result of the latest scan cycle. Replaced wholesale every cycle.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ScanSnapshot {
    pub as_of_ms: u64,
    pub cycle: u64,
    pub instruments: Vec<InstrumentStatus>,
    /// Set when the instrument listing failed for this cycle
    pub listing_error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema, IntoParams)]
pub struct ScanQuery {
    /// Only return this symbol
    #[validate(length(min = 1, max = 32))]
    #[param(example = "BTCUSDT")]
    pub symbol: Option<String>,
    /// Only return instruments with an alert of this category.
    /// Supported: TREND_FOLLOWING, COUNTER_TREND, POSSIBLE_REVERSAL, PATTERN_ALERT.
    #[validate(custom(function = "validate_category"))]
    #[param(example = "PATTERN_ALERT")]
    pub category: Option<String>,
}

pub fn validate_category(value: &str) -> Result<(), ValidationError> {
    if AlertCategory::parse(value).is_some() {
        return Ok(());
    }

    let mut error = ValidationError::new("unsupported_category");
    error.message = Some(
        format!(
            "category must be one of: {}",
            SUPPORTED_CATEGORIES.join(", ")
        )
        .into(),
    );
    Err(error)
}

impl ScanSnapshot {
    /// Applies a validated query to the snapshot
    pub fn filtered(mut self, query: &ScanQuery) -> Self {
        let category = query.category.as_deref().and_then(AlertCategory::parse);

        self.instruments.retain(|status| {
            let symbol_ok = query
                .symbol
                .as_deref()
                .map_or(true, |symbol| status.symbol.eq_ignore_ascii_case(symbol));
            let category_ok =
                category.map_or(true, |c| status.alerts.iter().any(|a| a.category == c));
            symbol_ok && category_ok
        });
        self
    }
}
