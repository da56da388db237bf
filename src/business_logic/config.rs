use crate::business_logic::patterns::{CandidateOrder, PatternPriority};

/// Configuration parameters for structure and pattern analysis
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Candles fetched per timeframe
    pub candle_limit: usize,
    /// Neighbours on each side a swing point must exceed
    pub swing_width: usize,
    pub patterns: PatternConfig,
    pub signals: SignalConfig,
}

#[derive(Debug, Clone)]
pub struct PatternConfig {
    /// Max relative difference between the two peaks/troughs of a double top/bottom
    pub double_tolerance: f64,
    /// Max shoulder difference relative to the head
    pub shoulder_tolerance: f64,
    /// Which candidate wins when several confirm on the same series
    pub candidate_order: CandidateOrder,
    /// Detector evaluation order for the per-instrument verdict
    pub priority: PatternPriority,
}

#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// Trend alerts fire while 1h and 5m BOS counts are at or below this
    pub trend_max_bos: u32,
    /// Reversal warning fires once the 1h BOS count exceeds this
    pub reversal_bos_threshold: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            candle_limit: 200,
            swing_width: 1,
            patterns: PatternConfig::default(),
            signals: SignalConfig::default(),
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            double_tolerance: 0.003,
            shoulder_tolerance: 0.05,
            candidate_order: CandidateOrder::OldestFirst,
            priority: PatternPriority::default(),
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            trend_max_bos: 1,
            reversal_bos_threshold: 4,
        }
    }
}
