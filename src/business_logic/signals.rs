use crate::business_logic::config::{ScannerConfig, SignalConfig};
use crate::business_logic::patterns::{pattern_verdict, PatternMatch, PatternVerdict};
use crate::business_logic::structure::{analyze_structure, StructureReport};
use crate::models::alert::{AlertCategory, AlertMessage};
use crate::models::candle::Candle;

/// Candle windows for one instrument
#[derive(Debug, Clone, Copy)]
pub struct TimeframeSeries<'a> {
    pub daily: &'a [Candle],
    pub hourly: &'a [Candle],
    pub five_minute: &'a [Candle],
}

/// Everything the core derived for one instrument in one call
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub daily: StructureReport,
    pub hourly: StructureReport,
    pub five_minute: StructureReport,
    /// Chart pattern verdict on the 1h series
    pub pattern: PatternVerdict,
    pub alerts: Vec<AlertMessage>,
}

/// Runs structure tracking on every timeframe and pattern matching on the
/// 1h series, then composes the alerts. Pure: no state survives the call.
pub fn analyze(symbol: &str, series: &TimeframeSeries<'_>, config: &ScannerConfig) -> Analysis {
    let daily = analyze_structure(series.daily, config.swing_width);
    let hourly = analyze_structure(series.hourly, config.swing_width);
    let five_minute = analyze_structure(series.five_minute, config.swing_width);
    let pattern = pattern_verdict(series.hourly, &config.patterns);

    let alerts = compose(
        symbol,
        &daily,
        &hourly,
        &five_minute,
        pattern.confirmed.as_ref(),
        &config.signals,
    );

    Analysis {
        daily,
        hourly,
        five_minute,
        pattern,
        alerts,
    }
}

/// Maps structure reports and the 1h pattern to alert categories. Trend
/// following and counter trend are allowed to fire together.
pub fn compose(
    symbol: &str,
    daily: &StructureReport,
    hourly: &StructureReport,
    five_minute: &StructureReport,
    pattern: Option<&PatternMatch>,
    config: &SignalConfig,
) -> Vec<AlertMessage> {
    let bos_1h = hourly.bos_count;
    let bos_5m = five_minute.bos_count;
    let aligned = bos_1h <= config.trend_max_bos && bos_5m <= config.trend_max_bos;
    let mut alerts = Vec::new();

    if aligned {
        alerts.push(AlertMessage {
            category: AlertCategory::TrendFollowing,
            symbol: symbol.to_string(),
            body: format!(
                "🔔 TREND FOLLOWING\n{symbol}\nDaily + 1H aligned. BOS(1H)={bos_1h}, BOS(5m)={bos_5m}"
            ),
        });
    }

    if aligned && daily.choch_occurred {
        alerts.push(AlertMessage {
            category: AlertCategory::CounterTrend,
            symbol: symbol.to_string(),
            body: format!(
                "🔔 COUNTER-TREND\n{symbol}\nDaily vs 1H opposite. BOS(1H)={bos_1h}, BOS(5m)={bos_5m}"
            ),
        });
    }

    if bos_1h > config.reversal_bos_threshold {
        alerts.push(AlertMessage {
            category: AlertCategory::PossibleReversal,
            symbol: symbol.to_string(),
            body: format!(
                "⚠️ POSSIBLE REVERSAL\n{symbol}\nMore than {} BOS on 1H → Trend may reverse!",
                config.reversal_bos_threshold
            ),
        });
    }

    if let Some(found) = pattern.filter(|m| m.confirmed) {
        alerts.push(AlertMessage {
            category: AlertCategory::PatternAlert,
            symbol: symbol.to_string(),
            body: format!(
                "🔔 PATTERN ALERT\n{symbol}\nPattern: {}\nTimeframe: 1H",
                found.pattern.name()
            ),
        });
    }

    alerts
}
