use std::ops::Range;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::business_logic::config::PatternConfig;
use crate::models::candle::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChartPattern {
    DoubleTop,
    DoubleBottom,
    HeadAndShoulders,
    InverseHeadAndShoulders,
}

/// Side of the neckline the last close must be on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breakout {
    Below,
    Above,
}

impl Breakout {
    fn is_broken(self, close: f64, neckline: f64) -> bool {
        match self {
            Breakout::Below => close < neckline,
            Breakout::Above => close > neckline,
        }
    }
}

impl ChartPattern {
    pub fn name(self) -> &'static str {
        match self {
            ChartPattern::DoubleTop => "DOUBLE TOP",
            ChartPattern::DoubleBottom => "DOUBLE BOTTOM",
            ChartPattern::HeadAndShoulders => "HEAD & SHOULDERS",
            ChartPattern::InverseHeadAndShoulders => "INVERSE HEAD & SHOULDERS",
        }
    }

    /// Accepts snake_case names as used in configuration
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "double_top" => Some(ChartPattern::DoubleTop),
            "double_bottom" => Some(ChartPattern::DoubleBottom),
            "head_and_shoulders" => Some(ChartPattern::HeadAndShoulders),
            "inverse_head_and_shoulders" => Some(ChartPattern::InverseHeadAndShoulders),
            _ => None,
        }
    }

    fn breakout(self) -> Breakout {
        match self {
            ChartPattern::DoubleTop | ChartPattern::HeadAndShoulders => Breakout::Below,
            ChartPattern::DoubleBottom | ChartPattern::InverseHeadAndShoulders => Breakout::Above,
        }
    }

    /// Anchor indices that leave room for the whole shape
    fn anchors(self, len: usize) -> Range<usize> {
        match self {
            ChartPattern::DoubleTop | ChartPattern::DoubleBottom => 0..len.saturating_sub(2),
            ChartPattern::HeadAndShoulders | ChartPattern::InverseHeadAndShoulders => {
                if len < 5 {
                    0..0
                } else {
                    2..len - 2
                }
            }
        }
    }

    /// Neckline of the shape anchored at `i`, if the shape predicate holds
    fn neckline_at(self, candles: &[Candle], i: usize, config: &PatternConfig) -> Option<f64> {
        match self {
            ChartPattern::DoubleTop => {
                let (first, second) = (candles[i].high, candles[i + 2].high);
                within(first, first, second, config.double_tolerance)
                    .then(|| lowest_low(&candles[i..=i + 2]))
            }
            ChartPattern::DoubleBottom => {
                let (first, second) = (candles[i].low, candles[i + 2].low);
                within(first, first, second, config.double_tolerance)
                    .then(|| highest_high(&candles[i..=i + 2]))
            }
            ChartPattern::HeadAndShoulders => {
                let (left, head, right) =
                    (candles[i - 2].high, candles[i].high, candles[i + 2].high);
                (head > left && head > right && within(head, left, right, config.shoulder_tolerance))
                    .then(|| lowest_low(&candles[i - 2..=i + 2]))
            }
            ChartPattern::InverseHeadAndShoulders => {
                let (left, head, right) = (candles[i - 2].low, candles[i].low, candles[i + 2].low);
                (head < left && head < right && within(head, left, right, config.shoulder_tolerance))
                    .then(|| highest_high(&candles[i - 2..=i + 2]))
            }
        }
    }
}

fn within(reference: f64, a: f64, b: f64, tolerance: f64) -> bool {
    reference > 0.0 && (a - b).abs() / reference < tolerance
}

fn lowest_low(candles: &[Candle]) -> f64 {
    candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min)
}

fn highest_high(candles: &[Candle]) -> f64 {
    candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max)
}

/// Which shape candidate wins when several are present on one series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CandidateOrder {
    /// Scan left to right: the oldest candidate wins
    #[default]
    OldestFirst,
    /// Scan right to left: the most recent candidate wins
    NewestFirst,
}

impl CandidateOrder {
    fn arrange(self, anchors: Range<usize>) -> Vec<usize> {
        match self {
            CandidateOrder::OldestFirst => anchors.collect(),
            CandidateOrder::NewestFirst => anchors.rev().collect(),
        }
    }
}

/// Detector evaluation order. The first detector with a confirmed match
/// decides the verdict; this is an ordering, not a strength ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternPriority(Vec<ChartPattern>);

impl PatternPriority {
    pub fn new(order: Vec<ChartPattern>) -> Self {
        Self(order)
    }

    pub fn iter(&self) -> impl Iterator<Item = ChartPattern> + '_ {
        self.0.iter().copied()
    }
}

impl Default for PatternPriority {
    fn default() -> Self {
        Self(vec![
            ChartPattern::DoubleTop,
            ChartPattern::DoubleBottom,
            ChartPattern::HeadAndShoulders,
            ChartPattern::InverseHeadAndShoulders,
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PatternMatch {
    pub pattern: ChartPattern,
    /// Last close has broken the neckline
    pub confirmed: bool,
    pub neckline: f64,
    /// Index of the first pivot of the shape (the head for head-and-shoulders)
    pub anchor_index: usize,
}

fn candidates<'a>(
    pattern: ChartPattern,
    candles: &'a [Candle],
    config: &'a PatternConfig,
) -> impl Iterator<Item = PatternMatch> + 'a {
    let last_close = candles.last().map(|c| c.close);
    let anchors = config.candidate_order.arrange(pattern.anchors(candles.len()));

    anchors.into_iter().filter_map(move |i| {
        let close = last_close?;
        let neckline = pattern.neckline_at(candles, i, config)?;
        Some(PatternMatch {
            pattern,
            confirmed: pattern.breakout().is_broken(close, neckline),
            neckline,
            anchor_index: i,
        })
    })
}

/// First candidate in scan order whose neckline the last close has broken.
pub fn detect(pattern: ChartPattern, candles: &[Candle], config: &PatternConfig) -> Option<PatternMatch> {
    candidates(pattern, candles, config).find(|m| m.confirmed)
}

/// First shape candidate in scan order, confirmed or not.
pub fn first_candidate(
    pattern: ChartPattern,
    candles: &[Candle],
    config: &PatternConfig,
) -> Option<PatternMatch> {
    candidates(pattern, candles, config).next()
}

/// Per-instrument pattern result across all detectors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternVerdict {
    /// First confirmed match in priority order
    pub confirmed: Option<PatternMatch>,
    /// First unconfirmed shape in priority order, reported while nothing confirms
    pub forming: Option<PatternMatch>,
}

pub fn pattern_verdict(candles: &[Candle], config: &PatternConfig) -> PatternVerdict {
    let mut forming = None;

    for pattern in config.priority.iter() {
        if let Some(found) = detect(pattern, candles, config) {
            return PatternVerdict {
                confirmed: Some(found),
                forming: None,
            };
        }
        if forming.is_none() {
            forming = first_candidate(pattern, candles, config);
        }
    }

    PatternVerdict {
        confirmed: None,
        forming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candle(high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: 0,
            open: close,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    fn series(bars: &[(f64, f64, f64)]) -> Vec<Candle> {
        bars.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Candle {
                timestamp: i as u64 * 3_600_000,
                ..make_candle(high, low, close)
            })
            .collect()
    }

    fn double_top_series(final_close: f64) -> Vec<Candle> {
        series(&[
            (100.0, 95.0, 97.0),
            (90.0, 85.0, 88.0),
            (100.2, 96.0, 98.0),
            (80.0, 75.0, 77.0),
            (70.0, 60.0, final_close),
        ])
    }

    #[test]
    fn pattern_names_parse_back() {
        assert_eq!(
            ChartPattern::parse("inverse_head_and_shoulders"),
            Some(ChartPattern::InverseHeadAndShoulders)
        );
        assert_eq!(
            ChartPattern::parse(" Double_Bottom "),
            Some(ChartPattern::DoubleBottom)
        );
        assert_eq!(ChartPattern::parse("triangle"), None);
    }

    #[test]
    fn double_top_confirms_below_neckline() {
        let config = PatternConfig::default();
        let found = detect(ChartPattern::DoubleTop, &double_top_series(65.0), &config).unwrap();

        assert_eq!(found.pattern.name(), "DOUBLE TOP");
        assert!(found.confirmed);
        assert_eq!(found.neckline, 85.0);
        assert_eq!(found.anchor_index, 0);
    }

    #[test]
    fn double_top_needs_close_below_neckline() {
        let config = PatternConfig::default();
        let candles = double_top_series(86.0);

        assert!(detect(ChartPattern::DoubleTop, &candles, &config).is_none());
        let forming = first_candidate(ChartPattern::DoubleTop, &candles, &config).unwrap();
        assert!(!forming.confirmed);
        assert_eq!(forming.neckline, 85.0);
    }

    #[test]
    fn double_top_respects_tolerance() {
        let mut config = PatternConfig::default();
        config.double_tolerance = 0.001;
        assert!(detect(ChartPattern::DoubleTop, &double_top_series(65.0), &config).is_none());
    }

    #[test]
    fn double_bottom_confirms_above_neckline() {
        let candles = series(&[
            (55.0, 50.0, 52.0),
            (60.0, 54.0, 58.0),
            (56.0, 50.1, 55.0),
            (62.0, 57.0, 61.0),
            (66.0, 60.0, 65.0),
        ]);
        let found = detect(ChartPattern::DoubleBottom, &candles, &PatternConfig::default()).unwrap();
        assert_eq!(found.neckline, 60.0);
        assert!(found.confirmed);
    }

    #[test]
    fn head_and_shoulders_confirms_below_neckline() {
        let candles = series(&[
            (100.0, 95.0, 96.0),
            (98.0, 92.0, 93.0),
            (110.0, 100.0, 105.0),
            (99.0, 90.0, 91.0),
            (101.0, 94.0, 95.0),
            (92.0, 85.0, 86.0),
        ]);
        let config = PatternConfig::default();
        let found = detect(ChartPattern::HeadAndShoulders, &candles, &config).unwrap();
        assert_eq!(found.anchor_index, 2);
        assert_eq!(found.neckline, 90.0);
        assert!(detect(ChartPattern::DoubleTop, &candles, &config).is_none());
    }

    #[test]
    fn head_and_shoulders_rejects_uneven_shoulders() {
        let candles = series(&[
            (90.0, 85.0, 86.0),
            (98.0, 92.0, 93.0),
            (110.0, 100.0, 105.0),
            (99.0, 90.0, 91.0),
            (101.0, 94.0, 95.0),
            (70.0, 60.0, 65.0),
        ]);
        assert!(first_candidate(ChartPattern::HeadAndShoulders, &candles, &PatternConfig::default())
            .is_none());
    }

    #[test]
    fn head_must_rise_strictly_above_shoulders() {
        let candles = series(&[
            (100.0, 95.0, 96.0),
            (98.0, 92.0, 93.0),
            (100.0, 94.0, 95.0),
            (99.0, 90.0, 91.0),
            (99.5, 84.0, 85.0),
        ]);
        assert!(first_candidate(ChartPattern::HeadAndShoulders, &candles, &PatternConfig::default())
            .is_none());
    }

    #[test]
    fn inverse_head_must_sink_strictly_below_shoulders() {
        let candles = series(&[
            (55.0, 50.0, 54.0),
            (60.0, 52.0, 58.0),
            (56.0, 50.0, 55.0),
            (61.0, 53.0, 60.0),
            (72.0, 51.0, 70.0),
        ]);
        assert!(first_candidate(
            ChartPattern::InverseHeadAndShoulders,
            &candles,
            &PatternConfig::default()
        )
        .is_none());
    }

    #[test]
    fn double_bottom_needs_close_above_neckline() {
        let config = PatternConfig::default();
        for close in [60.0, 59.0] {
            let candles = series(&[
                (55.0, 50.0, 52.0),
                (60.0, 54.0, 58.0),
                (56.0, 50.1, 55.0),
                (62.0, 57.0, 61.0),
                (66.0, 58.0, close),
            ]);
            assert!(detect(ChartPattern::DoubleBottom, &candles, &config).is_none(), "close {close}");
            let forming = first_candidate(ChartPattern::DoubleBottom, &candles, &config).unwrap();
            assert!(!forming.confirmed);
            assert_eq!(forming.neckline, 60.0);
        }
    }

    #[test]
    fn inverse_head_and_shoulders_needs_close_above_neckline() {
        let config = PatternConfig::default();
        for close in [61.0, 59.0] {
            let candles = series(&[
                (55.0, 50.0, 54.0),
                (60.0, 52.0, 58.0),
                (50.0, 45.0, 46.0),
                (61.0, 53.0, 60.0),
                (56.0, 51.0, 55.0),
                (62.0, 58.0, close),
            ]);
            assert!(
                detect(ChartPattern::InverseHeadAndShoulders, &candles, &config).is_none(),
                "close {close}"
            );
            let forming =
                first_candidate(ChartPattern::InverseHeadAndShoulders, &candles, &config).unwrap();
            assert_eq!((forming.anchor_index, forming.neckline), (2, 61.0));
        }
    }

    #[test]
    fn inverse_head_and_shoulders_rejects_uneven_shoulders() {
        let candles = series(&[
            (55.0, 50.0, 54.0),
            (60.0, 52.0, 58.0),
            (50.0, 45.0, 46.0),
            (61.0, 53.0, 60.0),
            (56.0, 49.0, 55.0),
            (70.0, 62.0, 68.0),
        ]);
        assert!(first_candidate(
            ChartPattern::InverseHeadAndShoulders,
            &candles,
            &PatternConfig::default()
        )
        .is_none());
    }

    #[test]
    fn inverse_head_and_shoulders_confirms_above_neckline() {
        let candles = series(&[
            (55.0, 50.0, 54.0),
            (60.0, 52.0, 58.0),
            (50.0, 45.0, 46.0),
            (61.0, 53.0, 60.0),
            (56.0, 51.0, 55.0),
            (70.0, 62.0, 68.0),
        ]);
        let found = detect(
            ChartPattern::InverseHeadAndShoulders,
            &candles,
            &PatternConfig::default(),
        )
        .unwrap();
        assert_eq!(found.anchor_index, 2);
        assert_eq!(found.neckline, 61.0);
    }

    #[test]
    fn short_series_never_match() {
        let config = PatternConfig::default();
        let candles = series(&[(100.0, 95.0, 96.0), (100.0, 95.0, 90.0)]);
        for pattern in config.priority.iter() {
            assert!(first_candidate(pattern, &candles, &config).is_none());
        }
        assert_eq!(pattern_verdict(&[], &config), PatternVerdict::default());
    }

    #[test]
    fn non_positive_prices_never_match() {
        let candles = series(&[(0.0, 0.0, 0.0), (0.0, 0.0, 0.0), (0.0, 0.0, -1.0)]);
        assert!(first_candidate(ChartPattern::DoubleTop, &candles, &PatternConfig::default()).is_none());
    }

    fn two_double_tops() -> Vec<Candle> {
        series(&[
            (100.0, 95.0, 96.0),
            (90.0, 85.0, 86.0),
            (100.1, 96.0, 97.0),
            (88.0, 82.0, 83.0),
            (100.0, 80.0, 81.0),
            (70.0, 60.0, 62.0),
        ])
    }

    #[test]
    fn oldest_candidate_wins_by_default() {
        let found = detect(ChartPattern::DoubleTop, &two_double_tops(), &PatternConfig::default()).unwrap();
        assert_eq!(found.anchor_index, 0);
        assert_eq!(found.neckline, 85.0);
    }

    #[test]
    fn newest_first_reports_latest_candidate() {
        let config = PatternConfig {
            candidate_order: CandidateOrder::NewestFirst,
            ..PatternConfig::default()
        };
        let found = detect(ChartPattern::DoubleTop, &two_double_tops(), &config).unwrap();
        assert_eq!(found.anchor_index, 2);
        assert_eq!(found.neckline, 80.0);
    }

    fn double_top_and_head_and_shoulders() -> Vec<Candle> {
        series(&[
            (100.0, 95.0, 96.0),
            (90.0, 85.0, 86.0),
            (100.1, 95.1, 96.0),
            (80.0, 75.0, 76.0),
            (99.0, 94.0, 95.0),
            (70.0, 65.0, 66.0),
            (60.0, 45.0, 50.0),
        ])
    }

    #[test]
    fn double_top_takes_priority_over_head_and_shoulders() {
        let config = PatternConfig::default();
        let candles = double_top_and_head_and_shoulders();

        assert!(detect(ChartPattern::HeadAndShoulders, &candles, &config).is_some());
        let verdict = pattern_verdict(&candles, &config);
        assert_eq!(verdict.confirmed.map(|m| m.pattern), Some(ChartPattern::DoubleTop));
        assert!(verdict.forming.is_none());
    }

    #[test]
    fn priority_order_is_configurable() {
        let config = PatternConfig {
            priority: PatternPriority::new(vec![
                ChartPattern::HeadAndShoulders,
                ChartPattern::DoubleTop,
            ]),
            ..PatternConfig::default()
        };
        let verdict = pattern_verdict(&double_top_and_head_and_shoulders(), &config);
        assert_eq!(
            verdict.confirmed.map(|m| m.pattern),
            Some(ChartPattern::HeadAndShoulders)
        );
    }

    #[test]
    fn verdict_reports_forming_shape_when_nothing_confirms() {
        let verdict = pattern_verdict(&double_top_series(86.0), &PatternConfig::default());
        assert!(verdict.confirmed.is_none());
        assert_eq!(verdict.forming.map(|m| m.pattern), Some(ChartPattern::DoubleTop));
    }
}
