use serde::Serialize;
use utoipa::ToSchema;

use crate::business_logic::swing::{swing_points, SwingKind, SwingPoint};
use crate::models::candle::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Trend {
    Up,
    Down,
}

/// A swing point that contradicted the prevailing trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ChochEvent {
    pub index: usize,
    /// Open time of the triggering candle (epoch ms)
    pub timestamp: u64,
    /// Swing price that broke character
    pub price: f64,
    /// Trend direction after the change
    pub direction: Trend,
}

/// BOS/ChoCh state for a single run over one series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureState {
    pub last_trend: Option<Trend>,
    pub bos_count: u32,
    pub choch_occurred: bool,
}

impl StructureState {
    /// Applies one swing point. Returns the ChoCh it triggered, if any.
    pub fn apply(&mut self, swing: &SwingPoint) -> Option<ChochEvent> {
        let (contradicted, next) = match swing.kind {
            SwingKind::High => (Trend::Up, Trend::Down),
            SwingKind::Low => (Trend::Down, Trend::Up),
        };

        let choch = if self.last_trend == Some(contradicted) {
            self.bos_count = 0;
            self.choch_occurred = true;
            Some(ChochEvent {
                index: swing.index,
                timestamp: swing.timestamp,
                price: swing.price,
                direction: next,
            })
        } else {
            None
        };

        self.last_trend = Some(next);
        self.bos_count += 1;
        choch
    }
}

/// Final snapshot of a structure run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureReport {
    pub bos_count: u32,
    pub choch_occurred: bool,
    pub last_trend: Option<Trend>,
    pub swing_count: usize,
    pub choch_events: Vec<ChochEvent>,
}

impl StructureReport {
    /// True when the series produced no swing points at all
    pub fn is_neutral(&self) -> bool {
        self.swing_count == 0
    }
}

/// Folds an ordered swing sequence into a report. State starts fresh on
/// every call.
pub fn track<I>(swings: I) -> StructureReport
where
    I: IntoIterator<Item = SwingPoint>,
{
    let (state, swing_count, choch_events) = swings.into_iter().fold(
        (StructureState::default(), 0usize, Vec::new()),
        |(mut state, count, mut events), swing| {
            if let Some(event) = state.apply(&swing) {
                events.push(event);
            }
            (state, count + 1, events)
        },
    );

    StructureReport {
        bos_count: state.bos_count,
        choch_occurred: state.choch_occurred,
        last_trend: state.last_trend,
        swing_count,
        choch_events,
    }
}

pub fn analyze_structure(candles: &[Candle], swing_width: usize) -> StructureReport {
    track(swing_points(candles, swing_width))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swing(index: usize, kind: SwingKind) -> SwingPoint {
        SwingPoint {
            index,
            timestamp: 1_000 + index as u64,
            price: 100.0,
            kind,
        }
    }

    fn make_candle(idx: usize, high: f64, low: f64) -> Candle {
        Candle {
            timestamp: idx as u64 * 3_600_000,
            open: low,
            high,
            low,
            close: high,
            volume: 0.0,
        }
    }

    #[test]
    fn empty_and_short_series_are_neutral() {
        let report = analyze_structure(&[], 1);
        assert_eq!(report, StructureReport::default());

        let candles: Vec<Candle> = (0..4)
            .map(|i| make_candle(i, if i == 1 { 20.0 } else { 10.0 }, 5.0))
            .collect();
        let report = analyze_structure(&candles, 1);
        assert_eq!(report.bos_count, 0);
        assert!(!report.choch_occurred);
        assert!(report.choch_events.is_empty());
        assert!(report.is_neutral());
    }

    #[test]
    fn consecutive_highs_accumulate_without_choch() {
        let report = track(vec![
            swing(1, SwingKind::High),
            swing(3, SwingKind::High),
            swing(5, SwingKind::High),
        ]);
        assert_eq!(report.bos_count, 3);
        assert!(!report.choch_occurred);
        assert_eq!(report.last_trend, Some(Trend::Down));
    }

    #[test]
    fn count_is_one_on_the_choch_step() {
        let mut state = StructureState::default();
        assert!(state.apply(&swing(1, SwingKind::Low)).is_none());
        assert!(state.apply(&swing(2, SwingKind::Low)).is_none());
        assert_eq!(state.bos_count, 2);

        let event = state.apply(&swing(3, SwingKind::High)).unwrap();
        assert_eq!(state.bos_count, 1);
        assert!(state.choch_occurred);
        assert_eq!(event.index, 3);
        assert_eq!(event.timestamp, 1_003);
        assert_eq!(event.direction, Trend::Down);
    }

    #[test]
    fn alternating_swings_flag_choch_from_second_point() {
        let kinds = [
            SwingKind::High,
            SwingKind::Low,
            SwingKind::High,
            SwingKind::Low,
            SwingKind::High,
        ];
        let mut state = StructureState::default();
        let mut events = Vec::new();

        for (step, kind) in kinds.iter().enumerate() {
            if let Some(event) = state.apply(&swing(step, *kind)) {
                events.push(event);
            }
            assert_eq!(state.choch_occurred, step >= 1, "step {step}");
            assert_eq!(events.len(), step, "step {step}");
            assert_eq!(state.bos_count, 1);
        }

        let report = track(kinds.iter().enumerate().map(|(i, k)| swing(i, *k)));
        assert_eq!(report.choch_events, events);
        assert!(report
            .choch_events
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp));
    }

    #[test]
    fn runs_do_not_share_state() {
        let first = track(vec![swing(1, SwingKind::High), swing(2, SwingKind::Low)]);
        let second = track(vec![swing(1, SwingKind::High)]);
        assert!(first.choch_occurred);
        assert!(!second.choch_occurred);
        assert_eq!(second.bos_count, 1);
    }

    #[test]
    fn analyze_structure_reads_candles() {
        // high at 1, low at 2, high at 3
        let candles = vec![
            make_candle(0, 10.0, 9.0),
            make_candle(1, 12.0, 10.0),
            make_candle(2, 11.0, 8.0),
            make_candle(3, 13.0, 10.0),
            make_candle(4, 12.0, 11.0),
        ];
        let report = analyze_structure(&candles, 1);
        assert_eq!(report.swing_count, 3);
        assert_eq!(report.bos_count, 1);
        assert!(report.choch_occurred);
        assert_eq!(report.choch_events.len(), 2);
        assert_eq!(report.choch_events[0].timestamp, 2 * 3_600_000);
        assert_eq!(report.last_trend, Some(Trend::Down));
    }
}
