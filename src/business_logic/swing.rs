use crate::models::candle::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingKind {
    High,
    Low,
}

/// Per-candle swing classification. An outside bar can satisfy both
/// predicates at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwingMark {
    pub high: bool,
    pub low: bool,
}

impl SwingMark {
    /// Swing high takes precedence when both predicates fire.
    pub fn kind(self) -> Option<SwingKind> {
        if self.high {
            Some(SwingKind::High)
        } else if self.low {
            Some(SwingKind::Low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: u64,
    pub price: f64,
    pub kind: SwingKind,
}

/// Shortest series that can produce a swing point for the given width.
pub fn min_series_len(width: usize) -> usize {
    (2 * width + 1).max(5)
}

fn eligible(candles: &[Candle], width: usize) -> std::ops::Range<usize> {
    if width == 0 || candles.len() < min_series_len(width) {
        return 0..0;
    }
    width..candles.len() - width
}

fn classify(candles: &[Candle], idx: usize, width: usize) -> SwingMark {
    let candle = &candles[idx];
    let mut neighbours = (idx - width..=idx + width).filter(|&j| j != idx);
    let high = neighbours.clone().all(|j| candle.high > candles[j].high);
    let low = neighbours.all(|j| candle.low < candles[j].low);
    SwingMark { high, low }
}

/// Marks every index of the series. Indices within `width` of either end
/// stay unmarked.
pub fn mark_swings(candles: &[Candle], width: usize) -> Vec<SwingMark> {
    let mut marks = vec![SwingMark::default(); candles.len()];
    for idx in eligible(candles, width) {
        marks[idx] = classify(candles, idx, width);
    }
    marks
}

/// Yields swing points in chronological order, one per candle at most.
pub fn swing_points(candles: &[Candle], width: usize) -> impl Iterator<Item = SwingPoint> + '_ {
    mark_swings(candles, width)
        .into_iter()
        .enumerate()
        .filter_map(move |(idx, mark)| {
            let kind = mark.kind()?;
            let candle = &candles[idx];
            let price = match kind {
                SwingKind::High => candle.high,
                SwingKind::Low => candle.low,
            };
            Some(SwingPoint {
                index: idx,
                timestamp: candle.timestamp,
                price,
                kind,
            })
        })
}
