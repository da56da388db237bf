use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::business_logic::config::ScannerConfig;
use crate::business_logic::signals::{analyze, Analysis, TimeframeSeries};
use crate::business_logic::structure::StructureReport;
use crate::config::ScanSettings;
use crate::errors::AnalysisError;
use crate::models::alert::AlertMessage;
use crate::models::scan::{InstrumentState, InstrumentStatus, ScanSnapshot, StructureSummary};
use crate::models::timeframe::Timeframe;
use crate::services::exchange::{CandleSource, InstrumentSource, Notifier};
use crate::services::scan_state::SharedScanState;

const HEARTBEAT_TEXT: &str = "✅ Bot scan completed and is alive.";

/// What happened to one instrument in one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Signals(Analysis),
    NoSignal(Analysis),
    Failed(AnalysisError),
}

impl ScanOutcome {
    fn from_analysis(analysis: Analysis) -> Self {
        if analysis.alerts.is_empty() {
            ScanOutcome::NoSignal(analysis)
        } else {
            ScanOutcome::Signals(analysis)
        }
    }

    pub fn alerts(&self) -> &[AlertMessage] {
        match self {
            ScanOutcome::Signals(analysis) => &analysis.alerts,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentReport {
    pub symbol: String,
    pub outcome: ScanOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub instruments: usize,
    pub alerts: usize,
    pub failures: usize,
    pub listing_failed: bool,
}

/// Fetches the three timeframes concurrently and runs the analysis core.
pub async fn scan_instrument<C: CandleSource>(
    source: &C,
    symbol: &str,
    config: &ScannerConfig,
) -> InstrumentReport {
    let limit = config.candle_limit;
    let fetched = tokio::join!(
        source.fetch_candles(symbol, Timeframe::Daily, limit),
        source.fetch_candles(symbol, Timeframe::Hour, limit),
        source.fetch_candles(symbol, Timeframe::FiveMinute, limit),
    );

    let outcome = match fetched {
        (Ok(daily), Ok(hourly), Ok(five_minute)) => {
            let series = TimeframeSeries {
                daily: &daily,
                hourly: &hourly,
                five_minute: &five_minute,
            };
            ScanOutcome::from_analysis(analyze(symbol, &series, config))
        }
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => ScanOutcome::Failed(e),
    };

    InstrumentReport {
        symbol: symbol.to_string(),
        outcome,
    }
}

/// Runs scan cycles over every instrument above the turnover floor
pub struct ScanService<C, I, N> {
    candles: Arc<C>,
    instruments: I,
    notifier: N,
    scanner: Arc<ScannerConfig>,
    settings: ScanSettings,
    shared_state: SharedScanState,
    cycles: AtomicU64,
}

impl<C, I, N> ScanService<C, I, N>
where
    C: CandleSource + 'static,
    I: InstrumentSource,
    N: Notifier,
{
    pub fn new(
        candles: Arc<C>,
        instruments: I,
        notifier: N,
        scanner: ScannerConfig,
        settings: ScanSettings,
        shared_state: SharedScanState,
    ) -> Self {
        Self {
            candles,
            instruments,
            notifier,
            scanner: Arc::new(scanner),
            settings,
            shared_state,
            cycles: AtomicU64::new(0),
        }
    }

    /// Start the scan loop
    pub async fn run(&self, every: Duration) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One full pass: select, analyse, notify, heartbeat, publish.
    pub async fn run_cycle(&self) -> CycleSummary {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!("Scan cycle {} started", cycle);

        let (symbols, listing_error) = match self
            .instruments
            .list_symbols_above_turnover(self.settings.min_turnover)
            .await
        {
            Ok(symbols) => (symbols, None),
            Err(e) => {
                tracing::error!("Error filtering instruments: {:#}", e);
                (Vec::new(), Some(format!("{e:#}")))
            }
        };

        let reports = self.scan_all(symbols).await;
        let mut summary = CycleSummary {
            cycle,
            instruments: reports.len(),
            listing_failed: listing_error.is_some(),
            ..CycleSummary::default()
        };

        for report in &reports {
            match &report.outcome {
                ScanOutcome::Failed(e) => {
                    summary.failures += 1;
                    tracing::error!("Error analyzing {}: {}", report.symbol, e);
                }
                ScanOutcome::NoSignal(_) => {
                    tracing::debug!("{}: no signal", report.symbol);
                }
                ScanOutcome::Signals(_) => {}
            }

            for alert in report.outcome.alerts() {
                Self::log_alert(alert);
                self.notifier.notify(&alert.body).await;
                summary.alerts += 1;
            }
        }

        if self.settings.heartbeat {
            self.notifier.notify(&heartbeat_message(&summary)).await;
        }

        self.update_shared_state(cycle, &reports, listing_error).await;

        tracing::info!(
            "Scan cycle {} finished: {} instruments, {} alerts, {} failures",
            cycle,
            summary.instruments,
            summary.alerts,
            summary.failures
        );
        summary
    }

    async fn scan_all(&self, symbols: Vec<String>) -> Vec<InstrumentReport> {
        let permits = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for symbol in symbols {
            let source = Arc::clone(&self.candles);
            let config = Arc::clone(&self.scanner);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                scan_instrument(source.as_ref(), &symbol, &config).await
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("Instrument task aborted: {}", e),
            }
        }

        // Sort by symbol for consistent ordering
        reports.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        reports
    }

    async fn update_shared_state(
        &self,
        cycle: u64,
        reports: &[InstrumentReport],
        listing_error: Option<String>,
    ) {
        let snapshot = ScanSnapshot {
            as_of_ms: chrono::Utc::now().timestamp_millis() as u64,
            cycle,
            instruments: reports.iter().map(instrument_status).collect(),
            listing_error,
        };

        let mut state = self.shared_state.snapshot.write().await;
        *state = snapshot.clone();
        let _ = self.shared_state.broadcaster.send(snapshot);
    }

    fn log_alert(alert: &AlertMessage) {
        tracing::warn!(
            "{} on {}: {}",
            alert.category,
            alert.symbol,
            alert.body.replace('\n', " | ")
        );
    }
}

fn heartbeat_message(summary: &CycleSummary) -> String {
    let mut text = format!(
        "{HEARTBEAT_TEXT}\nInstruments: {}, alerts: {}, failures: {}",
        summary.instruments, summary.alerts, summary.failures
    );
    if summary.listing_failed {
        text.push_str("\nInstrument listing failed this cycle.");
    }
    text
}

fn structure_summary(report: &StructureReport) -> StructureSummary {
    StructureSummary {
        bos_count: report.bos_count,
        choch_occurred: report.choch_occurred,
        last_trend: report.last_trend,
        swing_count: report.swing_count,
        choch_count: report.choch_events.len(),
        last_choch: report.choch_events.last().copied(),
    }
}

fn instrument_status(report: &InstrumentReport) -> InstrumentStatus {
    let symbol = report.symbol.clone();

    match &report.outcome {
        ScanOutcome::Failed(e) => InstrumentStatus {
            summary: format!("{symbol}: analysis failed ({e})."),
            symbol,
            state: InstrumentState::Failed,
            daily: None,
            hourly: None,
            five_minute: None,
            pattern: None,
            alerts: Vec::new(),
            error: Some(e.to_string()),
        },
        ScanOutcome::Signals(analysis) | ScanOutcome::NoSignal(analysis) => {
            let state = if analysis.alerts.is_empty() {
                InstrumentState::NoSignal
            } else {
                InstrumentState::Signals
            };
            InstrumentStatus {
                summary: build_summary(&symbol, analysis),
                symbol,
                state,
                daily: Some(structure_summary(&analysis.daily)),
                hourly: Some(structure_summary(&analysis.hourly)),
                five_minute: Some(structure_summary(&analysis.five_minute)),
                pattern: analysis.pattern.confirmed.or(analysis.pattern.forming),
                alerts: analysis.alerts.clone(),
                error: None,
            }
        }
    }
}

fn build_summary(symbol: &str, analysis: &Analysis) -> String {
    let pattern = match (&analysis.pattern.confirmed, &analysis.pattern.forming) {
        (Some(found), _) => format!(
            "{} confirmed, neckline {}",
            found.pattern.name(),
            format_price(found.neckline)
        ),
        (None, Some(forming)) => format!(
            "{} forming, neckline {}",
            forming.pattern.name(),
            format_price(forming.neckline)
        ),
        (None, None) => "no chart pattern".to_string(),
    };

    if analysis.hourly.is_neutral() {
        return format!("{symbol}: not enough 1h history for structure; {pattern}.");
    }

    format!(
        "{symbol}: BOS(1H)={}, BOS(5m)={}, daily ChoCh {}; {}; {} alert(s).",
        analysis.hourly.bos_count,
        analysis.five_minute.bos_count,
        if analysis.daily.choch_occurred { "yes" } else { "no" },
        pattern,
        analysis.alerts.len()
    )
}

fn format_price(price: f64) -> String {
    format!("{:.4}", price)
}
