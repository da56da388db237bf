use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::business_logic::config::{PatternConfig, ScannerConfig, SignalConfig};
use crate::business_logic::patterns::{CandidateOrder, ChartPattern, PatternPriority};

pub const BYBIT_API_URL: &str = "https://api.bybit.com";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Process configuration read once in `main` from environment variables and
/// handed to each component at construction.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub exchange: ExchangeSettings,
    pub telegram: Option<TelegramSettings>,
    pub scan: ScanSettings,
    pub scanner: ScannerConfig,
    /// Seconds between cycles; zero runs a single cycle and exits
    pub scan_interval_secs: u64,
    pub bind_addr: String,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub base_url: String,
    /// Bybit market category (spot, linear, inverse)
    pub category: String,
    /// Only symbols quoted in this asset are scanned
    pub quote_asset: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub base_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub timeout: Duration,
}

// The bot token must never reach the logs.
impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("base_url", &self.base_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Minimum 24h turnover in quote currency
    pub min_turnover: f64,
    /// Instruments analysed concurrently
    pub concurrency: usize,
    /// Send a liveness message after every cycle
    pub heartbeat: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            min_turnover: 20_000_000.0,
            concurrency: 4,
            heartbeat: true,
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_str(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

/// Parses into the target type directly; out-of-range values keep the default
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    parse_or(env_opt(name), default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env_opt(name)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    env_opt(name)
        .map(|s| parse_bool(&s))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn parse_candidate_order(value: &str) -> Option<CandidateOrder> {
    match value.to_lowercase().as_str() {
        "oldest" | "oldest_first" => Some(CandidateOrder::OldestFirst),
        "newest" | "newest_first" => Some(CandidateOrder::NewestFirst),
        _ => None,
    }
}

/// Comma separated detector names; unknown or empty lists are rejected
fn parse_priority(value: &str) -> Option<PatternPriority> {
    let order = value
        .split(',')
        .map(ChartPattern::parse)
        .collect::<Option<Vec<ChartPattern>>>()?;
    (!order.is_empty()).then(|| PatternPriority::new(order))
}

impl AppConfig {
    pub fn from_env() -> Self {
        let timeout = Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 10u64).max(1));
        let defaults = ScannerConfig::default();
        let pattern_defaults = PatternConfig::default();
        let signal_defaults = SignalConfig::default();
        let scan_defaults = ScanSettings::default();

        let telegram = match (env_opt("TELEGRAM_BOT_TOKEN"), env_opt("CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramSettings {
                base_url: env_str("TELEGRAM_API_URL", TELEGRAM_API_URL),
                bot_token,
                chat_id,
                timeout,
            }),
            _ => None,
        };

        Self {
            exchange: ExchangeSettings {
                base_url: env_str("BYBIT_BASE_URL", BYBIT_API_URL),
                category: env_str("BYBIT_CATEGORY", "spot"),
                quote_asset: env_str("QUOTE_ASSET", "USDT"),
                timeout,
            },
            telegram,
            scan: ScanSettings {
                min_turnover: env_f64("MIN_TURNOVER", scan_defaults.min_turnover),
                concurrency: env_parse("SCAN_CONCURRENCY", scan_defaults.concurrency).max(1),
                heartbeat: env_bool("HEARTBEAT", scan_defaults.heartbeat),
            },
            scanner: ScannerConfig {
                candle_limit: env_parse("CANDLE_LIMIT", defaults.candle_limit).clamp(1, 1000),
                swing_width: env_parse("SWING_WIDTH", defaults.swing_width).max(1),
                patterns: PatternConfig {
                    double_tolerance: env_f64("DOUBLE_TOLERANCE", pattern_defaults.double_tolerance),
                    shoulder_tolerance: env_f64(
                        "SHOULDER_TOLERANCE",
                        pattern_defaults.shoulder_tolerance,
                    ),
                    candidate_order: env_opt("CANDIDATE_ORDER")
                        .and_then(|s| parse_candidate_order(&s))
                        .unwrap_or(pattern_defaults.candidate_order),
                    priority: env_opt("PATTERN_PRIORITY")
                        .and_then(|s| parse_priority(&s))
                        .unwrap_or(pattern_defaults.priority),
                },
                signals: SignalConfig {
                    trend_max_bos: env_parse("TREND_MAX_BOS", signal_defaults.trend_max_bos),
                    reversal_bos_threshold: env_parse(
                        "REVERSAL_BOS_THRESHOLD",
                        signal_defaults.reversal_bos_threshold,
                    ),
                },
            },
            scan_interval_secs: env_parse("SCAN_INTERVAL_SECS", 0u64),
            bind_addr: env_str("BIND_ADDR", "0.0.0.0:3000"),
            log_dir: env_opt("LOG_DIR").map(PathBuf::from),
        }
    }
}
