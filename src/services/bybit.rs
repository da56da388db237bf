use anyhow::Context;
use serde::Deserialize;

use crate::config::ExchangeSettings;
use crate::errors::AnalysisError;
use crate::models::candle::{validate_series, Candle};
use crate::models::timeframe::Timeframe;
use crate::services::exchange::{CandleSource, InstrumentSource};

#[derive(Debug, Deserialize)]
struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    #[serde(default)]
    result: T,
}

impl<T> BybitResponse<T> {
    fn into_result(self) -> Result<T, String> {
        if self.ret_code == 0 {
            Ok(self.result)
        } else {
            Err(format!("bybit retCode {}: {}", self.ret_code, self.ret_msg))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct KlineResult {
    /// [startTime, open, high, low, close, volume, turnover], newest first
    #[serde(default)]
    list: Vec<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct TickerResult {
    #[serde(default)]
    list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    symbol: String,
    #[serde(rename = "turnover24h", default)]
    turnover_24h: String,
}

/// Bybit v5 public market data client
#[derive(Clone)]
pub struct BybitClient {
    client: reqwest::Client,
    base_url: String,
    category: String,
    quote_asset: String,
}

impl BybitClient {
    pub fn new(settings: &ExchangeSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build bybit http client")?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            category: settings.category.clone(),
            quote_asset: settings.quote_asset.clone(),
        })
    }

    async fn get_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<BybitResponse<KlineResult>, reqwest::Error> {
        let limit = limit.to_string();
        self.client
            .get(format!("{}/v5/market/kline", self.base_url))
            .query(&[
                ("category", self.category.as_str()),
                ("symbol", symbol),
                ("interval", timeframe.bybit_interval()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<BybitResponse<KlineResult>>()
            .await
    }
}

impl CandleSource for BybitClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, AnalysisError> {
        let fetch_error = |reason: String| AnalysisError::Fetch { timeframe, reason };
        let malformed = |reason: String| AnalysisError::MalformedSeries { timeframe, reason };

        let response = self
            .get_klines(symbol, timeframe, limit)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        let result = response.into_result().map_err(fetch_error)?;

        let candles = parse_kline_rows(&result.list).map_err(malformed)?;
        validate_series(&candles).map_err(malformed)?;

        tracing::debug!("Fetched {} {} candles for {}", candles.len(), timeframe, symbol);
        Ok(candles)
    }
}

impl InstrumentSource for BybitClient {
    async fn list_symbols_above_turnover(&self, min_turnover: f64) -> anyhow::Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/v5/market/tickers", self.base_url))
            .query(&[("category", self.category.as_str())])
            .send()
            .await
            .context("ticker request failed")?
            .error_for_status()
            .context("ticker request rejected")?
            .json::<BybitResponse<TickerResult>>()
            .await
            .context("failed to decode tickers")?;

        let tickers = response.into_result().map_err(anyhow::Error::msg)?;
        let symbols = select_symbols(&tickers.list, &self.quote_asset, min_turnover);

        tracing::info!(
            "{} of {} {} symbols above turnover {}",
            symbols.len(),
            tickers.list.len(),
            self.quote_asset,
            min_turnover
        );
        Ok(symbols)
    }
}

fn parse_field(row: &[String], idx: usize, name: &str) -> Result<f64, String> {
    row.get(idx)
        .ok_or_else(|| format!("kline row missing {name}"))?
        .parse::<f64>()
        .map_err(|e| format!("invalid {name}: {e}"))
}

/// Converts Bybit kline rows (newest first, string fields) into a
/// chronological candle series.
fn parse_kline_rows(rows: &[Vec<String>]) -> Result<Vec<Candle>, String> {
    let mut candles = rows
        .iter()
        .map(|row| {
            let timestamp = row
                .first()
                .ok_or_else(|| "empty kline row".to_string())?
                .parse::<u64>()
                .map_err(|e| format!("invalid start time: {e}"))?;

            Ok(Candle {
                timestamp,
                open: parse_field(row, 1, "open")?,
                high: parse_field(row, 2, "high")?,
                low: parse_field(row, 3, "low")?,
                close: parse_field(row, 4, "close")?,
                volume: parse_field(row, 5, "volume")?,
            })
        })
        .collect::<Result<Vec<Candle>, String>>()?;

    candles.reverse();
    Ok(candles)
}

fn select_symbols(tickers: &[Ticker], quote_asset: &str, min_turnover: f64) -> Vec<String> {
    let mut symbols: Vec<String> = tickers
        .iter()
        .filter(|t| t.symbol.ends_with(quote_asset) && t.symbol.len() > quote_asset.len())
        .filter(|t| {
            t.turnover_24h
                .parse::<f64>()
                .map(|turnover| turnover >= min_turnover)
                .unwrap_or(false)
        })
        .map(|t| t.symbol.clone())
        .collect();
    symbols.sort();
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parse_kline_rows_reverses_to_chronological() {
        let rows = vec![
            row(&["1700000060000", "2", "3", "1.5", "2.5", "10", "25"]),
            row(&["1700000000000", "1", "2", "0.5", "1.5", "20", "30"]),
        ];
        let candles = parse_kline_rows(&rows).unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, 1_700_000_000_000);
        assert_eq!(candles[1].close, 2.5);
        assert!(validate_series(&candles).is_ok());
    }

    #[test]
    fn parse_kline_rows_rejects_bad_numbers() {
        let rows = vec![row(&["1700000000000", "1", "x", "0.5", "1.5", "20"])];
        let error = parse_kline_rows(&rows).unwrap_err();
        assert!(error.contains("high"), "{error}");

        let short = vec![row(&["1700000000000", "1"])];
        assert!(parse_kline_rows(&short).is_err());
    }

    #[test]
    fn decodes_kline_response() {
        let json = r#"{
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "spot",
                "symbol": "BTCUSDT",
                "list": [["1700000000000", "1", "2", "0.5", "1.5", "20", "30"]]
            }
        }"#;
        let response: BybitResponse<KlineResult> = serde_json::from_str(json).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.list.len(), 1);
    }

    #[test]
    fn error_response_surfaces_ret_msg() {
        let json = r#"{"retCode": 10001, "retMsg": "Not supported symbols", "result": {}}"#;
        let response: BybitResponse<KlineResult> = serde_json::from_str(json).unwrap();
        let error = response.into_result().unwrap_err();
        assert!(error.contains("Not supported symbols"));
    }

    #[test]
    fn select_symbols_filters_quote_and_turnover() {
        let tickers = vec![
            Ticker {
                symbol: "SOLUSDT".to_string(),
                turnover_24h: "25000000".to_string(),
            },
            Ticker {
                symbol: "BTCUSDT".to_string(),
                turnover_24h: "900000000.5".to_string(),
            },
            Ticker {
                symbol: "DOGEUSDT".to_string(),
                turnover_24h: "19999999".to_string(),
            },
            Ticker {
                symbol: "ETHBTC".to_string(),
                turnover_24h: "50000000".to_string(),
            },
            Ticker {
                symbol: "USDT".to_string(),
                turnover_24h: "50000000".to_string(),
            },
            Ticker {
                symbol: "XRPUSDT".to_string(),
                turnover_24h: String::new(),
            },
        ];

        assert_eq!(
            select_symbols(&tickers, "USDT", 20_000_000.0),
            vec!["BTCUSDT".to_string(), "SOLUSDT".to_string()]
        );
    }
}
