//! Yahoo Finance quote source.
//!
//! Fetches daily OHLCV from Yahoo's v8 chart API. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit breaker.
//! Every failure is folded into a [`FetchOutcome`] before it leaves this module.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{sanitize_rows, DataError, FetchOutcome, QuoteSource};
use crate::config::QuoteConfig;
use crate::domain::PricePoint;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    short_name: Option<String>,
    long_name: Option<String>,
    /// Exchange offset from UTC in seconds (28800 for Taipei).
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

pub struct YahooQuoteSource {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooQuoteSource {
    pub fn new(config: &QuoteConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        let breaker = CircuitBreaker::new(Duration::from_secs(config.breaker_cooldown_secs))
            .with_threshold(config.breaker_threshold);

        Ok(Self {
            client,
            circuit_breaker: Arc::new(breaker),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Point at a different host (mirrors, local fixtures).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive: stop at the start of the day after `end`
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{}/v8/finance/chart/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d",
            self.base_url
        )
    }

    fn meta_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{symbol}?range=5d&interval=1d",
            self.base_url
        )
    }

    /// Extract the single chart payload, mapping Yahoo's error envelope.
    fn unwrap_chart(symbol: &str, resp: ChartResponse) -> Result<ChartData, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))
    }

    /// Convert a chart payload into price points for `symbol`.
    fn parse_points(symbol: &str, data: ChartData) -> Result<Vec<PricePoint>, DataError> {
        // A range with no sessions comes back without timestamps at all
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let offset = data.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);
        let mut points = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let trade_date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays and suspended sessions come back as all-null rows
            let Some(close) = close else {
                continue;
            };

            points.push(PricePoint {
                symbol: symbol.to_string(),
                trade_date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close,
                volume: volume.unwrap_or(0),
            });
        }

        // Intraday updates can repeat the last session; keep the latest
        points.dedup_by(|later, earlier| {
            if later.trade_date == earlier.trade_date {
                *earlier = later.clone();
                true
            } else {
                false
            }
        });

        Ok(points)
    }

    /// GET `url` with retry, backoff and circuit breaker handling.
    fn get_chart(&self, symbol: &str, url: &str) -> Result<ChartResponse, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;
            self.circuit_breaker.record_success();
            return Ok(chart);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    fn fetch_points(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let chart = self.get_chart(symbol, &self.chart_url(symbol, start, end))?;
        let data = Self::unwrap_chart(symbol, chart)?;
        let points = Self::parse_points(symbol, data)?;
        Ok(sanitize_rows(symbol, start, end, points))
    }
}

impl QuoteSource for YahooQuoteSource {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    #[instrument(skip(self), fields(provider = "yahoo_finance"))]
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> FetchOutcome {
        let outcome = FetchOutcome::from_result(self.fetch_points(symbol, start, end));
        if let FetchOutcome::Failed { reason } = &outcome {
            warn!(%reason, "quote fetch failed");
        }
        outcome
    }

    fn resolve_display_name(&self, symbol: &str) -> String {
        let name = self
            .get_chart(symbol, &self.meta_url(symbol))
            .and_then(|chart| Self::unwrap_chart(symbol, chart))
            .ok()
            .and_then(|data| data.meta)
            .and_then(|meta| meta.short_name.or(meta.long_name))
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        match name {
            Some(name) => name,
            None => {
                debug!(symbol, "no display name from provider, using symbol");
                symbol.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSMC_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"shortName": "TAIWAN SEMICONDUCTOR MANUFACTUR", "gmtoffset": 28800},
                "timestamp": [1704157200, 1704243600, 1704330000, 1704330060],
                "indicators": {"quote": [{
                    "open":   [590.0, 584.0, null, 579.0],
                    "high":   [593.0, 585.0, null, 580.0],
                    "low":    [589.0, 578.0, null, 576.0],
                    "close":  [593.0, 578.0, null, 580.0],
                    "volume": [15000000, 28000000, null, 23000000]
                }]}
            }],
            "error": null
        }
    }"#;

    fn parse(json: &str) -> Result<Vec<PricePoint>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let data = YahooQuoteSource::unwrap_chart("2330.TW", resp)?;
        YahooQuoteSource::parse_points("2330.TW", data)
    }

    #[test]
    fn parses_points_in_exchange_local_dates() {
        let points = parse(TSMC_CHART).unwrap();
        // 2024-01-02 01:00 UTC is 09:00 in Taipei; the null row is skipped and
        // the repeated 2024-01-04 session keeps the later values
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].trade_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(points[0].close, 593.0);
        assert_eq!(points[1].volume, 28_000_000);
        assert_eq!(points[2].trade_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(points[2].close, 580.0);
        assert!(points.iter().all(|p| p.symbol == "2330.TW"));
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let json = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn other_errors_map_to_format_changed() {
        let json = r#"{"chart": {"result": null,
            "error": {"code": "Bad Request", "description": "Invalid input"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn range_without_sessions_is_empty() {
        let json = r#"{"chart": {"result": [{"meta": {}, "indicators": {"quote": [{}]}}], "error": null}}"#;
        assert!(parse(json).unwrap().is_empty());
    }

    #[test]
    fn chart_url_spans_whole_end_day() {
        let source = YahooQuoteSource::new(&QuoteConfig::default())
            .unwrap()
            .with_base_url("http://localhost:9/");
        let url = source.chart_url(
            "2330.TW",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        assert_eq!(
            url,
            "http://localhost:9/v8/finance/chart/2330.TW?period1=1704067200&period2=1704240000&interval=1d"
        );
    }
}
