use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::normalize;
use super::retry_after_from;
use super::traits::QuoteProvider;
use crate::errors::WalletError;
use crate::models::history::{HistoricalPoint, HistoricalSeries};
use crate::models::holding::{AssetClass, ProviderKind};
use crate::models::snapshot::PriceSnapshot;

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,\
     image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// Cached Yahoo session token. The crumb is replayed as a query
/// parameter and the cookie string as a `Cookie` header on every
/// subsequent request from this client instance.
#[derive(Debug, Clone)]
struct CrumbData {
    crumb: String,
    cookie: String,
}

/// Yahoo Finance quote/chart client.
///
/// - Unofficial public API: no key, but requests must look browser-like
///   and carry a session "crumb" obtained from a pre-request endpoint.
/// - The crumb is fetched lazily on first use and cached for the
///   lifetime of this client instance.
/// - A 429 surfaces as `RateLimited` with the provider's `Retry-After`;
///   this client never sleeps itself.
pub struct YahooFinanceClient {
    client: Client,
    crumb: Mutex<Option<CrumbData>>,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            crumb: Mutex::new(None),
        }
    }

    fn unavailable(message: impl Into<String>) -> WalletError {
        WalletError::Unavailable {
            provider: "Yahoo Finance".into(),
            message: message.into(),
        }
    }

    fn malformed(message: impl Into<String>) -> WalletError {
        WalletError::Malformed {
            provider: "Yahoo Finance".into(),
            message: message.into(),
        }
    }

    /// Fetch crumb + session cookies, reusing the cached pair when
    /// present. Failure propagates as `Unavailable`.
    async fn ensure_crumb(&self) -> Result<CrumbData, WalletError> {
        let mut guard = self.crumb.lock().await;
        if let Some(data) = guard.as_ref() {
            debug!("Using cached Yahoo Finance crumb");
            return Ok(data.clone());
        }

        let response = self
            .client
            .get(CRUMB_URL)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            error!(status = %response.status(), "Failed to fetch Yahoo Finance crumb");
            return Err(Self::unavailable(format!(
                "crumb endpoint returned {}",
                response.status()
            )));
        }

        // The session cookies arrive alongside the crumb; keep the
        // name=value pairs and replay them verbatim.
        let cookie = response
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .collect::<Vec<_>>()
            .join("; ");

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() {
            return Err(Self::unavailable("crumb endpoint returned an empty token"));
        }

        debug!("Fetched Yahoo Finance crumb");
        let data = CrumbData { crumb, cookie };
        *guard = Some(data.clone());
        Ok(data)
    }

    async fn get_json(&self, url: &str, crumb: &CrumbData) -> Result<Value, WalletError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::COOKIE, &crumb.cookie)
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after_from(response.headers());
                Err(WalletError::RateLimited { retry_after })
            }
            StatusCode::OK => response
                .json::<Value>()
                .await
                .map_err(|e| Self::malformed(format!("invalid JSON body: {e}"))),
            status => Err(Self::unavailable(format!("request returned {status}"))),
        }
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceClient {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::YahooFinance
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Stock]
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<PriceSnapshot, WalletError> {
        let crumb = self.ensure_crumb().await?;
        let url = format!("{QUOTE_URL}?symbols={symbol}&crumb={}", crumb.crumb);

        let raw = self.get_json(&url, &crumb).await?;
        let quote = normalize::equity_quote(&raw)?;
        debug!(%symbol, price = quote.price, "Fetched stock quote");
        Ok(PriceSnapshot::new(symbol, quote, raw))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<HistoricalSeries, WalletError> {
        let crumb = self.ensure_crumb().await?;
        let url = format!("{CHART_URL}/{symbol}?interval={interval}");

        let raw = self.get_json(&url, &crumb).await?;
        let result = raw
            .pointer("/chart/result/0")
            .ok_or_else(|| Self::malformed("missing chart.result[0]"))?;

        let timestamps: Vec<i64> = result
            .get("timestamp")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let closes = result
            .pointer("/indicators/quote/0/close")
            .and_then(Value::as_array)
            .ok_or_else(|| Self::malformed("missing indicators.quote[0].close"))?;

        // Nulls appear in the close series on holidays; skip those slots.
        let points: Vec<HistoricalPoint> = timestamps
            .iter()
            .zip(closes.iter())
            .filter_map(|(ts, close)| {
                let price = close.as_f64()?;
                let timestamp = chrono::DateTime::from_timestamp(*ts, 0)?;
                Some(HistoricalPoint { timestamp, price })
            })
            .collect();

        debug!(%symbol, %interval, points = points.len(), "Fetched stock history");
        Ok(HistoricalSeries::new(symbol, interval, points))
    }
}
