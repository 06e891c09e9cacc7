use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::normalize;
use super::retry_after_from;
use super::traits::QuoteProvider;
use crate::errors::WalletError;
use crate::models::history::{HistoricalPoint, HistoricalSeries};
use crate::models::holding::{AssetClass, ProviderKind};
use crate::models::snapshot::PriceSnapshot;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API client for cryptocurrency prices.
///
/// - **Free**: no API key required on the public tier, but aggressively
///   rate limited — 429s are expected and surface as `RateLimited`.
/// - CoinGecko keys coins by lowercase id ("bitcoin", "ethereum"); the
///   registry's canonical crypto symbols already use that form.
pub struct CoinGeckoClient {
    client: Client,
    /// vs-currency for quotes and charts, lowercase ("usd", "eur").
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new(vs_currency: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            vs_currency: vs_currency.into().to_lowercase(),
        }
    }

    fn unavailable(message: impl Into<String>) -> WalletError {
        WalletError::Unavailable {
            provider: "CoinGecko".into(),
            message: message.into(),
        }
    }

    fn malformed(message: impl Into<String>) -> WalletError {
        WalletError::Malformed {
            provider: "CoinGecko".into(),
            message: message.into(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, WalletError> {
        let response = self.client.get(url).send().await?;

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

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new("usd")
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoClient {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::CoinGecko
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Crypto]
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<PriceSnapshot, WalletError> {
        let id = symbol.to_lowercase();
        let url = format!(
            "{BASE_URL}/coins/markets?vs_currency={}&ids={id}",
            self.vs_currency
        );

        let raw = self.get_json(&url).await?;
        let quote = normalize::crypto_quote(&raw, &self.vs_currency)?;
        debug!(%symbol, price = quote.price, "Fetched crypto quote");
        Ok(PriceSnapshot::new(symbol, quote, raw))
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<HistoricalSeries, WalletError> {
        let id = symbol.to_lowercase();
        let url = format!(
            "{BASE_URL}/coins/{id}/market_chart?vs_currency={}&days={interval}",
            self.vs_currency
        );

        let raw = self.get_json(&url).await?;
        let prices = raw
            .get("prices")
            .and_then(Value::as_array)
            .ok_or_else(|| Self::malformed("missing prices array"))?;

        // Each entry is [unix_millis, price].
        let points: Vec<HistoricalPoint> = prices
            .iter()
            .filter_map(|pair| {
                let ts = pair.get(0)?.as_i64()?;
                let price = pair.get(1)?.as_f64()?;
                let timestamp = chrono::DateTime::from_timestamp_millis(ts)?;
                Some(HistoricalPoint { timestamp, price })
            })
            .collect();

        debug!(%symbol, %interval, points = points.len(), "Fetched crypto history");
        Ok(HistoricalSeries::new(id, interval, points))
    }
}
