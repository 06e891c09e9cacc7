use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical price data extracted from a provider-native payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuote {
    /// Session-aware price (pre/post market preferred in those sessions).
    pub price: f64,
    /// Provider market state ("REGULAR", "PRE", "POST", ...) if reported.
    pub market_state: Option<String>,
    /// Quote currency as reported by the provider, if any.
    pub currency: Option<String>,
    /// Uppercase symbol for display. The registry key keeps its
    /// canonical request case and is unaffected by this.
    pub display_symbol: String,
}

/// The latest known price data for one symbol.
///
/// Once populated, a snapshot is never cleared by a fetch failure — it is
/// only superseded by a later successful fetch. Staleness is visible
/// through `fetched_at`, never through absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Canonical symbol, the registry key.
    pub symbol: String,
    pub quote: NormalizedQuote,
    /// The provider-shaped payload, kept opaque for downstream display.
    pub raw: Value,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn new(symbol: impl Into<String>, quote: NormalizedQuote, raw: Value) -> Self {
        Self {
            symbol: symbol.into(),
            quote,
            raw,
            fetched_at: Utc::now(),
        }
    }

    /// Age of this snapshot relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.fetched_at
    }
}
