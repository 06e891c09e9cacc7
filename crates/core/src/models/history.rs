use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point of a historical time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Historical prices for one symbol/interval pair.
///
/// Fetched lazily on demand, never as part of the periodic refresh, and
/// cached in memory only for the calling session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub symbol: String,
    /// Provider-native interval token ("1d", "5d", "1wk", "1mo", ...).
    pub interval: String,
    /// Points sorted by timestamp, as returned by the provider.
    pub points: Vec<HistoricalPoint>,
    pub fetched_at: DateTime<Utc>,
}

impl HistoricalSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        points: Vec<HistoricalPoint>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            points,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
