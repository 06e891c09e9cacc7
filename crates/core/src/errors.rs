use std::time::Duration;

use thiserror::Error;

/// Unified error type for the entire trading-wallet-core library.
/// Every public fallible function returns `Result<T, WalletError>`.
#[derive(Debug, Error)]
pub enum WalletError {
    // ── Provider / Network ──────────────────────────────────────────
    /// The provider answered with a 429. `retry_after` is the wait the
    /// provider asked for (its `Retry-After` header, or the 60s default).
    /// The coordinator decides whether to wait or defer — clients never
    /// sleep on this themselves.
    #[error("Rate limited — retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Provider unavailable ({provider}): {message}")]
    Unavailable { provider: String, message: String },

    #[error("Malformed response ({provider}): {message}")]
    Malformed { provider: String, message: String },

    // ── Ledger ──────────────────────────────────────────────────────
    #[error("Symbol not tracked by any holding declaration: {0}")]
    SymbolNotTracked(String),

    #[error("Cannot sell {requested} of {symbol} — only {available} owned")]
    InsufficientQuantity {
        symbol: String,
        requested: f64,
        available: f64,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    // ── Persistence ─────────────────────────────────────────────────
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WalletError {
    /// Whether this error came out of a provider fetch. The coordinator
    /// swallows these at per-symbol granularity and keeps stale data.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            WalletError::RateLimited { .. }
                | WalletError::Unavailable { .. }
                | WalletError::Malformed { .. }
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs so
        // crumbs and API tokens never end up in logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        WalletError::Unavailable {
            provider: "http".into(),
            message: sanitized,
        }
    }
}
