pub mod normalize;
pub mod registry;
pub mod traits;

// API provider implementations
pub mod coingecko;
pub mod yahoo;

use std::time::Duration;

/// Default wait after a 429 when the provider sends no `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Parse the `Retry-After` header of a 429 response, falling back to the
/// 60s default when absent or unparseable.
pub(crate) fn retry_after_from(headers: &reqwest::header::HeaderMap) -> Duration {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}
