use async_trait::async_trait;

use crate::errors::WalletError;
use crate::models::history::HistoricalSeries;
use crate::models::holding::{AssetClass, ProviderKind};
use crate::models::snapshot::PriceSnapshot;

/// Trait abstraction for all price data providers.
///
/// Each external source (Yahoo Finance, CoinGecko) implements this trait
/// once; the registry selects an implementation per symbol at rebuild
/// time, so no caller ever dispatches on a provider name string.
///
/// Clients are pure request/response: on a 429 they return
/// `WalletError::RateLimited` immediately and let the coordinator decide
/// whether to wait or defer. One client instance is reused for the
/// coordinator's lifetime to amortize token acquisition and keep
/// connections warm.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// The registry tag this client serves.
    fn kind(&self) -> ProviderKind;

    /// Which asset classes this provider can quote.
    fn supported_asset_classes(&self) -> Vec<AssetClass>;

    /// Fetch the current quote for a symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<PriceSnapshot, WalletError>;

    /// Fetch a historical series for a symbol at a provider-native
    /// interval token. Not part of the periodic refresh cycle.
    async fn fetch_history(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<HistoricalSeries, WalletError>;
}
