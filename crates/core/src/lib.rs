//! Trading Wallet core: tracks stock and crypto holdings, periodically
//! refreshes their prices from external providers, and derives
//! portfolio-level metrics (value, cost basis, gain/loss).
//!
//! The center of the crate is the [`RefreshCoordinator`]: it owns the
//! polling schedule, the provider clients, and the single lock guarding
//! the [`PortfolioLedger`] and the published snapshot set. Construct it
//! once at process start, spawn its loop, and hand it by `Arc` to
//! whatever consumes the command and declaration boundaries:
//!
//! ```no_run
//! use std::sync::Arc;
//! use trading_wallet_core::{
//!     AssetClass, CoordinatorConfig, HoldingDeclaration, JsonFileStore,
//!     RefreshCoordinator,
//! };
//!
//! # async fn example() -> Result<(), trading_wallet_core::WalletError> {
//! let store = Arc::new(JsonFileStore::new("wallet.json"));
//! let coordinator = Arc::new(RefreshCoordinator::new(store, CoordinatorConfig::default())?);
//! let loop_handle = coordinator.spawn();
//!
//! coordinator
//!     .declare(HoldingDeclaration::with_default_provider("AAPL,MSFT", AssetClass::Stock))
//!     .await?;
//! coordinator.buy("AAPL", 10.0, 185.0).await?;
//! println!("portfolio value: {}", coordinator.total_value().await);
//!
//! coordinator.shutdown();
//! loop_handle.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

pub use errors::WalletError;
pub use models::history::{HistoricalPoint, HistoricalSeries};
pub use models::holding::{AssetClass, Holding, HoldingDeclaration, ProviderKind};
pub use models::snapshot::{NormalizedQuote, PriceSnapshot};
pub use providers::registry::SymbolRegistry;
pub use providers::traits::QuoteProvider;
pub use services::commands::{dispatch, CommandOutcome, WalletCommand};
pub use services::coordinator::{
    CoordinatorConfig, RefreshCoordinator, RetryPolicy, DEFAULT_POLL_INTERVAL,
};
pub use services::ledger::PortfolioLedger;
pub use storage::store::{HoldingStore, JsonFileStore, LedgerDocument, MemoryStore};
