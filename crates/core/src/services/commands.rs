//! Typed command boundary, the equivalent of the original integration's
//! service layer: each command maps to one coordinator call, failures
//! come back typed for the caller to log, and nothing is retried here.

use tracing::debug;

use crate::errors::WalletError;
use crate::models::history::HistoricalSeries;
use crate::models::holding::{AssetClass, Holding};

use super::coordinator::RefreshCoordinator;

/// Default history interval when a `FetchHistory` command omits one.
pub const DEFAULT_HISTORY_INTERVAL: &str = "1wk";

/// Commands consumed from an external dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletCommand {
    RefreshNow,
    FetchHistory {
        symbol: String,
        asset_class: AssetClass,
        interval: Option<String>,
    },
    Buy {
        symbol: String,
        quantity: f64,
        price: f64,
    },
    Sell {
        symbol: String,
        quantity: f64,
    },
}

/// What a successfully dispatched command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    RefreshRequested,
    History(HistoricalSeries),
    Transaction(Holding),
}

/// Execute one command against the coordinator.
pub async fn dispatch(
    coordinator: &RefreshCoordinator,
    command: WalletCommand,
) -> Result<CommandOutcome, WalletError> {
    debug!(?command, "Dispatching wallet command");
    match command {
        WalletCommand::RefreshNow => {
            coordinator.force_refresh();
            Ok(CommandOutcome::RefreshRequested)
        }
        WalletCommand::FetchHistory {
            symbol,
            asset_class,
            interval,
        } => {
            let interval = interval.as_deref().unwrap_or(DEFAULT_HISTORY_INTERVAL);
            let series = coordinator
                .fetch_history(&symbol, asset_class, interval)
                .await?;
            Ok(CommandOutcome::History(series))
        }
        WalletCommand::Buy {
            symbol,
            quantity,
            price,
        } => {
            let holding = coordinator.buy(&symbol, quantity, price).await?;
            Ok(CommandOutcome::Transaction(holding))
        }
        WalletCommand::Sell { symbol, quantity } => {
            let holding = coordinator.sell(&symbol, quantity).await?;
            Ok(CommandOutcome::Transaction(holding))
        }
    }
}
