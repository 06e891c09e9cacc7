use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Notify};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::WalletError;
use crate::models::history::HistoricalSeries;
use crate::models::holding::{AssetClass, Holding, HoldingDeclaration, ProviderKind};
use crate::models::snapshot::PriceSnapshot;
use crate::providers::coingecko::CoinGeckoClient;
use crate::providers::registry::SymbolRegistry;
use crate::providers::traits::QuoteProvider;
use crate::providers::yahoo::YahooFinanceClient;
use crate::storage::store::HoldingStore;

use super::ledger::PortfolioLedger;

/// Default poll interval: 10 minutes. Staleness within the interval is
/// an accepted trade-off; this is not a real-time feed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// How the coordinator reacts to `RateLimited` during a cycle.
///
/// Deterministic policy: a rate-limited symbol is retried once after
/// sleeping out the provider's `retry_after`, provided the cycle's
/// cumulative wait stays within `max_total_wait`. Otherwise the
/// provider's remaining symbols are deferred to the next cycle and their
/// stale snapshots retained. The ceiling keeps one throttled provider
/// from stalling the scheduler indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_total_wait: Duration,
}

impl RetryPolicy {
    /// Budget matching a poll interval: never wait longer than one cycle.
    pub fn for_interval(interval: Duration) -> Self {
        Self {
            max_total_wait: interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_interval(DEFAULT_POLL_INTERVAL)
    }
}

/// Coordinator construction parameters.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub poll_interval: Duration,
    /// Quote currency for providers that take one (CoinGecko), lowercase.
    pub preferred_currency: String,
    pub retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            preferred_currency: "usd".into(),
            retry: RetryPolicy::default(),
        }
    }
}

/// The two pieces of shared mutable state, guarded together: ledger
/// mutations and snapshot merges must never interleave, so one lock
/// covers both (fine-grained locking buys nothing at this scale).
struct WalletState {
    ledger: PortfolioLedger,
    registry: SymbolRegistry,
    snapshots: HashMap<String, PriceSnapshot>,
}

/// Owns the polling schedule, fans fetches out per provider, merges
/// results with stale-data fallback, and applies buy/sell transactions
/// against the ledger.
///
/// Constructed once at process start and handed by reference (`Arc`) to
/// the command dispatcher and the declaration layer — there is no
/// ambient global instance.
pub struct RefreshCoordinator {
    providers: HashMap<ProviderKind, Arc<dyn QuoteProvider>>,
    state: Mutex<WalletState>,
    store: Arc<dyn HoldingStore>,
    interval_tx: watch::Sender<Duration>,
    force_refresh: Notify,
    shutdown: Notify,
    stopping: AtomicBool,
    retry: RetryPolicy,
    /// Session-only cache of lazily fetched historical series,
    /// keyed by (canonical symbol, interval).
    history: Mutex<HashMap<(String, String), HistoricalSeries>>,
}

impl RefreshCoordinator {
    /// Build a coordinator with the default provider clients (Yahoo
    /// Finance for stocks, CoinGecko for crypto), loading the persisted
    /// ledger from `store`.
    pub fn new(
        store: Arc<dyn HoldingStore>,
        config: CoordinatorConfig,
    ) -> Result<Self, WalletError> {
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![
            Arc::new(YahooFinanceClient::new()),
            Arc::new(CoinGeckoClient::new(&config.preferred_currency)),
        ];
        Self::with_providers(store, config, providers)
    }

    /// Build a coordinator with explicitly injected provider clients.
    /// One client per `ProviderKind`; a duplicate kind replaces the
    /// earlier client.
    pub fn with_providers(
        store: Arc<dyn HoldingStore>,
        config: CoordinatorConfig,
        providers: Vec<Arc<dyn QuoteProvider>>,
    ) -> Result<Self, WalletError> {
        let document = store.load()?;
        let ledger = PortfolioLedger::from_document(document);
        let registry = SymbolRegistry::rebuild(ledger.declarations());
        info!(
            declarations = ledger.declarations().len(),
            symbols = registry.len(),
            "Loaded portfolio ledger"
        );

        let providers = providers.into_iter().map(|p| (p.kind(), p)).collect();
        let (interval_tx, _) = watch::channel(config.poll_interval);

        Ok(Self {
            providers,
            state: Mutex::new(WalletState {
                ledger,
                registry,
                snapshots: HashMap::new(),
            }),
            store,
            interval_tx,
            force_refresh: Notify::new(),
            shutdown: Notify::new(),
            stopping: AtomicBool::new(false),
            retry: config.retry,
            history: Mutex::new(HashMap::new()),
        })
    }

    // ── Scheduling ──────────────────────────────────────────────────

    /// Spawn the polling loop on the current runtime. Aborting the
    /// returned handle (or calling [`shutdown`](Self::shutdown))
    /// cancels the pending timer and abandons in-flight fetches.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.run().await })
    }

    /// Drive the refresh loop: sleep for the poll interval, run a cycle,
    /// repeat. A forced refresh preempts the idle wait (never an
    /// in-flight cycle); changing the interval cancels the pending timer
    /// and reschedules from now.
    pub async fn run(self: Arc<Self>) {
        let mut interval_rx = self.interval_tx.subscribe();
        info!(interval = ?*interval_rx.borrow(), "Refresh loop started");

        loop {
            if self.stopping.load(Ordering::SeqCst) {
                break;
            }
            let delay = *interval_rx.borrow_and_update();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.refresh_once().await;
                }
                _ = self.force_refresh.notified() => {
                    debug!("Forced refresh preempting idle wait");
                    self.refresh_once().await;
                }
                changed = interval_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!(interval = ?*interval_rx.borrow(), "Poll interval changed; rescheduling");
                }
                _ = self.shutdown.notified() => {
                    break;
                }
            }
        }
        info!("Refresh loop stopped");
    }

    /// Request an out-of-band refresh. If the loop is idle it wakes
    /// immediately; if a cycle is in flight the request is held and
    /// honored right after it completes.
    pub fn force_refresh(&self) {
        self.force_refresh.notify_one();
    }

    /// Stop the polling loop. In-flight network calls are abandoned with
    /// the task; the persisted ledger is already the authoritative record.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    /// Replace the poll interval. Takes effect immediately: the pending
    /// timer is cancelled and the next cycle is scheduled a full new
    /// interval from now.
    pub fn set_poll_interval(&self, interval: Duration) {
        info!(?interval, "Updating poll interval");
        // send() drops the value when the loop (the only receiver) is not
        // running; send_replace stores it unconditionally so a value set
        // before spawn() still takes effect.
        self.interval_tx.send_replace(interval);
    }

    pub fn poll_interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }

    // ── Refresh cycle ───────────────────────────────────────────────

    /// Run one full fetch/merge/publish cycle.
    ///
    /// Providers are fetched concurrently, symbols serially within each
    /// provider (clients share rate-limit and token state). Per-symbol
    /// failures keep that symbol's previous snapshot; a cycle that
    /// yields nothing at all republishes the previous set unchanged.
    pub async fn refresh_once(&self) {
        let groups = {
            let state = self.state.lock().await;
            state.registry.symbols_by_provider()
        };
        if groups.is_empty() {
            debug!("No symbols tracked; skipping refresh cycle");
            return;
        }

        let mut tasks = tokio::task::JoinSet::new();
        for (kind, symbols) in groups {
            let Some(provider) = self.providers.get(&kind) else {
                warn!(provider = %kind, "No client registered for provider; skipping its symbols");
                continue;
            };
            let provider = Arc::clone(provider);
            let retry = self.retry;
            tasks.spawn(async move { fetch_provider_group(provider, symbols, retry).await });
        }

        let mut fresh: HashMap<String, PriceSnapshot> = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(snapshots) => fresh.extend(snapshots),
                Err(e) => error!(error = %e, "Provider fetch task failed"),
            }
        }

        let mut state = self.state.lock().await;
        if fresh.is_empty() {
            // Never overwrite previously good data with an empty set.
            debug!("Refresh cycle produced no data; retaining previous snapshots");
            return;
        }
        for (symbol, snapshot) in fresh {
            state.snapshots.insert(symbol, snapshot);
        }
        info!(symbols = state.snapshots.len(), "Published merged snapshot set");
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Apply a purchase, persist the ledger, then trigger a refresh.
    /// Persistence happens-before the refresh; a failed save rolls the
    /// in-memory ledger back and surfaces the error.
    pub async fn buy(
        &self,
        symbol: &str,
        quantity: f64,
        price: f64,
    ) -> Result<Holding, WalletError> {
        let holding = {
            let mut state = self.state.lock().await;
            let backup = state.ledger.clone();
            let holding = state.ledger.buy(symbol, quantity, price)?;
            if let Err(e) = self.store.save(&state.ledger.to_document()) {
                error!(%symbol, error = %e, "Persisting buy failed; rolling back");
                state.ledger = backup;
                return Err(e);
            }
            holding
        };
        self.force_refresh();
        Ok(holding)
    }

    /// Apply a sale with the same persist/rollback discipline as `buy`.
    pub async fn sell(&self, symbol: &str, quantity: f64) -> Result<Holding, WalletError> {
        let holding = {
            let mut state = self.state.lock().await;
            let backup = state.ledger.clone();
            let holding = state.ledger.sell(symbol, quantity)?;
            if let Err(e) = self.store.save(&state.ledger.to_document()) {
                error!(%symbol, error = %e, "Persisting sell failed; rolling back");
                state.ledger = backup;
                return Err(e);
            }
            holding
        };
        self.force_refresh();
        Ok(holding)
    }

    // ── Declarations ────────────────────────────────────────────────

    /// Add or replace a holding declaration, rebuild the registry, and
    /// persist. Triggers a forced refresh so the new symbols get prices
    /// without waiting out the interval.
    pub async fn declare(&self, declaration: HoldingDeclaration) -> Result<(), WalletError> {
        {
            let mut state = self.state.lock().await;
            let backup = state.ledger.clone();
            state.ledger.declare(declaration);
            if let Err(e) = self.rebuild_and_save(&mut state) {
                state.ledger = backup;
                state.registry = SymbolRegistry::rebuild(state.ledger.declarations());
                return Err(e);
            }
        }
        self.force_refresh();
        Ok(())
    }

    /// Remove a declaration by id; drops holdings and snapshots for
    /// symbols no longer declared anywhere.
    pub async fn remove_declaration(&self, id: Uuid) -> Result<(), WalletError> {
        {
            let mut state = self.state.lock().await;
            let backup = state.ledger.clone();
            state.ledger.remove_declaration(id)?;
            if let Err(e) = self.rebuild_and_save(&mut state) {
                state.ledger = backup;
                state.registry = SymbolRegistry::rebuild(state.ledger.declarations());
                return Err(e);
            }
            let registry = &state.registry;
            let retained: Vec<String> = state
                .snapshots
                .keys()
                .filter(|s| registry.get(s).is_some())
                .cloned()
                .collect();
            state.snapshots.retain(|s, _| retained.contains(s));
        }
        self.force_refresh();
        Ok(())
    }

    fn rebuild_and_save(&self, state: &mut WalletState) -> Result<(), WalletError> {
        state.registry = SymbolRegistry::rebuild(state.ledger.declarations());
        self.store.save(&state.ledger.to_document())?;
        debug!(symbols = state.registry.len(), "Registry rebuilt and ledger persisted");
        Ok(())
    }

    // ── Historical data ─────────────────────────────────────────────

    /// Fetch a historical series on demand, outside the refresh cycle.
    /// The provider comes from the registry; untracked symbols fall back
    /// to the asset class's default provider. Results are cached in
    /// memory for this session only.
    pub async fn fetch_history(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        interval: &str,
    ) -> Result<HistoricalSeries, WalletError> {
        let canonical = asset_class.canonical_symbol(symbol);
        let kind = {
            let state = self.state.lock().await;
            state
                .registry
                .provider_for(&canonical)
                .unwrap_or_else(|| ProviderKind::default_for(asset_class))
        };
        let provider = self.providers.get(&kind).ok_or_else(|| {
            WalletError::Unavailable {
                provider: kind.to_string(),
                message: "no client registered".into(),
            }
        })?;

        info!(symbol = %canonical, %interval, provider = %kind, "Fetching historical data");
        let series = provider.fetch_history(&canonical, interval).await?;
        self.history
            .lock()
            .await
            .insert((canonical, interval.to_string()), series.clone());
        Ok(series)
    }

    /// Read a previously fetched series from the session cache.
    pub async fn historical_series(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        interval: &str,
    ) -> Option<HistoricalSeries> {
        let canonical = asset_class.canonical_symbol(symbol);
        self.history
            .lock()
            .await
            .get(&(canonical, interval.to_string()))
            .cloned()
    }

    // ── Published state (read-only boundary) ────────────────────────

    /// The latest published snapshot set. Always a complete, internally
    /// consistent merge — never a half-merged cycle.
    pub async fn current_snapshot(&self) -> HashMap<String, PriceSnapshot> {
        self.state.lock().await.snapshots.clone()
    }

    /// All holdings, keyed by canonical symbol.
    pub async fn current_holdings(&self) -> HashMap<String, Holding> {
        self.state.lock().await.ledger.holdings().clone()
    }

    /// The current symbol → provider mapping.
    pub async fn registry_map(&self) -> HashMap<String, ProviderKind> {
        self.state.lock().await.registry.as_provider_map()
    }

    pub async fn total_investment(&self) -> f64 {
        self.state.lock().await.ledger.total_investment()
    }

    pub async fn total_value(&self) -> f64 {
        let state = self.state.lock().await;
        state.ledger.total_value(&state.snapshots)
    }

    pub async fn total_variation(&self) -> f64 {
        let state = self.state.lock().await;
        state.ledger.total_variation(&state.snapshots)
    }

    pub async fn percentage_change(&self) -> f64 {
        let state = self.state.lock().await;
        state.ledger.percentage_change(&state.snapshots)
    }
}

/// Fetch one provider's symbols serially, honoring the rate-limit
/// policy. Returns the successful snapshots; failed symbols are simply
/// absent (the merge keeps their previous data).
async fn fetch_provider_group(
    provider: Arc<dyn QuoteProvider>,
    symbols: Vec<(String, AssetClass)>,
    retry: RetryPolicy,
) -> Vec<(String, PriceSnapshot)> {
    let mut fetched = Vec::new();
    let mut waited = Duration::ZERO;

    'symbols: for (symbol, _) in symbols {
        let mut retried = false;
        loop {
            match provider.fetch_quote(&symbol).await {
                Ok(snapshot) => {
                    fetched.push((symbol.clone(), snapshot));
                    break;
                }
                Err(WalletError::RateLimited { retry_after }) => {
                    if retried || waited + retry_after > retry.max_total_wait {
                        warn!(
                            provider = provider.name(),
                            %symbol,
                            ?retry_after,
                            "Rate limit wait budget exhausted; deferring remaining symbols to next cycle"
                        );
                        break 'symbols;
                    }
                    warn!(
                        provider = provider.name(),
                        %symbol,
                        ?retry_after,
                        "Rate limited; waiting before retry"
                    );
                    tokio::time::sleep(retry_after).await;
                    waited += retry_after;
                    retried = true;
                }
                Err(e) => {
                    // One symbol's failure never aborts the cycle.
                    warn!(
                        provider = provider.name(),
                        %symbol,
                        error = %e,
                        "Fetch failed; keeping stale snapshot"
                    );
                    break;
                }
            }
        }
    }
    fetched
}
