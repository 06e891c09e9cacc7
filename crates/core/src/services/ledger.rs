use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::errors::WalletError;
use crate::models::holding::{Holding, HoldingDeclaration};
use crate::models::snapshot::PriceSnapshot;
use crate::storage::store::LedgerDocument;

/// The process-wide portfolio: holding declarations plus one holding per
/// tracked symbol, indexed by canonical symbol.
///
/// Pure business logic — no I/O, no locking. The coordinator owns the
/// single instance and serializes all mutations behind its state lock;
/// persistence and rollback live there too.
#[derive(Debug, Clone, Default)]
pub struct PortfolioLedger {
    declarations: Vec<HoldingDeclaration>,
    holdings: HashMap<String, Holding>,
}

impl PortfolioLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from a persisted document. Holdings missing for a
    /// declared symbol (older store versions) are created empty.
    pub fn from_document(document: LedgerDocument) -> Self {
        let mut ledger = Self {
            declarations: Vec::new(),
            holdings: document.holdings,
        };
        for decl in document.declarations {
            ledger.declare(decl);
        }
        ledger
    }

    pub fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            declarations: self.declarations.clone(),
            holdings: self.holdings.clone(),
        }
    }

    // ── Declarations ────────────────────────────────────────────────

    /// Add or replace a holding declaration.
    ///
    /// Each declared symbol gets a holding (created at quantity 0 on
    /// first declaration). Re-declaring an existing symbol under a
    /// different provider moves the holding to that provider but keeps
    /// its quantity and basis — last declaration wins.
    pub fn declare(&mut self, declaration: HoldingDeclaration) {
        for symbol in &declaration.symbols {
            match self.holdings.get_mut(symbol) {
                Some(holding) => {
                    holding.provider = declaration.provider;
                    holding.asset_class = declaration.asset_class;
                }
                None => {
                    self.holdings.insert(
                        symbol.clone(),
                        Holding::declared(
                            symbol.clone(),
                            declaration.asset_class,
                            declaration.provider,
                        ),
                    );
                }
            }
        }

        match self
            .declarations
            .iter_mut()
            .find(|d| d.id == declaration.id)
        {
            Some(existing) => *existing = declaration,
            None => self.declarations.push(declaration),
        }
        self.prune_undeclared();
    }

    /// Remove a declaration by id. Holdings whose symbol no longer
    /// appears in any remaining declaration are dropped with it.
    pub fn remove_declaration(&mut self, id: Uuid) -> Result<(), WalletError> {
        let idx = self
            .declarations
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| WalletError::Validation(format!("No declaration with id {id}")))?;
        self.declarations.remove(idx);
        self.prune_undeclared();
        Ok(())
    }

    fn prune_undeclared(&mut self) {
        let declared: HashSet<&String> = self
            .declarations
            .iter()
            .flat_map(|d| d.symbols.iter())
            .collect();
        self.holdings.retain(|symbol, _| declared.contains(symbol));
    }

    pub fn declarations(&self) -> &[HoldingDeclaration] {
        &self.declarations
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Record a purchase: quantity goes up, the cost basis becomes the
    /// quantity-weighted mean of everything paid so far. A position at
    /// quantity 0 restarts its basis at the purchase price.
    pub fn buy(&mut self, symbol: &str, quantity: f64, price: f64) -> Result<Holding, WalletError> {
        if quantity <= 0.0 {
            return Err(WalletError::Validation(
                "Buy quantity must be positive".into(),
            ));
        }
        if price < 0.0 || !price.is_finite() {
            return Err(WalletError::Validation(
                "Buy price must be finite and non-negative".into(),
            ));
        }

        let key = self
            .resolve_symbol(symbol)
            .ok_or_else(|| WalletError::SymbolNotTracked(symbol.to_string()))?;
        let Some(holding) = self.holdings.get_mut(&key) else {
            return Err(WalletError::SymbolNotTracked(symbol.to_string()));
        };

        let old_qty = holding.quantity_owned;
        // A zero position contributes nothing to the weighted mean.
        let old_basis = if old_qty > 0.0 {
            holding.average_cost_basis
        } else {
            0.0
        };

        let total_qty = old_qty + quantity;
        let new_basis = if total_qty > 0.0 {
            (old_qty * old_basis + quantity * price) / total_qty
        } else {
            // Unreachable for a positive buy, guarded anyway.
            0.0
        };

        holding.quantity_owned = total_qty;
        holding.average_cost_basis = new_basis;
        debug!(
            symbol = %key,
            quantity = total_qty,
            basis = new_basis,
            "Applied buy"
        );
        Ok(holding.clone())
    }

    /// Record a sale: quantity goes down, the basis is untouched
    /// (realized gain/loss is not tracked here). Selling more than is
    /// owned fails without mutating anything.
    pub fn sell(&mut self, symbol: &str, quantity: f64) -> Result<Holding, WalletError> {
        if quantity <= 0.0 {
            return Err(WalletError::Validation(
                "Sell quantity must be positive".into(),
            ));
        }

        let key = self
            .resolve_symbol(symbol)
            .ok_or_else(|| WalletError::SymbolNotTracked(symbol.to_string()))?;
        let Some(holding) = self.holdings.get_mut(&key) else {
            return Err(WalletError::SymbolNotTracked(symbol.to_string()));
        };

        if quantity > holding.quantity_owned {
            return Err(WalletError::InsufficientQuantity {
                symbol: holding.display_symbol(),
                requested: quantity,
                available: holding.quantity_owned,
            });
        }

        holding.quantity_owned -= quantity;
        debug!(symbol = %key, quantity = holding.quantity_owned, "Applied sell");
        Ok(holding.clone())
    }

    // ── Aggregate metrics ───────────────────────────────────────────

    /// Sum of `quantity * average_cost_basis` over all holdings.
    pub fn total_investment(&self) -> f64 {
        self.holdings
            .values()
            .map(|h| h.quantity_owned * h.average_cost_basis)
            .sum()
    }

    /// Sum of `quantity * latest price` over all holdings. A holding
    /// whose symbol has no published snapshot yet contributes 0.
    pub fn total_value(&self, snapshots: &HashMap<String, PriceSnapshot>) -> f64 {
        self.holdings
            .values()
            .map(|h| {
                snapshots
                    .get(&h.symbol)
                    .map(|s| h.quantity_owned * s.quote.price)
                    .unwrap_or(0.0)
            })
            .sum()
    }

    /// `value - investment`.
    pub fn total_variation(&self, snapshots: &HashMap<String, PriceSnapshot>) -> f64 {
        self.total_value(snapshots) - self.total_investment()
    }

    /// Gain/loss as a percentage of the total investment; exactly 0 when
    /// nothing is invested.
    pub fn percentage_change(&self, snapshots: &HashMap<String, PriceSnapshot>) -> f64 {
        let investment = self.total_investment();
        if investment == 0.0 {
            return 0.0;
        }
        (self.total_value(snapshots) - investment) / investment * 100.0
    }

    // ── Lookups ─────────────────────────────────────────────────────

    pub fn holdings(&self) -> &HashMap<String, Holding> {
        &self.holdings
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.resolve_symbol(symbol)
            .and_then(|key| self.holdings.get(&key))
    }

    /// Resolve user input to a canonical holdings key. Stocks are stored
    /// uppercase and crypto ids lowercase, so the match has to be
    /// case-insensitive.
    fn resolve_symbol(&self, symbol: &str) -> Option<String> {
        let trimmed = symbol.trim();
        if self.holdings.contains_key(trimmed) {
            return Some(trimmed.to_string());
        }
        self.holdings
            .keys()
            .find(|k| k.eq_ignore_ascii_case(trimmed))
            .cloned()
    }
}
