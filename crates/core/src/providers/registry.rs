use std::collections::HashMap;

use crate::models::holding::{AssetClass, HoldingDeclaration, ProviderKind};

/// What the registry knows about one tracked symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub provider: ProviderKind,
    pub asset_class: AssetClass,
}

/// Derived mapping from canonical symbol to the provider responsible
/// for it. Never persisted — always rebuilt from the current holding
/// declarations whenever one is added, changed, or removed, and
/// read-only to the coordinator between rebuilds.
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl SymbolRegistry {
    /// Rebuild from the current declarations.
    ///
    /// Deterministic: declarations are walked in order, so when the same
    /// symbol appears under two providers the last declaration wins.
    /// (Documented behavior inherited from the configuration model; a
    /// registry test pins it down.)
    pub fn rebuild(declarations: &[HoldingDeclaration]) -> Self {
        let mut entries = HashMap::new();
        for decl in declarations {
            for symbol in &decl.symbols {
                // Declaration symbols are already canonical and non-blank,
                // but input from older stores may not be.
                let canonical = decl.asset_class.canonical_symbol(symbol);
                if canonical.is_empty() {
                    continue;
                }
                entries.insert(
                    canonical,
                    RegistryEntry {
                        provider: decl.provider,
                        asset_class: decl.asset_class,
                    },
                );
            }
        }
        Self { entries }
    }

    pub fn get(&self, symbol: &str) -> Option<RegistryEntry> {
        self.entries.get(symbol).copied()
    }

    /// Provider responsible for a symbol, if tracked.
    pub fn provider_for(&self, symbol: &str) -> Option<ProviderKind> {
        self.get(symbol).map(|e| e.provider)
    }

    /// Group all tracked symbols by provider for the fetch fan-out.
    /// Symbol lists are sorted so each cycle walks them in the same order.
    pub fn symbols_by_provider(&self) -> HashMap<ProviderKind, Vec<(String, AssetClass)>> {
        let mut groups: HashMap<ProviderKind, Vec<(String, AssetClass)>> = HashMap::new();
        for (symbol, entry) in &self.entries {
            groups
                .entry(entry.provider)
                .or_default()
                .push((symbol.clone(), entry.asset_class));
        }
        for symbols in groups.values_mut() {
            symbols.sort_by(|a, b| a.0.cmp(&b.0));
        }
        groups
    }

    /// Flat `symbol → provider` view, mainly for assertions and display.
    pub fn as_provider_map(&self) -> HashMap<String, ProviderKind> {
        self.entries
            .iter()
            .map(|(s, e)| (s.clone(), e.provider))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
