use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::WalletError;

/// The class of a tracked asset.
/// Determines the default price provider and the symbol case convention
/// used when talking to that provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Equities (AAPL, MSFT, ...) — symbols are uppercased for requests.
    Stock,
    /// Cryptocurrencies (bitcoin, ethereum, ...) — provider ids are lowercase.
    Crypto,
}

impl AssetClass {
    /// Canonical registry/request form of a symbol for this asset class.
    /// Display always uppercases; this is the form requests are built from.
    pub fn canonical_symbol(&self, symbol: &str) -> String {
        match self {
            AssetClass::Stock => symbol.trim().to_uppercase(),
            AssetClass::Crypto => symbol.trim().to_lowercase(),
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Stock => write!(f, "Stock"),
            AssetClass::Crypto => write!(f, "Crypto"),
        }
    }
}

impl std::str::FromStr for AssetClass {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "stocks" | "equity" => Ok(AssetClass::Stock),
            "crypto" | "cryptocurrency" => Ok(AssetClass::Crypto),
            other => Err(WalletError::Validation(format!(
                "Unknown asset class '{other}' (expected 'stock' or 'crypto')"
            ))),
        }
    }
}

/// Which external data source services a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    YahooFinance,
    CoinGecko,
}

impl ProviderKind {
    /// The provider used for an asset class when a declaration does not
    /// name one explicitly.
    pub fn default_for(asset_class: AssetClass) -> Self {
        match asset_class {
            AssetClass::Stock => ProviderKind::YahooFinance,
            AssetClass::Crypto => ProviderKind::CoinGecko,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::YahooFinance => write!(f, "Yahoo Finance"),
            ProviderKind::CoinGecko => write!(f, "CoinGecko"),
        }
    }
}

/// One tracked position: a symbol with its quantity and the
/// weighted-average price paid per unit.
///
/// Invariants: `quantity_owned >= 0` always; when `quantity_owned == 0`
/// the basis is meaningless and is treated as 0 on the next buy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Canonical symbol (uppercase for stocks, lowercase for crypto ids).
    pub symbol: String,
    pub asset_class: AssetClass,
    pub provider: ProviderKind,
    pub quantity_owned: f64,
    pub average_cost_basis: f64,
}

impl Holding {
    /// A freshly declared, empty position.
    pub fn declared(symbol: String, asset_class: AssetClass, provider: ProviderKind) -> Self {
        Self {
            symbol,
            asset_class,
            provider,
            quantity_owned: 0.0,
            average_cost_basis: 0.0,
        }
    }

    /// Uppercase form for display, regardless of the request convention.
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }
}

/// A holding declaration: a set of symbols to track under one provider
/// and asset class. Declarations come from the external configuration
/// boundary; the ledger derives per-symbol holdings from them and the
/// registry derives the symbol → provider mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingDeclaration {
    pub id: Uuid,
    /// Canonical symbols, blanks already discarded.
    pub symbols: Vec<String>,
    pub provider: ProviderKind,
    pub asset_class: AssetClass,
}

impl HoldingDeclaration {
    /// Build a declaration from a comma-separated symbol list as captured
    /// by the configuration flow ("AAPL, MSFT ,,TSLA"). Tokens are trimmed,
    /// blank tokens dropped, and the rest canonicalized for the class.
    pub fn new(symbols: &str, provider: ProviderKind, asset_class: AssetClass) -> Self {
        let symbols = symbols
            .split(',')
            .map(|s| asset_class.canonical_symbol(s))
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            id: Uuid::new_v4(),
            symbols,
            provider,
            asset_class,
        }
    }

    /// Declaration with the default provider for the asset class.
    pub fn with_default_provider(symbols: &str, asset_class: AssetClass) -> Self {
        Self::new(symbols, ProviderKind::default_for(asset_class), asset_class)
    }
}
