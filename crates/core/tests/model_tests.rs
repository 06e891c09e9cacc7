// ═══════════════════════════════════════════════════════════════════
// Model Tests — asset classes, providers, declarations, snapshots
// ═══════════════════════════════════════════════════════════════════

use chrono::Utc;
use serde_json::json;

use trading_wallet_core::models::snapshot::NormalizedQuote;
use trading_wallet_core::{
    AssetClass, HistoricalSeries, Holding, HoldingDeclaration, PriceSnapshot,
    ProviderKind, WalletError,
};

// ── AssetClass ──────────────────────────────────────────────────────

mod asset_class {
    use super::*;

    #[test]
    fn canonical_case_per_class() {
        assert_eq!(AssetClass::Stock.canonical_symbol("  aapl "), "AAPL");
        assert_eq!(AssetClass::Crypto.canonical_symbol(" Bitcoin"), "bitcoin");
    }

    #[test]
    fn parses_from_service_strings() {
        assert_eq!("stock".parse::<AssetClass>().unwrap(), AssetClass::Stock);
        assert_eq!("Stocks".parse::<AssetClass>().unwrap(), AssetClass::Stock);
        assert_eq!("equity".parse::<AssetClass>().unwrap(), AssetClass::Stock);
        assert_eq!("CRYPTO".parse::<AssetClass>().unwrap(), AssetClass::Crypto);
        assert_eq!(
            " cryptocurrency ".parse::<AssetClass>().unwrap(),
            AssetClass::Crypto
        );
    }

    #[test]
    fn unknown_class_string_is_a_validation_error() {
        let err = "bond".parse::<AssetClass>().unwrap_err();
        assert!(matches!(err, WalletError::Validation(_)));
        assert!(err.to_string().contains("bond"));
    }

    #[test]
    fn display_names() {
        assert_eq!(AssetClass::Stock.to_string(), "Stock");
        assert_eq!(AssetClass::Crypto.to_string(), "Crypto");
    }
}

// ── ProviderKind ────────────────────────────────────────────────────

mod provider_kind {
    use super::*;

    #[test]
    fn defaults_per_asset_class() {
        assert_eq!(
            ProviderKind::default_for(AssetClass::Stock),
            ProviderKind::YahooFinance
        );
        assert_eq!(
            ProviderKind::default_for(AssetClass::Crypto),
            ProviderKind::CoinGecko
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(ProviderKind::YahooFinance.to_string(), "Yahoo Finance");
        assert_eq!(ProviderKind::CoinGecko.to_string(), "CoinGecko");
    }
}

// ── Holdings & declarations ─────────────────────────────────────────

mod declarations {
    use super::*;

    #[test]
    fn declared_holding_starts_empty() {
        let h = Holding::declared(
            "AAPL".into(),
            AssetClass::Stock,
            ProviderKind::YahooFinance,
        );
        assert_eq!(h.quantity_owned, 0.0);
        assert_eq!(h.average_cost_basis, 0.0);
    }

    #[test]
    fn display_symbol_is_uppercase_even_for_crypto() {
        let h = Holding::declared(
            "bitcoin".into(),
            AssetClass::Crypto,
            ProviderKind::CoinGecko,
        );
        assert_eq!(h.display_symbol(), "BITCOIN");
        assert_eq!(h.symbol, "bitcoin");
    }

    #[test]
    fn comma_list_is_trimmed_canonicalized_and_deblanked() {
        let decl = HoldingDeclaration::new(
            " aapl, ,MSFT ,,tsla",
            ProviderKind::YahooFinance,
            AssetClass::Stock,
        );
        assert_eq!(decl.symbols, vec!["AAPL", "MSFT", "TSLA"]);
    }

    #[test]
    fn each_declaration_gets_a_distinct_id() {
        let a = HoldingDeclaration::with_default_provider("AAPL", AssetClass::Stock);
        let b = HoldingDeclaration::with_default_provider("AAPL", AssetClass::Stock);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn declaration_serde_round_trip() {
        let decl = HoldingDeclaration::with_default_provider(
            "bitcoin,ethereum",
            AssetClass::Crypto,
        );
        let json = serde_json::to_string(&decl).unwrap();
        let back: HoldingDeclaration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decl);
    }
}

// ── Snapshots & history ─────────────────────────────────────────────

mod snapshots {
    use super::*;

    fn quote(price: f64) -> NormalizedQuote {
        NormalizedQuote {
            price,
            market_state: Some("REGULAR".into()),
            currency: Some("USD".into()),
            display_symbol: "AAPL".into(),
        }
    }

    #[test]
    fn snapshot_age_grows_with_now() {
        let snapshot = PriceSnapshot::new("AAPL", quote(185.0), json!({}));
        let later = snapshot.fetched_at + chrono::Duration::minutes(10);
        assert_eq!(snapshot.age(later), chrono::Duration::minutes(10));
    }

    #[test]
    fn snapshot_keeps_the_raw_payload() {
        let raw = json!({ "quoteResponse": { "result": [] } });
        let snapshot = PriceSnapshot::new("AAPL", quote(185.0), raw.clone());
        assert_eq!(snapshot.raw, raw);
    }

    #[test]
    fn empty_series_reports_empty() {
        let series = HistoricalSeries::new("AAPL", "1wk", Vec::new());
        assert!(series.is_empty());
        assert!(series.fetched_at <= Utc::now());
    }
}
