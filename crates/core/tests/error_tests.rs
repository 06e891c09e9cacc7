// ═══════════════════════════════════════════════════════════════════
// Error Tests — WalletError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use std::time::Duration;

use trading_wallet_core::WalletError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn rate_limited() {
        let err = WalletError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "Rate limited — retry after 60s");
    }

    #[test]
    fn unavailable() {
        let err = WalletError::Unavailable {
            provider: "Yahoo Finance".into(),
            message: "request returned 500".into(),
        };
        assert_eq!(
            err.to_string(),
            "Provider unavailable (Yahoo Finance): request returned 500"
        );
    }

    #[test]
    fn malformed() {
        let err = WalletError::Malformed {
            provider: "CoinGecko".into(),
            message: "missing current_price".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed response (CoinGecko): missing current_price"
        );
    }

    #[test]
    fn symbol_not_tracked() {
        let err = WalletError::SymbolNotTracked("TSLA".into());
        assert_eq!(
            err.to_string(),
            "Symbol not tracked by any holding declaration: TSLA"
        );
    }

    #[test]
    fn insufficient_quantity() {
        let err = WalletError::InsufficientQuantity {
            symbol: "AAPL".into(),
            requested: 25.0,
            available: 20.0,
        };
        assert_eq!(err.to_string(), "Cannot sell 25 of AAPL — only 20 owned");
    }

    #[test]
    fn validation() {
        let err = WalletError::Validation("Buy quantity must be positive".into());
        assert_eq!(
            err.to_string(),
            "Validation failed: Buy quantity must be positive"
        );
    }

    #[test]
    fn io() {
        let err = WalletError::Io("permission denied".into());
        assert_eq!(err.to_string(), "Storage I/O error: permission denied");
    }

    #[test]
    fn serialization() {
        let err = WalletError::Serialization("unexpected EOF".into());
        assert_eq!(err.to_string(), "Serialization error: unexpected EOF");
    }
}

// ── Provider-error classification ───────────────────────────────────

mod classification {
    use super::*;

    #[test]
    fn fetch_failures_are_provider_errors() {
        let errors = [
            WalletError::RateLimited {
                retry_after: Duration::from_secs(1),
            },
            WalletError::Unavailable {
                provider: "p".into(),
                message: "m".into(),
            },
            WalletError::Malformed {
                provider: "p".into(),
                message: "m".into(),
            },
        ];
        for err in &errors {
            assert!(err.is_provider_error(), "{err}");
        }
    }

    #[test]
    fn ledger_and_storage_failures_are_not() {
        let errors = [
            WalletError::SymbolNotTracked("X".into()),
            WalletError::InsufficientQuantity {
                symbol: "X".into(),
                requested: 1.0,
                available: 0.0,
            },
            WalletError::Validation("v".into()),
            WalletError::Io("io".into()),
            WalletError::Serialization("s".into()),
        ];
        for err in &errors {
            assert!(!err.is_provider_error(), "{err}");
        }
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod from_impls {
    use super::*;

    #[test]
    fn from_io_error_preserves_message() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WalletError = io_err.into();
        match &err {
            WalletError::Io(msg) => assert!(msg.contains("file not found")),
            other => panic!("Expected Io, got {:?}", other),
        }
    }

    #[test]
    fn from_serde_json_error() {
        // Trigger a real serde_json error
        let result: Result<serde_json::Value, _> = serde_json::from_str("{{invalid json");
        let json_err = result.unwrap_err();
        let err: WalletError = json_err.into();
        match &err {
            WalletError::Serialization(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Serialization, got {:?}", other),
        }
    }

    #[test]
    fn from_serde_json_error_eof() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("");
        let json_err = result.unwrap_err();
        let err: WalletError = json_err.into();
        match &err {
            WalletError::Serialization(msg) => assert!(msg.contains("EOF")),
            other => panic!("Expected Serialization, got {:?}", other),
        }
    }
}

// ── Error is std::error::Error ──────────────────────────────────────

mod std_error {
    use super::*;

    #[test]
    fn wallet_error_implements_error_trait() {
        let err: Box<dyn std::error::Error> =
            Box::new(WalletError::SymbolNotTracked("TSLA".into()));
        assert!(err.to_string().contains("TSLA"));
    }

    #[test]
    fn wallet_error_implements_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<WalletError>();
        assert_sync::<WalletError>();
    }
}
