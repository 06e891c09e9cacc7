//! Pure payload → `NormalizedQuote` extraction, one function per
//! provider shape. No I/O here; malformed input maps to
//! `WalletError::Malformed` which callers treat like `Unavailable`.

use serde_json::Value;

use crate::errors::WalletError;
use crate::models::snapshot::NormalizedQuote;

fn malformed(provider: &str, message: impl Into<String>) -> WalletError {
    WalletError::Malformed {
        provider: provider.into(),
        message: message.into(),
    }
}

/// Extract a canonical quote from a Yahoo Finance v7 quote payload
/// (`quoteResponse.result[0]`).
///
/// Price selection is a strict preference order, not an average:
/// in `PRE`/`PREPRE` the pre-market price wins, falling back to the
/// regular session price if absent; in `POST`/`POSTPOST` the post-market
/// price wins with the same fallback; any other state uses the regular
/// session price.
pub fn equity_quote(raw: &Value) -> Result<NormalizedQuote, WalletError> {
    let provider = "Yahoo Finance";
    let result = raw
        .pointer("/quoteResponse/result/0")
        .ok_or_else(|| malformed(provider, "missing quoteResponse.result[0]"))?;

    let market_state = result
        .get("marketState")
        .and_then(Value::as_str)
        .map(str::to_string);

    let regular = result.get("regularMarketPrice").and_then(Value::as_f64);
    let price = match market_state.as_deref() {
        Some("PRE") | Some("PREPRE") => result
            .get("preMarketPrice")
            .and_then(Value::as_f64)
            .or(regular),
        Some("POST") | Some("POSTPOST") => result
            .get("postMarketPrice")
            .and_then(Value::as_f64)
            .or(regular),
        _ => regular,
    }
    .ok_or_else(|| malformed(provider, "no usable price field in quote"))?;

    let currency = result
        .get("currency")
        .and_then(Value::as_str)
        .map(str::to_string);

    let display_symbol = result
        .get("symbol")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(provider, "missing symbol in quote"))?
        .to_uppercase();

    Ok(NormalizedQuote {
        price,
        market_state,
        currency,
        display_symbol,
    })
}

/// Extract a canonical quote from a CoinGecko `/coins/markets` payload
/// (a JSON array; the first element is the requested coin).
///
/// The payload does not echo the quote currency, so the caller passes the
/// vs-currency the request was made with. The symbol is uppercased for
/// display only — the registry key stays in its lowercase request form.
pub fn crypto_quote(raw: &Value, vs_currency: &str) -> Result<NormalizedQuote, WalletError> {
    let provider = "CoinGecko";
    let coin = raw
        .get(0)
        .ok_or_else(|| malformed(provider, "empty markets response"))?;

    let price = coin
        .get("current_price")
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(provider, "missing current_price"))?;

    let display_symbol = coin
        .get("symbol")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(provider, "missing symbol"))?
        .to_uppercase();

    Ok(NormalizedQuote {
        price,
        market_state: None,
        currency: Some(vs_currency.to_uppercase()),
        display_symbol,
    })
}
