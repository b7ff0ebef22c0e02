//! Crate-level error types.
//!
//! [`DexterError`] unifies every failure source in the decision pipeline
//! behind a single enum so callers can match on the variant they care
//! about while still using the `?` operator for easy propagation.
//!
//! Two variants are deliberately kept apart: [`DexterError::ChainSubmission`]
//! means the broadcast itself failed and no funds moved, while
//! [`DexterError::Unconfirmed`] means the broadcast succeeded but
//! confirmation never arrived. Only the former is safe to answer with a
//! new order.

use rust_decimal::Decimal;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DexterError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum DexterError {
    /// The requested trading pair is not on the trusted-market allow-list.
    #[error("untrusted market: {symbol} is not an allow-listed trading pair")]
    UntrustedMarket { symbol: String },

    /// A market-data endpoint failed, timed out, or returned an
    /// unusable payload. Retryable at the next scheduled cycle.
    #[error("market data error: {0}")]
    MarketData(String),

    /// Too little data survived filtering to aggregate a usable OHLCV
    /// summary (e.g., every candle in the window had a null volume).
    #[error("insufficient market data: {0}")]
    InsufficientData(String),

    /// An advisor reply did not match the order grammar. The cycle is
    /// aborted; a malformed decision is never guessed at.
    #[error("invalid decision format: {reason}: {response:?}")]
    InvalidDecisionFormat { reason: String, response: String },

    /// The decision produced an order the account cannot fund, or one
    /// below the configured minimum order size.
    #[error("insufficient balance: need {required} {currency}, have {available} {currency}")]
    InsufficientBalance {
        currency: String,
        required: Decimal,
        available: Decimal,
    },

    /// The decision's price strays too far from the current market price
    /// (stale or adversarial quote). The order is rejected outright.
    #[error(
        "price deviation: {price} is {deviation_pct}% away from market {market_price} (max {max_pct}%)"
    )]
    PriceDeviation {
        price: Decimal,
        market_price: Decimal,
        deviation_pct: Decimal,
        max_pct: Decimal,
    },

    /// A chain RPC call failed before any funds moved: a broadcast that
    /// never produced a transaction id, or a read the node refused.
    #[error("chain submission error: {0}")]
    ChainSubmission(String),

    /// The transaction was broadcast but confirmation never arrived
    /// within the retry budget. The order's final state is unknown;
    /// resubmitting would risk double execution.
    #[error("transaction {transaction_id} broadcast but unconfirmed")]
    Unconfirmed { transaction_id: String },

    /// Configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// An HTTP transport operation failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DexterError {
    /// True when the order may have reached the chain. Callers must not
    /// respond to these by submitting the order again.
    pub fn funds_at_risk(&self) -> bool {
        matches!(self, Self::Unconfirmed { .. })
    }
}
