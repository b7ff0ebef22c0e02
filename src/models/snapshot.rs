//! Combined per-pair market snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::candle::OhlcvSummary;
use crate::models::depth::OrderBookDepth;
use crate::models::trade::RecentTrade;

/// Everything one decision cycle knows about a market, assembled from the
/// depth, trades, and OHLCV endpoints in a single gateway call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub pair: String,
    /// Reference price for the cycle: book midpoint when both sides of the
    /// book exist, otherwise the window's closing price.
    pub price: Decimal,
    pub price_change_pct: Decimal,
    /// Total volume across the window's candles, in base units.
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
    pub depth: OrderBookDepth,
    /// Most recent public trades, newest first. May be empty on quiet
    /// markets.
    pub trades: Vec<RecentTrade>,
    pub ohlcv: OhlcvSummary,
}
