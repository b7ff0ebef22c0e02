//! Order book depth snapshot.
//!
//! The depth endpoint's field names have drifted across API versions, so
//! levels are normalized from raw JSON with per-field fallbacks. A level
//! with an unparseable numeric is coerced to zero and kept rather than
//! dropped, so the book shape stays visible to the signal stage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{coerce_decimal, coerce_u64, field};

/// A single price level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub size: Decimal,
    /// Number of resting orders at this level, when the API reports it.
    pub count: Option<u32>,
}

/// Normalized two-sided book: bids descending, asks ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookDepth {
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    pub timestamp: DateTime<Utc>,
}

impl OrderBookDepth {
    /// Builds a depth snapshot from the raw `data` payload.
    ///
    /// Accepts `{"bids": [...], "asks": [...]}` with levels as objects.
    /// Missing sides normalize to empty.
    #[must_use]
    pub fn from_raw(data: &Value) -> Self {
        let mut bids = parse_side(data.get("bids"), "bids");
        let mut asks = parse_side(data.get("asks"), "asks");

        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));

        Self {
            bids,
            asks,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<&OrderBookLevel> {
        self.bids.first()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<&OrderBookLevel> {
        self.asks.first()
    }

    /// Relative spread `(ask - bid) / ask`. `None` when either side is
    /// empty or the best ask is zero.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        if ask.is_zero() {
            return None;
        }
        Some((ask - bid) / ask)
    }

    /// Midpoint of the best bid and ask.
    #[must_use]
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some((bid + ask) / Decimal::TWO)
    }

    /// Size imbalance over the top `levels` of each side, in `[-1, 1]`.
    /// Positive values mean bid-heavy. `None` when both sides are empty
    /// or total size is zero.
    #[must_use]
    pub fn imbalance(&self, levels: usize) -> Option<Decimal> {
        let bid_size: Decimal = self.bids.iter().take(levels).map(|l| l.size).sum();
        let ask_size: Decimal = self.asks.iter().take(levels).map(|l| l.size).sum();
        let total = bid_size + ask_size;
        if total.is_zero() {
            return None;
        }
        Some((bid_size - ask_size) / total)
    }
}

fn parse_side(side: Option<&Value>, label: &str) -> Vec<OrderBookLevel> {
    let Some(levels) = side.and_then(Value::as_array) else {
        return Vec::new();
    };

    levels
        .iter()
        .map(|level| {
            let price = field(level, &["price", "level"])
                .and_then(coerce_decimal)
                .unwrap_or_else(|| {
                    warn!(side = label, raw = %level, "depth level missing price, coercing to 0");
                    Decimal::ZERO
                });
            let size = field(level, &["size", "quantity", "qty"])
                .and_then(coerce_decimal)
                .unwrap_or_else(|| {
                    warn!(side = label, raw = %level, "depth level missing size, coercing to 0");
                    Decimal::ZERO
                });
            let count = field(level, &["count"])
                .and_then(coerce_u64)
                .and_then(|c| u32::try_from(c).ok());

            OrderBookLevel {
                price,
                size: size.max(Decimal::ZERO),
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn sorts_bids_descending_and_asks_ascending() {
        let raw = json!({
            "bids": [
                {"price": "0.048", "size": "100"},
                {"price": "0.049", "size": "200"},
            ],
            "asks": [
                {"price": "0.052", "size": "50"},
                {"price": "0.051", "size": "75"},
            ],
        });
        let depth = OrderBookDepth::from_raw(&raw);

        assert_eq!(depth.best_bid().unwrap().price, dec!(0.049));
        assert_eq!(depth.best_ask().unwrap().price, dec!(0.051));
    }

    #[test]
    fn accepts_alternate_field_names() {
        let raw = json!({
            "bids": [{"level": 0.05, "qty": 100, "count": 3}],
            "asks": [{"price": "0.06", "quantity": "40"}],
        });
        let depth = OrderBookDepth::from_raw(&raw);

        assert_eq!(depth.bids[0].price, dec!(0.05));
        assert_eq!(depth.bids[0].size, dec!(100));
        assert_eq!(depth.bids[0].count, Some(3));
        assert_eq!(depth.asks[0].size, dec!(40));
        assert_eq!(depth.asks[0].count, None);
    }

    #[test]
    fn malformed_level_coerces_to_zero_but_survives() {
        let raw = json!({
            "bids": [{"price": "not-a-number", "size": null}],
            "asks": [],
        });
        let depth = OrderBookDepth::from_raw(&raw);

        assert_eq!(depth.bids.len(), 1);
        assert_eq!(depth.bids[0].price, Decimal::ZERO);
        assert_eq!(depth.bids[0].size, Decimal::ZERO);
    }

    #[test]
    fn negative_size_clamps_to_zero() {
        let raw = json!({
            "bids": [{"price": "0.05", "size": "-10"}],
            "asks": [],
        });
        let depth = OrderBookDepth::from_raw(&raw);
        assert_eq!(depth.bids[0].size, Decimal::ZERO);
    }

    #[test]
    fn spread_and_mid() {
        let raw = json!({
            "bids": [{"price": "0.049", "size": "1"}],
            "asks": [{"price": "0.051", "size": "1"}],
        });
        let depth = OrderBookDepth::from_raw(&raw);

        let spread = depth.spread().unwrap();
        assert!(spread > dec!(0.039) && spread < dec!(0.040));
        assert_eq!(depth.mid_price().unwrap(), dec!(0.050));
    }

    #[test]
    fn empty_book_yields_no_derived_stats() {
        let depth = OrderBookDepth::from_raw(&json!({}));
        assert!(depth.bids.is_empty());
        assert!(depth.asks.is_empty());
        assert!(depth.spread().is_none());
        assert!(depth.mid_price().is_none());
        assert!(depth.imbalance(10).is_none());
    }

    #[test]
    fn imbalance_is_bid_heavy_positive() {
        let raw = json!({
            "bids": [{"price": "0.049", "size": "300"}],
            "asks": [{"price": "0.051", "size": "100"}],
        });
        let depth = OrderBookDepth::from_raw(&raw);
        assert_eq!(depth.imbalance(10).unwrap(), dec!(0.5));
    }
}
