//! Recent-trade models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::models::{coerce_decimal, coerce_u64, field};

/// One public trade from the recent-trades endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentTrade {
    pub price: Decimal,
    pub quantity: Decimal,
    /// Taker side as reported, lowercased (`"buy"` / `"sell"`); empty when
    /// the API omits it.
    pub side: String,
    pub time: Option<DateTime<Utc>>,
}

impl RecentTrade {
    /// Parses a raw trade object. Returns `None` when price or quantity is
    /// missing or unparseable.
    #[must_use]
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let price = field(raw, &["price", "p"]).and_then(coerce_decimal)?;
        let quantity = field(raw, &["quantity", "qty", "size", "amount"]).and_then(coerce_decimal)?;
        let side = field(raw, &["side", "order_side", "taker_side"])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        let time = field(raw, &["time", "t", "timestamp", "block_time"])
            .and_then(coerce_u64)
            .and_then(|ms| {
                let ms = i64::try_from(ms).ok()?;
                DateTime::from_timestamp_millis(ms)
            });

        Some(Self {
            price,
            quantity,
            side,
            time,
        })
    }

    /// Notional value in quote units.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn parses_typical_trade() {
        let raw = json!({
            "price": "0.0512",
            "quantity": "2500",
            "side": "BUY",
            "time": 1735689600000u64,
        });
        let trade = RecentTrade::from_raw(&raw).unwrap();

        assert_eq!(trade.price, dec!(0.0512));
        assert_eq!(trade.quantity, dec!(2500));
        assert_eq!(trade.side, "buy");
        assert!(trade.time.is_some());
        assert_eq!(trade.notional(), dec!(128.0000));
    }

    #[test]
    fn tolerates_missing_side_and_time() {
        let raw = json!({"p": 0.05, "size": 100});
        let trade = RecentTrade::from_raw(&raw).unwrap();

        assert_eq!(trade.side, "");
        assert!(trade.time.is_none());
    }

    #[test]
    fn missing_price_drops_trade() {
        let raw = json!({"quantity": "100", "side": "sell"});
        assert!(RecentTrade::from_raw(&raw).is_none());
    }
}
