//! Canonical domain and wire models.
//!
//! The DEX API's payload shapes drift between endpoint versions, so every
//! upstream payload lands in `serde_json::Value` first and is coerced into
//! the canonical types here (missing numerics become zero with a warning;
//! a level or row is never silently dropped).

pub mod balance;
pub mod candle;
pub mod depth;
pub mod lifecycle;
pub mod order;
pub mod snapshot;
pub mod trade;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

pub use order::{FillType, OrderIntent, OrderSide, OrderType, SerializedOrder};

/// `{ sync, data }` envelope wrapping every DEX API response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub sync: Option<i64>,
    #[serde(default)]
    pub data: Value,
}

impl ApiEnvelope {
    /// Unwraps the payload, failing when the envelope carried no data.
    ///
    /// # Errors
    ///
    /// Returns [`DexterError::MarketData`](crate::DexterError::MarketData)
    /// when `data` is absent or null.
    pub fn take_data(self, context: &str) -> crate::Result<Value> {
        if self.data.is_null() {
            return Err(crate::DexterError::MarketData(format!(
                "{context}: response envelope has no data"
            )));
        }
        Ok(self.data)
    }
}

/// Reads a decimal from a JSON number or numeric string.
pub(crate) fn coerce_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads an unsigned integer from a JSON number or numeric string.
pub(crate) fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First present, non-null field among the given fallback names.
pub(crate) fn field<'a>(obj: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(name))
        .find(|v| !v.is_null())
}
