//! Post-placement order lifecycle models.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::models::{coerce_decimal, field};

/// Lifecycle view of a placed order, read back from the DEX API by its
/// ordinal id. All fields beyond the ordinal are best-effort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLifecycle {
    pub ordinal_order_id: u64,
    /// Status string as reported (`"open"`, `"filled"`, `"cancelled"`, ...).
    pub status: String,
    pub filled_quantity: Option<Decimal>,
    pub remaining_quantity: Option<Decimal>,
    pub average_price: Option<Decimal>,
    pub fill_count: usize,
}

impl OrderLifecycle {
    /// Parses the lifecycle endpoint's `data` payload for the given
    /// ordinal. Returns `None` when the payload carries no status, which
    /// the tracker treats as "not yet visible".
    #[must_use]
    pub fn from_raw(ordinal_order_id: u64, data: &Value) -> Option<Self> {
        let status = field(data, &["status", "state", "order_status"])
            .and_then(Value::as_str)?
            .to_lowercase();

        let filled_quantity =
            field(data, &["filled_quantity", "filled", "executed_quantity"]).and_then(coerce_decimal);
        let remaining_quantity =
            field(data, &["remaining_quantity", "remaining", "open_quantity"]).and_then(coerce_decimal);
        let average_price =
            field(data, &["average_price", "avg_price", "fill_price"]).and_then(coerce_decimal);
        let fill_count = field(data, &["fills", "trades"])
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        Some(Self {
            ordinal_order_id,
            status,
            filled_quantity,
            remaining_quantity,
            average_price,
            fill_count,
        })
    }

    /// Whether the order has reached a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "filled" | "cancelled" | "canceled" | "rejected")
    }
}
