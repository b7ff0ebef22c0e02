//! Account balance models.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{coerce_decimal, coerce_u64, field};

/// One spendable balance on the account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    /// Token code, e.g. `"XMD"`.
    pub currency: String,
    /// Human-scale amount.
    pub amount: Decimal,
    /// Issuing contract, when reported.
    pub contract: Option<String>,
    /// Token precision, when reported.
    pub decimals: Option<u32>,
}

/// Parses the balances endpoint's `data` array. Entries without a
/// recognizable currency are dropped with a warning; entries without an
/// amount parse as zero so the currency still shows up as known-empty.
#[must_use]
pub fn parse_balances(data: &Value) -> Vec<Balance> {
    let Some(entries) = data.as_array() else {
        warn!(raw = %data, "balances payload is not an array");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let currency = field(entry, &["currency", "symbol", "token_code", "code"])
                .and_then(Value::as_str)
                .map(str::to_uppercase);
            let Some(currency) = currency else {
                warn!(raw = %entry, "balance entry missing currency, dropped");
                return None;
            };

            let amount = field(entry, &["amount", "balance", "available"])
                .and_then(coerce_decimal)
                .unwrap_or(Decimal::ZERO);
            let contract = field(entry, &["contract", "token_contract"])
                .and_then(Value::as_str)
                .map(str::to_string);
            let decimals = field(entry, &["decimals", "precision"])
                .and_then(coerce_u64)
                .and_then(|d| u32::try_from(d).ok());

            Some(Balance {
                currency,
                amount,
                contract,
                decimals,
            })
        })
        .collect()
}

/// Finds a balance by token code, case-insensitively. A missing entry
/// means the account has never held the token.
#[must_use]
pub fn find<'a>(balances: &'a [Balance], currency: &str) -> Option<&'a Balance> {
    let wanted = currency.to_uppercase();
    balances.iter().find(|b| b.currency == wanted)
}
