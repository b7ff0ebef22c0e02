//! Chain transaction and trace types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Actor/permission pair authorizing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub actor: String,
    pub permission: String,
}

/// One contract action within a transaction. `data` stays contract-native
/// JSON; the chain API serializes it to binary before signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Contract account, e.g. `"dex"` or `"xmd.token"`.
    pub account: String,
    /// Action name, e.g. `"placeorder"` or `"transfer"`.
    pub name: String,
    pub authorization: Vec<Authorization>,
    pub data: Value,
}

impl Action {
    #[must_use]
    pub fn new(account: &str, name: &str, actor: &str, permission: &str, data: Value) -> Self {
        Self {
            account: account.to_string(),
            name: name.to_string(),
            authorization: vec![Authorization {
                actor: actor.to_string(),
                permission: permission.to_string(),
            }],
            data,
        }
    }
}

/// Options controlling transaction header construction (TAPOS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactOptions {
    /// How far behind head the reference block sits.
    pub blocks_behind: u16,
    /// Expiry window from the reference block time, in seconds.
    pub expire_seconds: u32,
}

impl Default for TransactOptions {
    fn default() -> Self {
        Self {
            blocks_behind: 3,
            expire_seconds: 30,
        }
    }
}

/// A pushed or fetched transaction. `processed` is absent until the
/// transaction has made it into a block.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    #[serde(default)]
    pub processed: Option<ProcessedTransaction>,
}

/// Block-inclusion details of a processed transaction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessedTransaction {
    #[serde(default)]
    pub block_num: Option<u64>,
    #[serde(default)]
    pub action_traces: Vec<ActionTrace>,
}

/// Node in the action-trace tree. Contract notifications and inline
/// actions nest arbitrarily deep under `inline_traces`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionTrace {
    pub act: TraceAct,
    #[serde(default)]
    pub inline_traces: Vec<ActionTrace>,
}

/// The action recorded by a trace node. `data` is decoded JSON when the
/// node knows the ABI and a hex string otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceAct {
    pub account: String,
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

/// Depth-first search over a trace tree for the first
/// `ordinal_order_id` payload field.
///
/// The field sits on an inline trace emitted by the DEX contract, not on
/// the top-level action, and it may be absent at any depth (undecoded
/// data, contract changes). `None` simply means no id was found.
#[must_use]
pub fn find_ordinal_order_id(traces: &[ActionTrace]) -> Option<u64> {
    for trace in traces {
        if let Some(id) = ordinal_from(&trace.act.data) {
            return Some(id);
        }
        if let Some(id) = find_ordinal_order_id(&trace.inline_traces) {
            return Some(id);
        }
    }
    None
}

fn ordinal_from(data: &Value) -> Option<u64> {
    match data.get("ordinal_order_id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn traces_from(value: Value) -> Vec<ActionTrace> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn finds_ordinal_on_nested_inline_trace() {
        let traces = traces_from(json!([
            {
                "act": {"account": "xmd.token", "name": "transfer", "data": {"from": "alice", "to": "dex"}},
                "inline_traces": []
            },
            {
                "act": {"account": "dex", "name": "placeorder", "data": {"market_id": 1}},
                "inline_traces": [
                    {
                        "act": {"account": "dex", "name": "placeorder", "data": {}},
                        "inline_traces": [
                            {
                                "act": {
                                    "account": "dex",
                                    "name": "logorder",
                                    "data": {"ordinal_order_id": 987654, "market_id": 1}
                                },
                                "inline_traces": []
                            }
                        ]
                    }
                ]
            }
        ]));

        assert_eq!(find_ordinal_order_id(&traces), Some(987654));
    }

    #[test]
    fn first_trace_without_inline_traces_does_not_panic() {
        // The transfer trace has no inline_traces key at all.
        let traces = traces_from(json!([
            {"act": {"account": "xmd.token", "name": "transfer", "data": "deadbeef"}},
            {
                "act": {"account": "dex", "name": "placeorder", "data": {}},
                "inline_traces": [
                    {"act": {"account": "dex", "name": "logorder", "data": {"ordinal_order_id": "42"}}}
                ]
            }
        ]));

        assert_eq!(find_ordinal_order_id(&traces), Some(42));
    }

    #[test]
    fn absent_ordinal_yields_none() {
        let traces = traces_from(json!([
            {
                "act": {"account": "dex", "name": "placeorder", "data": {"market_id": 1}},
                "inline_traces": [
                    {"act": {"account": "dex", "name": "logorder", "data": "0011aabb"}}
                ]
            }
        ]));

        assert_eq!(find_ordinal_order_id(&traces), None);
        assert_eq!(find_ordinal_order_id(&[]), None);
    }

    #[test]
    fn non_numeric_ordinal_is_ignored() {
        let traces = traces_from(json!([
            {"act": {"account": "dex", "name": "logorder", "data": {"ordinal_order_id": true}}}
        ]));
        assert_eq!(find_ordinal_order_id(&traces), None);
    }

    #[test]
    fn transaction_record_tolerates_missing_processed() {
        let record: TransactionRecord =
            serde_json::from_value(json!({"transaction_id": "abc123"})).unwrap();
        assert!(record.processed.is_none());
    }

    #[test]
    fn default_transact_options() {
        let options = TransactOptions::default();
        assert_eq!(options.blocks_behind, 3);
        assert_eq!(options.expire_seconds, 30);
    }
}
