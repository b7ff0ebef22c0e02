//! HTTP chain client: node RPC plus a local wallet daemon for signing.
//!
//! Key material never enters this process. The transaction is assembled
//! here (TAPOS header from a recent reference block, action payloads
//! serialized by the node's `abi_json_to_bin`), signed by the wallet
//! daemon, and pushed back through the node.

use std::time::Duration;

use chrono::NaiveDateTime;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{DexterError, Result};

use super::types::{Action, ActionTrace, ProcessedTransaction, TransactOptions, TransactionRecord};
use super::{ChainClient, TableRowsRequest};

const CHAIN_TIMEOUT: Duration = Duration::from_secs(10);
/// Node error bodies are clipped to this many characters in error text.
const ERROR_BODY_LIMIT: usize = 300;

/// Block timestamps and expirations on the wire, e.g. `2026-08-21T12:34:56.500`.
const CHAIN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Chain client over a node RPC endpoint and a keosd-compatible wallet
/// daemon. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct HttpChainClient {
    client: reqwest::Client,
    chain_url: String,
    wallet_url: String,
}

impl HttpChainClient {
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(chain_url: impl Into<String>, wallet_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(CHAIN_TIMEOUT).build()?;
        Ok(Self {
            client,
            chain_url: chain_url.into().trim_end_matches('/').to_string(),
            wallet_url: wallet_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, base: &str, path: &str, body: &Value, context: &str) -> Result<Value> {
        let url = format!("{base}{path}");
        debug!(%url, context, "chain rpc request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DexterError::ChainSubmission(format!("{context}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let clipped: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(DexterError::ChainSubmission(format!(
                "{context}: HTTP {status}: {clipped}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DexterError::ChainSubmission(format!("{context}: invalid body: {e}")))
    }

    async fn chain_post(&self, path: &str, body: &Value, context: &str) -> Result<Value> {
        self.post(&self.chain_url, path, body, context).await
    }

    async fn wallet_post(&self, path: &str, body: &Value, context: &str) -> Result<Value> {
        self.post(&self.wallet_url, path, body, context).await
    }
}

impl ChainClient for HttpChainClient {
    async fn transact(
        &self,
        actions: Vec<Action>,
        options: TransactOptions,
    ) -> Result<TransactionRecord> {
        let info = self
            .chain_post("/v1/chain/get_info", &json!({}), "get_info")
            .await?;
        let chain_id = required_str(&info, "chain_id", "get_info")?;
        let head_block_num = required_u64(&info, "head_block_num", "get_info")?;

        // TAPOS: anchor the transaction to a block slightly behind head so
        // every node has already seen it.
        let anchor = head_block_num.saturating_sub(u64::from(options.blocks_behind));
        let block = self
            .chain_post(
                "/v1/chain/get_block",
                &json!({"block_num_or_id": anchor}),
                "get_block",
            )
            .await?;
        let block_num = required_u64(&block, "block_num", "get_block")?;
        let ref_block_prefix = required_u64(&block, "ref_block_prefix", "get_block")?;
        let block_time = required_str(&block, "timestamp", "get_block")?;
        let expiration = expiry_after(block_time, options.expire_seconds)?;

        let mut packed_actions = Vec::with_capacity(actions.len());
        for action in &actions {
            let bin = self
                .chain_post(
                    "/v1/chain/abi_json_to_bin",
                    &json!({
                        "code": action.account,
                        "action": action.name,
                        "args": action.data,
                    }),
                    "abi_json_to_bin",
                )
                .await?;
            let binargs = required_str(&bin, "binargs", "abi_json_to_bin")?;
            packed_actions.push(json!({
                "account": action.account,
                "name": action.name,
                "authorization": action.authorization,
                "data": binargs,
            }));
        }

        let transaction = json!({
            "expiration": expiration,
            "ref_block_num": block_num & 0xffff,
            "ref_block_prefix": ref_block_prefix,
            "max_net_usage_words": 0,
            "max_cpu_usage_ms": 0,
            "delay_sec": 0,
            "context_free_actions": [],
            "actions": packed_actions,
            "transaction_extensions": [],
        });

        let available_keys = self
            .wallet_post("/v1/wallet/get_public_keys", &json!([]), "get_public_keys")
            .await?;
        let required = self
            .chain_post(
                "/v1/chain/get_required_keys",
                &json!({
                    "transaction": transaction,
                    "available_keys": available_keys,
                }),
                "get_required_keys",
            )
            .await?;
        let required_keys = required
            .get("required_keys")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        let signed = self
            .wallet_post(
                "/v1/wallet/sign_transaction",
                &json!([transaction, required_keys, chain_id]),
                "sign_transaction",
            )
            .await?;
        let signatures = signed.get("signatures").cloned().ok_or_else(|| {
            DexterError::ChainSubmission("sign_transaction: wallet returned no signatures".into())
        })?;

        let pushed = self
            .chain_post(
                "/v1/chain/push_transaction",
                &json!({
                    "signatures": signatures,
                    "compression": "none",
                    "packed_context_free_data": "",
                    "transaction": transaction,
                }),
                "push_transaction",
            )
            .await?;

        // A push without a transaction id is a failure no matter what the
        // status code said.
        let transaction_id = pushed
            .get("transaction_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DexterError::ChainSubmission(
                    "push_transaction: accepted but no transaction id returned".into(),
                )
            })?
            .to_string();

        let processed = match pushed.get("processed") {
            Some(p) if !p.is_null() => serde_json::from_value(p.clone()).ok(),
            _ => None,
        };

        info!(%transaction_id, actions = actions.len(), "transaction broadcast");
        Ok(TransactionRecord {
            transaction_id,
            processed,
        })
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        let url = format!("{}/v1/history/get_transaction", self.chain_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({"id": transaction_id}))
            .send()
            .await?;

        // History nodes answer 404 or 500 for transactions they have not
        // indexed yet; either way it is only "not visible", not an error.
        let status = response.status();
        if !status.is_success() {
            debug!(%transaction_id, %status, "transaction not visible in history yet");
            return Ok(None);
        }

        let payload: Value = response.json().await?;
        let block_num = payload.get("block_num").and_then(Value::as_u64);
        let action_traces = match payload.get("traces") {
            Some(traces) if !traces.is_null() => {
                match serde_json::from_value::<Vec<ActionTrace>>(traces.clone()) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(%transaction_id, error = %e, "unparseable traces, returning none");
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        let processed = block_num.map(|bn| ProcessedTransaction {
            block_num: Some(bn),
            action_traces,
        });
        Ok(Some(TransactionRecord {
            transaction_id: transaction_id.to_string(),
            processed,
        }))
    }

    async fn get_table_rows(&self, request: &TableRowsRequest) -> Result<Vec<Value>> {
        let payload = self
            .chain_post(
                "/v1/chain/get_table_rows",
                &serde_json::to_value(request)?,
                "get_table_rows",
            )
            .await?;
        Ok(payload
            .get("rows")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

fn required_str<'a>(payload: &'a Value, field: &str, context: &str) -> Result<&'a str> {
    payload.get(field).and_then(Value::as_str).ok_or_else(|| {
        DexterError::ChainSubmission(format!("{context}: response missing {field}"))
    })
}

fn required_u64(payload: &Value, field: &str, context: &str) -> Result<u64> {
    payload.get(field).and_then(Value::as_u64).ok_or_else(|| {
        DexterError::ChainSubmission(format!("{context}: response missing {field}"))
    })
}

/// Computes the expiration timestamp `expire_seconds` after a chain block
/// time, formatted the way the chain expects.
fn expiry_after(block_time: &str, expire_seconds: u32) -> Result<String> {
    let parsed = NaiveDateTime::parse_from_str(block_time, CHAIN_TIME_FORMAT).map_err(|e| {
        DexterError::ChainSubmission(format!("unparseable block timestamp {block_time:?}: {e}"))
    })?;
    let expiry = parsed + chrono::Duration::seconds(i64::from(expire_seconds));
    Ok(expiry.format(EXPIRY_FORMAT).to_string())
}
