//! Chain RPC and signing plumbing.
//!
//! [`ChainClient`] is the seam between the pipeline and the network:
//! production uses [`HttpChainClient`], tests substitute fakes. The handle
//! is stateless between calls and safe to share.

pub mod http;
pub mod types;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub use http::HttpChainClient;
pub use types::{
    Action, ActionTrace, Authorization, ProcessedTransaction, TransactOptions, TransactionRecord,
    find_ordinal_order_id,
};

/// Parameters for a `get_table_rows` contract-state read.
#[derive(Debug, Clone, Serialize)]
pub struct TableRowsRequest {
    pub code: String,
    pub scope: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<String>,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    pub json: bool,
}

/// Broadcast and read-back operations against the chain.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    /// Signs and broadcasts a transaction built from `actions`.
    ///
    /// # Errors
    ///
    /// [`crate::DexterError::ChainSubmission`] when any step before or at
    /// the broadcast fails; in that case no funds moved.
    async fn transact(
        &self,
        actions: Vec<Action>,
        options: TransactOptions,
    ) -> Result<TransactionRecord>;

    /// Fetches a transaction by id. `Ok(None)` means the history node has
    /// not indexed it yet, which is retryable.
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<TransactionRecord>>;

    /// Reads rows from a contract table.
    async fn get_table_rows(&self, request: &TableRowsRequest) -> Result<Vec<Value>>;
}
