//! Shared test doubles for pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use dexter::Result;
use dexter::chain::{Action, ChainClient, TableRowsRequest, TransactOptions, TransactionRecord};
use dexter::decision::advisor::Advisor;

/// Advisor double that always answers with a canned reply.
pub struct FakeAdvisor {
    reply: String,
}

impl FakeAdvisor {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

impl Advisor for FakeAdvisor {
    async fn advise(&self, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Chain double that records submissions and replays scripted history
/// lookups. Clones share state, mirroring how the agent hands the chain
/// handle to the submitter and the tracker.
#[derive(Clone, Default)]
pub struct FakeChainClient {
    state: Arc<Mutex<FakeChainState>>,
}

#[derive(Default)]
struct FakeChainState {
    submissions: Vec<Vec<Action>>,
    history: VecDeque<Option<TransactionRecord>>,
    open_orders: Vec<Value>,
}

impl FakeChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next `get_transaction` answer; an exhausted queue keeps
    /// answering "not indexed yet".
    pub fn queue_history(&self, response: Option<TransactionRecord>) {
        self.lock().history.push_back(response);
    }

    pub fn set_open_orders(&self, rows: Vec<Value>) {
        self.lock().open_orders = rows;
    }

    /// Every transaction broadcast so far, in submission order.
    pub fn submissions(&self) -> Vec<Vec<Action>> {
        self.lock().submissions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeChainState> {
        self.state.lock().expect("Failed to lock fake chain state")
    }
}

impl ChainClient for FakeChainClient {
    async fn transact(
        &self,
        actions: Vec<Action>,
        _options: TransactOptions,
    ) -> Result<TransactionRecord> {
        let mut state = self.lock();
        state.submissions.push(actions);
        let n = state.submissions.len();
        let record = serde_json::from_value(json!({ "transaction_id": format!("txn-{n}") }))
            .expect("Failed to build fake transaction record");
        Ok(record)
    }

    async fn get_transaction(&self, _transaction_id: &str) -> Result<Option<TransactionRecord>> {
        Ok(self.lock().history.pop_front().flatten())
    }

    async fn get_table_rows(&self, _request: &TableRowsRequest) -> Result<Vec<Value>> {
        Ok(self.lock().open_orders.clone())
    }
}

/// A confirmed transaction record whose traces carry the DEX-assigned
/// ordinal on a nested inline action, shaped like a real `placeorder`
/// broadcast.
pub fn confirmed_record(transaction_id: &str, ordinal_order_id: u64) -> TransactionRecord {
    serde_json::from_value(json!({
        "transaction_id": transaction_id,
        "processed": {
            "block_num": 186524133,
            "action_traces": [
                {
                    "act": {
                        "account": "xmd.token",
                        "name": "transfer",
                        "data": { "from": "alice", "to": "dex" }
                    },
                    "inline_traces": []
                },
                {
                    "act": {
                        "account": "dex",
                        "name": "placeorder",
                        "data": { "market_id": 1 }
                    },
                    "inline_traces": [
                        {
                            "act": {
                                "account": "dex",
                                "name": "processorder",
                                "data": { "ordinal_order_id": ordinal_order_id, "market_id": 1 }
                            },
                            "inline_traces": []
                        }
                    ]
                }
            ]
        }
    }))
    .expect("Failed to build confirmed transaction record")
}
