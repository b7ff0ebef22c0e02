//! Confirmation polling and post-placement order tracking.
//!
//! Once a transaction is broadcast it cannot be retracted, so everything
//! here only reads: poll history until the transaction shows up in a
//! block, dig the order's correlation id out of the action traces, and
//! ask the indexer for fill state. Budget exhaustion surfaces as
//! [`DexterError::Unconfirmed`], which callers must treat as "state
//! unknown", never as permission to resubmit.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::chain::{ChainClient, TransactionRecord, find_ordinal_order_id};
use crate::error::{DexterError, Result};
use crate::marketdata::MarketDataGateway;
use crate::models::lifecycle::OrderLifecycle;
use crate::retry::{Attempt, RetryPolicy, poll_until};

const CONFIRM_ATTEMPTS: u32 = 8;
const CONFIRM_DELAY: Duration = Duration::from_millis(1500);

/// Everything learned about an order once its transaction confirmed.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pub transaction_id: String,
    pub block_num: Option<u64>,
    /// Correlation id from the DEX contract's inline trace, when present.
    pub ordinal_order_id: Option<u64>,
    /// Fill state, when the indexer has already caught up.
    pub lifecycle: Option<OrderLifecycle>,
}

/// Watches broadcast transactions through to confirmation.
pub struct ConfirmationTracker<C> {
    chain: C,
    gateway: MarketDataGateway,
    policy: RetryPolicy,
}

impl<C: ChainClient> ConfirmationTracker<C> {
    pub fn new(chain: C, gateway: MarketDataGateway) -> Self {
        let policy = RetryPolicy::fixed(CONFIRM_ATTEMPTS, CONFIRM_DELAY);
        Self::with_policy(chain, gateway, policy)
    }

    /// Tracker with a custom polling budget.
    pub fn with_policy(chain: C, gateway: MarketDataGateway, policy: RetryPolicy) -> Self {
        Self {
            chain,
            gateway,
            policy,
        }
    }

    /// Confirms a broadcast transaction and reads back what it placed.
    ///
    /// The correlation id lives on an inline trace of the `placeorder`
    /// action and may be absent (undecoded data, contract changes); that
    /// only disables lifecycle tracking, the placement itself stands.
    ///
    /// # Errors
    ///
    /// [`DexterError::Unconfirmed`] when the polling budget runs out
    /// before the transaction appears in a block.
    pub async fn track(&self, transaction_id: &str) -> Result<OrderPlacement> {
        let record = self.confirm(transaction_id).await?;

        let traces = record
            .processed
            .as_ref()
            .map_or(&[][..], |p| p.action_traces.as_slice());
        let ordinal_order_id = find_ordinal_order_id(traces);
        if ordinal_order_id.is_none() {
            warn!(
                %transaction_id,
                "no ordinal_order_id in action traces, lifecycle tracking disabled"
            );
        }

        let lifecycle = match ordinal_order_id {
            Some(ordinal) => self.fetch_lifecycle(ordinal).await,
            None => None,
        };

        Ok(OrderPlacement {
            transaction_id: record.transaction_id,
            block_num: record.processed.as_ref().and_then(|p| p.block_num),
            ordinal_order_id,
            lifecycle,
        })
    }

    /// Polls history until the transaction carries block-inclusion info.
    ///
    /// # Errors
    ///
    /// [`DexterError::Unconfirmed`] on budget exhaustion; transport
    /// errors propagate as-is.
    pub async fn confirm(&self, transaction_id: &str) -> Result<TransactionRecord> {
        let confirmed = poll_until(&self.policy, "transaction confirmation", |_| async move {
            match self.chain.get_transaction(transaction_id).await? {
                Some(record) if record.processed.is_some() => Ok(Attempt::Ready(record)),
                Some(_) => Ok(Attempt::Retry("known but not in a block yet".to_string())),
                None => Ok(Attempt::Retry("not visible in history yet".to_string())),
            }
        })
        .await?;

        match confirmed {
            Some(record) => {
                info!(
                    %transaction_id,
                    block_num = ?record.processed.as_ref().and_then(|p| p.block_num),
                    "transaction confirmed"
                );
                Ok(record)
            }
            None => Err(DexterError::Unconfirmed {
                transaction_id: transaction_id.to_string(),
            }),
        }
    }

    /// Best-effort lifecycle lookup. The indexer may lag the chain, so
    /// "not there yet" and transport failures both come back as `None`.
    async fn fetch_lifecycle(&self, ordinal_order_id: u64) -> Option<OrderLifecycle> {
        match self.gateway.order_lifecycle(ordinal_order_id).await {
            Ok(Some(lifecycle)) => {
                info!(
                    ordinal_order_id,
                    status = %lifecycle.status,
                    fills = lifecycle.fill_count,
                    "order lifecycle"
                );
                Some(lifecycle)
            }
            Ok(None) => {
                debug!(ordinal_order_id, "order not indexed yet");
                None
            }
            Err(e) => {
                warn!(ordinal_order_id, error = %e, "lifecycle lookup failed");
                None
            }
        }
    }
}
