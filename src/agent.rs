//! Decision-cycle orchestration.
//!
//! One cycle per pair: guard against stacked cycles and resting orders,
//! snapshot the market, decide, validate against fresh balances, submit,
//! confirm. Gateway and decision failures abort before any funds move.
//! Once the transaction is broadcast, every downstream failure is
//! reported as an unconfirmed placement and never answered by
//! resubmitting the order.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::chain::{ChainClient, TableRowsRequest};
use crate::decision::advisor::Advisor;
use crate::decision::{Decision, DecisionAdapter, SkipReason};
use crate::error::{DexterError, Result};
use crate::marketdata::MarketDataGateway;
use crate::markets::Market;
use crate::retry::RetryPolicy;
use crate::risk::RiskEngine;
use crate::submit::OrderSubmitter;
use crate::tracker::{ConfirmationTracker, OrderPlacement};

/// Rows fetched per open-order guard query.
const OPEN_ORDERS_FETCH_LIMIT: u32 = 100;

/// Outcome of one decision cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The cycle deliberately placed no order.
    Skipped(SkipReason),
    /// An order was placed and its transaction confirmed.
    Placed(OrderPlacement),
    /// The transaction was broadcast but never confirmed within the
    /// polling budget. Final state unknown; the operator must check the
    /// pair before assuming anything.
    Unconfirmed { transaction_id: String },
}

/// The full pipeline wired around one trading account.
pub struct TradingAgent<C, A> {
    gateway: MarketDataGateway,
    risk: RiskEngine,
    decision: DecisionAdapter<A>,
    submitter: OrderSubmitter<C>,
    tracker: ConfirmationTracker<C>,
    chain: C,
    account: String,
    /// At most one in-flight cycle per pair.
    cycle_locks: HashMap<String, Mutex<()>>,
}

impl<C, A> TradingAgent<C, A>
where
    C: ChainClient + Clone,
    A: Advisor,
{
    pub fn new(
        gateway: MarketDataGateway,
        risk: RiskEngine,
        decision: DecisionAdapter<A>,
        chain: C,
        account: impl Into<String>,
    ) -> Self {
        let account = account.into();
        let submitter = OrderSubmitter::new(chain.clone(), account.clone());
        let tracker = ConfirmationTracker::new(chain.clone(), gateway.clone());
        let cycle_locks = gateway
            .registry()
            .symbols()
            .map(|s| (s.to_string(), Mutex::new(())))
            .collect();
        Self {
            gateway,
            risk,
            decision,
            submitter,
            tracker,
            chain,
            account,
            cycle_locks,
        }
    }

    /// Replaces the confirmation polling budget (fast test nets).
    #[must_use]
    pub fn with_confirmation_policy(mut self, policy: RetryPolicy) -> Self {
        self.tracker = ConfirmationTracker::with_policy(
            self.chain.clone(),
            self.gateway.clone(),
            policy,
        );
        self
    }

    /// Runs one decision cycle for a pair.
    ///
    /// # Errors
    ///
    /// Everything that fails before broadcast propagates: untrusted pair,
    /// market-data and decision failures, risk rejections, submission
    /// errors. Post-broadcast failures do not; they come back as
    /// [`CycleOutcome::Unconfirmed`].
    pub async fn run_cycle(&self, pair: &str) -> Result<CycleOutcome> {
        let Some(lock) = self.cycle_locks.get(pair) else {
            return Err(DexterError::UntrustedMarket {
                symbol: pair.to_string(),
            });
        };
        let Ok(_guard) = lock.try_lock() else {
            info!(pair, "previous cycle still in flight, skipping");
            return Ok(CycleOutcome::Skipped(SkipReason::CycleInProgress));
        };

        let market = self.gateway.registry().resolve(pair)?.clone();

        let limits = self.risk.config().limits_for(pair);
        let open = self.open_order_count(&market).await?;
        if open >= limits.max_open_orders {
            info!(
                pair,
                open,
                max = limits.max_open_orders,
                "open-order cap reached, skipping"
            );
            return Ok(CycleOutcome::Skipped(SkipReason::OpenOrders {
                count: open,
                max: limits.max_open_orders,
            }));
        }

        let snapshot = self.gateway.market_snapshot(pair).await?;
        let intent = match self.decision.decide(&snapshot, self.risk.config()).await? {
            Decision::Skip(reason) => return Ok(CycleOutcome::Skipped(reason)),
            Decision::Trade(intent) => intent,
        };

        // Balances are fetched fresh each cycle; a stale balance would
        // undermine the percentage caps.
        let balances = self.gateway.account_balances(&self.account).await?;
        let validated = self
            .risk
            .validate_and_clamp(&market, &intent, &balances, snapshot.price)?;

        let record = self.submitter.submit(&validated, &market).await?;

        match self.tracker.track(&record.transaction_id).await {
            Ok(placement) => Ok(CycleOutcome::Placed(placement)),
            Err(DexterError::Unconfirmed { transaction_id }) => {
                warn!(pair, %transaction_id, "order broadcast but unconfirmed");
                Ok(CycleOutcome::Unconfirmed { transaction_id })
            }
            Err(e) => {
                // Confirmation polling died on transport; the order state
                // is exactly as unknown as a timed-out poll.
                warn!(
                    pair,
                    transaction_id = %record.transaction_id,
                    error = %e,
                    "confirmation aborted, treating as unconfirmed"
                );
                Ok(CycleOutcome::Unconfirmed {
                    transaction_id: record.transaction_id,
                })
            }
        }
    }

    /// Drives cycles for all pairs on a fixed interval until ctrl-c.
    pub async fn run(&self, pairs: &[String], cycle_secs: u64) {
        info!(?pairs, cycle_secs, account = %self.account, "agent started");
        let mut interval = tokio::time::interval(Duration::from_secs(cycle_secs));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for pair in pairs {
                        self.run_pair(pair).await;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    return;
                }
            }
        }
    }

    /// One cycle with outcome logging; per-cycle errors never stop the loop.
    async fn run_pair(&self, pair: &str) {
        match self.run_cycle(pair).await {
            Ok(CycleOutcome::Skipped(reason)) => {
                info!(pair, %reason, "cycle skipped");
            }
            Ok(CycleOutcome::Placed(placement)) => {
                info!(
                    pair,
                    transaction_id = %placement.transaction_id,
                    block_num = ?placement.block_num,
                    ordinal_order_id = ?placement.ordinal_order_id,
                    "order placed"
                );
            }
            Ok(CycleOutcome::Unconfirmed { transaction_id }) => {
                warn!(pair, %transaction_id, "order state unknown, check before trading again");
            }
            Err(e) => {
                error!(pair, error = %e, funds_at_risk = e.funds_at_risk(), "cycle failed");
            }
        }
    }

    /// Counts this account's resting orders on one market.
    async fn open_order_count(&self, market: &Market) -> Result<u32> {
        let request = TableRowsRequest {
            code: "dex".to_string(),
            scope: "dex".to_string(),
            table: "orders".to_string(),
            lower_bound: Some(self.account.clone()),
            upper_bound: Some(self.account.clone()),
            limit: OPEN_ORDERS_FETCH_LIMIT,
            index_position: Some(2),
            key_type: Some("name".to_string()),
            json: true,
        };
        let rows = self.chain.get_table_rows(&request).await?;
        let count = rows
            .iter()
            .filter(|row| row.get("market_id").and_then(Value::as_u64) == Some(market.market_id))
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}
