//! Order submission: one atomic transaction funding and placing an order.
//!
//! A placed order always rides a two-action transaction. The first action
//! moves the exact risk amount to the exchange's holding account; the
//! second places the order against that deposit. Atomicity means a failed
//! placement also rolls back the deposit, so no funds strand on the
//! exchange without a resting order.

use serde_json::json;
use tracing::info;

use crate::chain::{Action, ChainClient, TransactOptions, TransactionRecord};
use crate::error::Result;
use crate::markets::Market;
use crate::models::order::format_asset;
use crate::models::{OrderIntent, SerializedOrder};

/// The DEX contract account, which both escrows deposits and matches orders.
const DEX_ACCOUNT: &str = "dex";
const ACTIVE_PERMISSION: &str = "active";

/// Builds and broadcasts order transactions for one trading account.
///
/// There is intentionally no retry here. Rebroadcasting a transaction that
/// may already have been accepted risks double execution; bounded retries
/// belong to confirmation polling, which only reads.
pub struct OrderSubmitter<C> {
    chain: C,
    account: String,
}

impl<C: ChainClient> OrderSubmitter<C> {
    pub fn new(chain: C, account: impl Into<String>) -> Self {
        Self {
            chain,
            account: account.into(),
        }
    }

    /// Submits a validated intent as a funded order on the given market.
    ///
    /// The intent must already have passed risk validation; this stage
    /// only encodes and broadcasts.
    ///
    /// # Errors
    ///
    /// Returns [`DexterError::ChainSubmission`](crate::DexterError::ChainSubmission)
    /// when any RPC step fails or the node accepts the push without
    /// returning a transaction id.
    pub async fn submit(&self, intent: &OrderIntent, market: &Market) -> Result<TransactionRecord> {
        let order = SerializedOrder::from_intent(intent, market, &self.account);
        let deposit_token = market.risk_token(intent.side);
        let deposit = format_asset(intent.deposit_amount(), deposit_token);

        // The transfer funds exactly what the order commits: the scaled
        // order quantity and the asset string are floored from the same
        // decimal, so they can never disagree.
        let transfer = Action::new(
            &deposit_token.contract,
            "transfer",
            &self.account,
            ACTIVE_PERMISSION,
            json!({
                "from": self.account,
                "to": DEX_ACCOUNT,
                "quantity": deposit,
                "memo": "",
            }),
        );

        let place = Action::new(
            DEX_ACCOUNT,
            "placeorder",
            &self.account,
            ACTIVE_PERMISSION,
            json!({
                "market_id": order.market_id,
                "account": order.account,
                "order_type": order.order_type,
                "order_side": order.side,
                "quantity": order.quantity,
                "price": order.price,
                "bid_symbol": {
                    "sym": market.bid_token.extended_symbol(),
                    "contract": market.bid_token.contract,
                },
                "ask_symbol": {
                    "sym": market.ask_token.extended_symbol(),
                    "contract": market.ask_token.contract,
                },
                "trigger_price": order.trigger_price,
                "fill_type": order.fill_type,
                "referrer": "",
            }),
        );

        info!(
            market = %market.symbol,
            side = intent.side.as_str(),
            order_type = intent.order_type.as_str(),
            quantity = %intent.quantity,
            price = %intent.price,
            %deposit,
            "submitting order"
        );

        let record = self
            .chain
            .transact(vec![transfer, place], TransactOptions::default())
            .await?;

        info!(
            market = %market.symbol,
            transaction_id = %record.transaction_id,
            "order transaction accepted"
        );
        Ok(record)
    }
}
