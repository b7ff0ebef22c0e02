//! Order intent and chain-ready order encoding.
//!
//! An [`OrderIntent`] carries human-scale decimal values straight from the
//! decision stage; the risk engine may shrink its quantity but never grows
//! it. A [`SerializedOrder`] is the chain-ready encoding with fixed-point
//! integer quantities, produced immediately before submission and
//! discarded after.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::markets::{Market, TokenInfo};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Numeric side code used by the DEX contract.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// Order type at the intent level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
        }
    }
}

/// Fill policy code understood by the DEX contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillType {
    GoodTillCancel,
    ImmediateOrCancel,
    PostOnly,
}

impl FillType {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            FillType::GoodTillCancel => 0,
            FillType::ImmediateOrCancel => 1,
            FillType::PostOnly => 2,
        }
    }
}

/// A proposed order in human-scale decimal units.
///
/// `quantity` is denominated in the base (ask) token; `price` in quote
/// units per base unit. The risk engine mutates `quantity` downward only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub market_symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<Decimal>,
}

impl OrderIntent {
    /// Amount of the risk-bearing token this order commits: the quote
    /// notional for a buy, the base quantity for a sell. This is exactly
    /// what the funding transfer deposits.
    #[must_use]
    pub fn deposit_amount(&self) -> Decimal {
        match self.side {
            OrderSide::Buy => self.quantity * self.price,
            OrderSide::Sell => self.quantity,
        }
    }
}

/// Chain-ready order encoding with fixed-point integer fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializedOrder {
    pub account: String,
    pub market_id: u64,
    /// 1 = buy, 2 = sell.
    pub side: u8,
    /// Contract type code: 1 = limit, 2 = stop-loss, 3 = take-profit.
    /// Market intents encode as limit at the current price with IOC fill.
    pub order_type: u8,
    /// Deposited amount as a chain-scaled integer string (quote units for
    /// a buy, base units for a sell).
    pub quantity: String,
    /// Price in quote units per base unit, chain-scaled by quote precision.
    pub price: String,
    pub fill_type: u8,
    /// Chain-scaled trigger price; `"0"` when the order has no trigger.
    pub trigger_price: String,
}

/// Contract order-type codes.
const TYPE_LIMIT: u8 = 1;
const TYPE_STOP_LOSS: u8 = 2;

impl SerializedOrder {
    /// Encodes an intent for the given market.
    ///
    /// All scaling floors toward zero, so the encoded order never commits
    /// more than the validated intent.
    #[must_use]
    pub fn from_intent(intent: &OrderIntent, market: &Market, account: &str) -> Self {
        let deposit_token = market.risk_token(intent.side);
        let quantity = scale_to_chain(intent.deposit_amount(), deposit_token.precision);
        let price = scale_to_chain(intent.price, market.bid_token.precision);
        let trigger_price = intent
            .stop_price
            .map(|p| scale_to_chain(p, market.bid_token.precision))
            .unwrap_or_else(|| "0".to_string());

        let order_type = if intent.stop_price.is_some() {
            TYPE_STOP_LOSS
        } else {
            TYPE_LIMIT
        };
        let fill_type = match intent.order_type {
            OrderType::Market => FillType::ImmediateOrCancel,
            OrderType::Limit => FillType::GoodTillCancel,
        };

        Self {
            account: account.to_string(),
            market_id: market.market_id,
            side: intent.side.code(),
            order_type,
            quantity,
            price,
            fill_type: fill_type.code(),
            trigger_price,
        }
    }
}

/// Scales a human-scale decimal to a chain integer string:
/// `floor(value × 10^precision)`.
///
/// Floor-rounding is lossy and always rounds *down*: the chain value
/// never exceeds the decimal input. Inputs are expected to be
/// non-negative (order quantities and prices).
#[must_use]
pub fn scale_to_chain(value: Decimal, precision: u32) -> String {
    let multiplier = Decimal::from(10u64.pow(precision));
    (value * multiplier).trunc().to_string()
}

/// Inverse of [`scale_to_chain`]: chain integer back to decimal units.
#[must_use]
pub fn unscale_from_chain(raw: u64, precision: u32) -> Decimal {
    let multiplier = Decimal::from(10u64.pow(precision));
    Decimal::from(raw) / multiplier
}

/// Formats an amount as a precision-exact asset string for a token
/// `transfer`, e.g. `"49.500000 XMD"`. Rounds down to the token's
/// precision so the transfer never exceeds the validated amount.
#[must_use]
pub fn format_asset(amount: Decimal, token: &TokenInfo) -> String {
    let mut quantized = amount.round_dp_with_strategy(token.precision, RoundingStrategy::ToZero);
    quantized.rescale(token.precision);
    format!("{} {}", quantized, token.code)
}
