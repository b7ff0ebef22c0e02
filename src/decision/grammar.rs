//! Advisor reply grammar.
//!
//! The advisor must answer with exactly one of:
//!
//! ```text
//! USE DEX placeOrder <PAIR> <buy|sell> <market|limit> <quantity>
//! USE DEX skip
//! ```
//!
//! Tokens are case-sensitive and separated by single spaces; `<quantity>`
//! is a positive integer in base units. Outer whitespace is trimmed, but
//! everything else must match exactly. Any deviation is a protocol
//! violation and the cycle aborts; a malformed decision is never guessed
//! at.

use crate::error::{DexterError, Result};
use crate::models::order::{OrderSide, OrderType};

/// A structurally valid advisor reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorReply {
    PlaceOrder {
        side: OrderSide,
        order_type: OrderType,
        quantity: u64,
    },
    Skip,
}

/// Parses one advisor reply against the expected trading pair.
///
/// # Errors
///
/// [`DexterError::InvalidDecisionFormat`] on any deviation from the
/// grammar, carrying the offending response for the log.
pub fn parse(response: &str, expected_pair: &str) -> Result<AdvisorReply> {
    let line = response.trim();
    let tokens: Vec<&str> = line.split(' ').collect();

    let violation = |reason: &str| DexterError::InvalidDecisionFormat {
        reason: reason.to_string(),
        response: response.to_string(),
    };

    if tokens.first() != Some(&"USE") || tokens.get(1) != Some(&"DEX") {
        return Err(violation("reply must start with \"USE DEX\""));
    }

    match tokens.get(2) {
        Some(&"skip") => {
            if tokens.len() != 3 {
                return Err(violation("\"skip\" takes no arguments"));
            }
            Ok(AdvisorReply::Skip)
        }
        Some(&"placeOrder") => {
            if tokens.len() != 7 {
                return Err(violation(
                    "\"placeOrder\" takes exactly <PAIR> <side> <type> <quantity>",
                ));
            }

            let pair = tokens[3];
            if pair != expected_pair {
                return Err(violation(&format!(
                    "pair {pair:?} does not match requested {expected_pair:?}"
                )));
            }

            let side = match tokens[4] {
                "buy" => OrderSide::Buy,
                "sell" => OrderSide::Sell,
                other => return Err(violation(&format!("unknown side {other:?}"))),
            };

            let order_type = match tokens[5] {
                "market" => OrderType::Market,
                "limit" => OrderType::Limit,
                other => return Err(violation(&format!("unknown order type {other:?}"))),
            };

            let raw_qty = tokens[6];
            if !raw_qty.bytes().all(|b| b.is_ascii_digit()) {
                return Err(violation(&format!(
                    "quantity {raw_qty:?} is not an unsigned integer"
                )));
            }
            let quantity: u64 = raw_qty
                .parse()
                .map_err(|_| violation(&format!("quantity {raw_qty:?} out of range")))?;
            if quantity == 0 {
                return Err(violation("quantity must be positive"));
            }

            Ok(AdvisorReply::PlaceOrder {
                side,
                order_type,
                quantity,
            })
        }
        _ => Err(violation("expected \"placeOrder\" or \"skip\"")),
    }
}
