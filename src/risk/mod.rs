//! Risk validation and sizing layer for order placement.
//!
//! Enforces configurable per-market limits between the decision stage and
//! chain submission. Quantities only ever shrink here; a risk check never
//! grows an order.

pub mod config;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{DexterError, Result};
use crate::markets::Market;
use crate::models::OrderSide;
use crate::models::balance::{Balance, find};
use crate::models::order::OrderIntent;
use config::RiskConfig;

/// Validates orders against configured limits and clamps oversized
/// quantities down to the permitted cap.
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    /// Creates a new risk engine with the given configuration.
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Returns a reference to the risk configuration.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Validates an intent against all limits and returns a possibly
    /// size-reduced copy that is safe to submit.
    ///
    /// The order commits the quote balance on a buy and the base balance
    /// on a sell; caps, floor, and ceiling all apply to that committed
    /// amount. Every clamp is logged with the binding limit.
    ///
    /// # Errors
    ///
    /// [`DexterError::PriceDeviation`] when the order price strays too far
    /// from the market price (checked before sizing, never clamped),
    /// [`DexterError::InsufficientBalance`] when the risk-side balance is
    /// missing or cannot support an order above the notional floor,
    /// [`DexterError::InsufficientData`] when the market price is unusable.
    pub fn validate_and_clamp(
        &self,
        market: &Market,
        intent: &OrderIntent,
        balances: &[Balance],
        current_price: Decimal,
    ) -> Result<OrderIntent> {
        let limits = self.config.limits_for(&market.symbol);

        // 1. A positive market price is a precondition for every later check.
        if current_price <= Decimal::ZERO {
            return Err(DexterError::InsufficientData(format!(
                "market price for {} is not positive",
                market.symbol
            )));
        }

        // 2. Price deviation rejects outright before any sizing; clamping
        //    never rescues a mispriced order. A non-positive order price is
        //    deviant by definition.
        let deviation_pct =
            (intent.price - current_price).abs() / current_price * Decimal::ONE_HUNDRED;
        if deviation_pct > limits.max_price_deviation_pct || intent.price <= Decimal::ZERO {
            return Err(DexterError::PriceDeviation {
                price: intent.price,
                market_price: current_price,
                deviation_pct,
                max_pct: limits.max_price_deviation_pct,
            });
        }

        // 3. The side that pays determines which balance is at risk.
        let risk_token = market.risk_token(intent.side);
        let available = match find(balances, &risk_token.code) {
            Some(balance) => balance.amount,
            None => {
                return Err(DexterError::InsufficientBalance {
                    currency: risk_token.code.clone(),
                    required: limits.min_order_notional,
                    available: Decimal::ZERO,
                });
            }
        };

        // 4. Cap: percentage of balance under the safety margin, bounded by
        //    the absolute per-order ceiling.
        let pct_cap = available * limits.max_balance_pct / Decimal::ONE_HUNDRED
            * limits.safety_margin;
        let effective_cap = pct_cap.min(limits.max_order_notional);

        // 5. Clamp down, never up.
        let deposit = intent.deposit_amount();
        let (clamped_deposit, clamped_qty) = if deposit > effective_cap {
            let qty = match intent.side {
                OrderSide::Buy => effective_cap / intent.price,
                OrderSide::Sell => effective_cap,
            };
            let binding = if pct_cap <= limits.max_order_notional {
                "balance_pct"
            } else {
                "max_order_notional"
            };
            warn!(
                market = %market.symbol,
                side = intent.side.as_str(),
                original_qty = %intent.quantity,
                clamped_qty = %qty,
                deposit = %deposit,
                cap = %effective_cap,
                currency = %risk_token.code,
                binding,
                "order quantity clamped to risk cap"
            );
            (effective_cap, qty)
        } else {
            (deposit, intent.quantity)
        };

        // 6. Orders below the notional floor are not worth placing.
        if clamped_deposit < limits.min_order_notional {
            return Err(DexterError::InsufficientBalance {
                currency: risk_token.code.clone(),
                required: limits.min_order_notional,
                available: clamped_deposit,
            });
        }

        debug!(
            market = %market.symbol,
            side = intent.side.as_str(),
            qty = %clamped_qty,
            deposit = %clamped_deposit,
            %deviation_pct,
            "order passed risk checks"
        );

        Ok(OrderIntent {
            quantity: clamped_qty,
            ..intent.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markets::MarketRegistry;
    use crate::models::order::OrderType;
    use rust_decimal_macros::dec;

    fn test_config() -> RiskConfig {
        serde_json::from_str(
            r#"{
                "defaults": {
                    "max_balance_pct": "5",
                    "safety_margin": "0.99",
                    "max_price_deviation_pct": "5",
                    "min_order_notional": "1",
                    "max_order_notional": "500",
                    "base_order_notional": "10",
                    "min_confidence": "50",
                    "max_open_orders": 3
                },
                "symbols": {
                    "XBTC_XMD": {
                        "max_balance_pct": "2"
                    }
                }
            }"#,
        )
        .unwrap()
    }

    fn engine() -> RiskEngine {
        RiskEngine::new(test_config())
    }

    fn market(symbol: &str) -> Market {
        MarketRegistry::known().resolve(symbol).unwrap().clone()
    }

    fn balance(code: &str, amount: Decimal) -> Balance {
        Balance {
            currency: code.to_string(),
            amount,
            contract: None,
            decimals: None,
        }
    }

    fn account_balances() -> Vec<Balance> {
        vec![balance("XMD", dec!(1000)), balance("XPR", dec!(5000))]
    }

    fn intent(side: OrderSide, qty: Decimal, price: Decimal) -> OrderIntent {
        OrderIntent {
            market_symbol: "XPR_XMD".to_string(),
            side,
            order_type: OrderType::Limit,
            quantity: qty,
            price,
            stop_price: None,
        }
    }

    #[test]
    fn approve_within_cap_unchanged() {
        let i = intent(OrderSide::Buy, dec!(100), dec!(0.05));
        let out = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &account_balances(), dec!(0.05))
            .unwrap();
        assert_eq!(out, i);
    }

    #[test]
    fn clamp_buy_to_balance_cap() {
        // 1000 XMD * 5% * 0.99 = 49.5 XMD cap; 20000 XPR at 0.05 wants 1000.
        let i = intent(OrderSide::Buy, dec!(20000), dec!(0.05));
        let out = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &account_balances(), dec!(0.05))
            .unwrap();

        assert_eq!(out.quantity, dec!(990));
        assert!(out.quantity < i.quantity);
        assert_eq!(out.deposit_amount(), dec!(49.5));
    }

    #[test]
    fn clamp_sell_in_base_units() {
        // 5000 XPR * 5% * 0.99 = 247.5 XPR cap.
        let i = intent(OrderSide::Sell, dec!(10000), dec!(0.05));
        let out = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &account_balances(), dec!(0.05))
            .unwrap();

        assert_eq!(out.quantity, dec!(247.5));
    }

    #[test]
    fn ceiling_binds_over_balance_cap() {
        // 1,000,000 XMD * 5% * 0.99 = 49500, far above the 500 ceiling.
        let balances = vec![balance("XMD", dec!(1000000))];
        let i = intent(OrderSide::Buy, dec!(20000), dec!(0.05));
        let out = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &balances, dec!(0.05))
            .unwrap();

        assert_eq!(out.deposit_amount(), dec!(500));
        assert_eq!(out.quantity, dec!(10000));
    }

    #[test]
    fn reject_price_deviation() {
        let i = intent(OrderSide::Buy, dec!(100), dec!(0.06));
        let err = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &account_balances(), dec!(0.05))
            .unwrap_err();

        match err {
            DexterError::PriceDeviation { deviation_pct, max_pct, .. } => {
                assert_eq!(deviation_pct, dec!(20.00));
                assert_eq!(max_pct, dec!(5));
            }
            other => panic!("expected PriceDeviation, got {other:?}"),
        }
    }

    #[test]
    fn deviation_checked_before_balance() {
        let i = intent(OrderSide::Buy, dec!(100), dec!(0.06));
        let err = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &[], dec!(0.05))
            .unwrap_err();
        assert!(matches!(err, DexterError::PriceDeviation { .. }));
    }

    #[test]
    fn missing_balance_rejected() {
        let balances = vec![balance("XPR", dec!(5000))];
        let i = intent(OrderSide::Buy, dec!(100), dec!(0.05));
        let err = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &balances, dec!(0.05))
            .unwrap_err();

        match err {
            DexterError::InsufficientBalance { currency, available, .. } => {
                assert_eq!(currency, "XMD");
                assert_eq!(available, Decimal::ZERO);
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }

    #[test]
    fn below_floor_after_clamp_rejected() {
        // 10 XMD * 5% * 0.99 = 0.495, below the 1 XMD floor.
        let balances = vec![balance("XMD", dec!(10))];
        let i = intent(OrderSide::Buy, dec!(20000), dec!(0.05));
        let err = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &balances, dec!(0.05))
            .unwrap_err();

        match err {
            DexterError::InsufficientBalance { required, available, .. } => {
                assert_eq!(required, dec!(1));
                assert_eq!(available, dec!(0.495));
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
    }

    #[test]
    fn zero_quantity_rejected_via_floor() {
        let i = intent(OrderSide::Buy, dec!(0), dec!(0.05));
        let err = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &account_balances(), dec!(0.05))
            .unwrap_err();
        assert!(matches!(err, DexterError::InsufficientBalance { .. }));
    }

    #[test]
    fn per_symbol_override_applies() {
        // XBTC_XMD overrides max_balance_pct to 2%: 1000 * 2% * 0.99 = 19.8.
        let i = OrderIntent {
            market_symbol: "XBTC_XMD".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: dec!(1),
            price: dec!(30000),
            stop_price: None,
        };
        let out = engine()
            .validate_and_clamp(&market("XBTC_XMD"), &i, &account_balances(), dec!(30000))
            .unwrap();

        assert_eq!(out.deposit_amount(), dec!(19.8));
        assert_eq!(out.quantity, dec!(0.00066));
    }

    #[test]
    fn zero_market_price_rejected() {
        let i = intent(OrderSide::Buy, dec!(100), dec!(0.05));
        let err = engine()
            .validate_and_clamp(&market("XPR_XMD"), &i, &account_balances(), Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, DexterError::InsufficientData(_)));
    }
}
