//! Pure signal heuristic over a market snapshot.
//!
//! Four weighted signals vote bullish, bearish, or neutral. A trade comes
//! out only when one direction dominates the non-neutral weight and the
//! derived confidence clears the configured gate. Ties and murky votes
//! skip; skipping is always an acceptable outcome.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::order::{OrderIntent, OrderSide, OrderType};
use crate::models::snapshot::MarketSnapshot;
use crate::risk::config::SymbolLimits;

use super::{Decision, SkipReason};

/// Top-of-book levels feeding the imbalance signal.
const IMBALANCE_LEVELS: usize = 10;
/// Fewer trades than this and the volume signal abstains.
const MIN_TRADES_FOR_VOLUME: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// Evaluates the snapshot into a trade or a skip.
///
/// `forced` bypasses the dominance and confidence gates and orders in the
/// direction of the stronger side (buy on a dead tie), sized as if
/// confidence sat exactly at the gate. Meant for dry runs on test markets.
#[must_use]
pub fn evaluate(snapshot: &MarketSnapshot, limits: &SymbolLimits, forced: bool) -> Decision {
    let momentum_threshold = Decimal::TWO;
    let calm_range_pct = Decimal::TWO;
    let imbalance_threshold = Decimal::new(15, 2);
    let volume_rise_ratio = Decimal::new(11, 1);
    let dominance = Decimal::new(6, 1);

    let change = snapshot.price_change_pct;

    let momentum = if change > momentum_threshold {
        Trend::Bullish
    } else if change < -momentum_threshold {
        Trend::Bearish
    } else {
        Trend::Neutral
    };

    let volume = volume_trend(snapshot, volume_rise_ratio);

    let imbalance = match snapshot.depth.imbalance(IMBALANCE_LEVELS) {
        Some(i) if i > imbalance_threshold => Trend::Bullish,
        Some(i) if i < -imbalance_threshold => Trend::Bearish,
        _ => Trend::Neutral,
    };

    // A wide bar range only matters as confirmation of the move's direction.
    let volatility = if snapshot.ohlcv.range_pct() < calm_range_pct {
        Trend::Neutral
    } else {
        direction_of(change)
    };

    let votes = [
        ("momentum", momentum, Decimal::new(35, 2)),
        ("volume", volume, Decimal::new(20, 2)),
        ("imbalance", imbalance, Decimal::new(25, 2)),
        ("volatility", volatility, Decimal::new(20, 2)),
    ];

    let mut bullish = Decimal::ZERO;
    let mut bearish = Decimal::ZERO;
    for (name, trend, weight) in votes {
        debug!(pair = %snapshot.pair, signal = name, ?trend, %weight, "signal vote");
        match trend {
            Trend::Bullish => bullish += weight,
            Trend::Bearish => bearish += weight,
            Trend::Neutral => {}
        }
    }

    let active = bullish + bearish;
    let (side, winner) = if bullish >= bearish {
        (OrderSide::Buy, bullish)
    } else {
        (OrderSide::Sell, bearish)
    };
    let share = if active.is_zero() {
        Decimal::ZERO
    } else {
        winner / active
    };
    let confidence = (change.abs() * Decimal::from(20)).min(Decimal::ONE_HUNDRED) * share;

    if forced {
        let floored = confidence.max(limits.min_confidence);
        debug!(pair = %snapshot.pair, %confidence, %floored, "forced mode, gates bypassed");
        return sized_trade(snapshot, limits, side, floored);
    }

    if active.is_zero() || share <= dominance {
        return Decision::Skip(SkipReason::NeutralTrend);
    }
    if confidence < limits.min_confidence {
        return Decision::Skip(SkipReason::LowConfidence {
            confidence,
            min: limits.min_confidence,
        });
    }

    sized_trade(snapshot, limits, side, confidence)
}

/// Rising turnover only reinforces the prevailing price direction; falling
/// or flat turnover says nothing.
fn volume_trend(snapshot: &MarketSnapshot, rise_ratio: Decimal) -> Trend {
    let trades = &snapshot.trades;
    if trades.len() < MIN_TRADES_FOR_VOLUME {
        return Trend::Neutral;
    }

    // Trades arrive newest first.
    let half = trades.len() / 2;
    let recent: Decimal = trades[..half].iter().map(|t| t.quantity).sum();
    let earlier: Decimal = trades[half..].iter().map(|t| t.quantity).sum();
    if earlier.is_zero() {
        return Trend::Neutral;
    }

    if recent > earlier * rise_ratio {
        direction_of(snapshot.price_change_pct)
    } else {
        Trend::Neutral
    }
}

fn direction_of(change: Decimal) -> Trend {
    if change > Decimal::ZERO {
        Trend::Bullish
    } else if change < Decimal::ZERO {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Sizes the order so the committed amount (quote for a buy, base for a
/// sell) equals the baseline notional scaled by conviction.
fn sized_trade(
    snapshot: &MarketSnapshot,
    limits: &SymbolLimits,
    side: OrderSide,
    confidence: Decimal,
) -> Decision {
    let target = limits.base_order_notional * confidence / Decimal::ONE_HUNDRED;
    let quantity = match side {
        OrderSide::Buy => {
            if snapshot.price.is_zero() {
                return Decision::Skip(SkipReason::NeutralTrend);
            }
            target / snapshot.price
        }
        OrderSide::Sell => target,
    };

    Decision::Trade(OrderIntent {
        market_symbol: snapshot.pair.clone(),
        side,
        order_type: OrderType::Limit,
        quantity,
        price: snapshot.price,
        stop_price: None,
    })
}
