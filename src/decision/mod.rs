//! Decision source adapter.
//!
//! Turns a market snapshot into either an order intent or an explicit
//! skip. Two sources are supported: a pure heuristic over the snapshot's
//! signals, and an external LLM-style advisor that must answer in a
//! strict one-line grammar. Either way the output is a [`Decision`]; the
//! risk engine downstream treats both sources identically.

pub mod advisor;
pub mod grammar;
pub mod heuristic;

use std::fmt;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::order::OrderIntent;
use crate::models::snapshot::MarketSnapshot;
use crate::risk::config::{RiskConfig, SymbolLimits};
use advisor::Advisor;
use grammar::AdvisorReply;

/// Which decision source drives the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionMode {
    /// Pure signal heuristic, no external calls.
    Heuristic,
    /// External advisor speaking the order grammar.
    Advisor,
}

/// Why a cycle chose not to trade. Skips are outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A previous cycle for this pair is still in flight.
    CycleInProgress,
    /// The market already carries too many open orders.
    OpenOrders { count: u32, max: u32 },
    /// Signals disagree or everything reads neutral.
    NeutralTrend,
    /// A direction exists but conviction is below the configured gate.
    LowConfidence { confidence: Decimal, min: Decimal },
    /// The advisor explicitly declined to trade.
    AdvisorSkip,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleInProgress => write!(f, "previous cycle still in flight"),
            Self::OpenOrders { count, max } => {
                write!(f, "{count} open orders (max {max})")
            }
            Self::NeutralTrend => write!(f, "no clear trend"),
            Self::LowConfidence { confidence, min } => {
                write!(f, "confidence {confidence} below minimum {min}")
            }
            Self::AdvisorSkip => write!(f, "advisor declined"),
        }
    }
}

/// Outcome of the decision stage for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Trade(OrderIntent),
    Skip(SkipReason),
}

/// Adapts the configured decision source to the pipeline.
///
/// Built with [`DecisionAdapter::heuristic`] or
/// [`DecisionAdapter::with_advisor`]; `forced` mode makes the heuristic
/// always produce an order in the direction of the stronger signal,
/// bypassing the confidence gate (intended for dry runs on test markets).
pub struct DecisionAdapter<A> {
    advisor: Option<A>,
    forced: bool,
}

impl<A: Advisor> DecisionAdapter<A> {
    #[must_use]
    pub fn heuristic(forced: bool) -> Self {
        Self {
            advisor: None,
            forced,
        }
    }

    #[must_use]
    pub fn with_advisor(advisor: A, forced: bool) -> Self {
        Self {
            advisor: Some(advisor),
            forced,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DecisionMode {
        if self.advisor.is_some() {
            DecisionMode::Advisor
        } else {
            DecisionMode::Heuristic
        }
    }

    /// Produces a decision for the snapshot.
    ///
    /// # Errors
    ///
    /// Advisor mode propagates transport failures and
    /// [`crate::DexterError::InvalidDecisionFormat`] when the reply
    /// violates the grammar; a malformed decision is never guessed at.
    /// Heuristic mode is infallible.
    pub async fn decide(
        &self,
        snapshot: &MarketSnapshot,
        risk_config: &RiskConfig,
    ) -> Result<Decision> {
        let limits = risk_config.limits_for(&snapshot.pair);
        let decision = match &self.advisor {
            None => heuristic::evaluate(snapshot, &limits, self.forced),
            Some(advisor) => self.ask_advisor(advisor, snapshot, risk_config, &limits).await?,
        };

        match &decision {
            Decision::Trade(intent) => info!(
                pair = %snapshot.pair,
                side = intent.side.as_str(),
                order_type = intent.order_type.as_str(),
                qty = %intent.quantity,
                price = %intent.price,
                "decision: trade"
            ),
            Decision::Skip(reason) => info!(pair = %snapshot.pair, %reason, "decision: skip"),
        }
        Ok(decision)
    }

    async fn ask_advisor(
        &self,
        advisor: &A,
        snapshot: &MarketSnapshot,
        risk_config: &RiskConfig,
        limits: &SymbolLimits,
    ) -> Result<Decision> {
        let prompt = advisor::build_prompt(snapshot, risk_config, limits);
        let response = advisor.advise(&prompt).await?;
        debug!(pair = %snapshot.pair, %response, "advisor replied");

        match grammar::parse(&response, &snapshot.pair)? {
            AdvisorReply::Skip => Ok(Decision::Skip(SkipReason::AdvisorSkip)),
            AdvisorReply::PlaceOrder {
                side,
                order_type,
                quantity,
            } => Ok(Decision::Trade(OrderIntent {
                market_symbol: snapshot.pair.clone(),
                side,
                order_type,
                quantity: Decimal::from(quantity),
                // The advisor names a size, not a price; orders go in at
                // the snapshot price and the deviation guard re-checks it.
                price: snapshot.price,
                stop_price: None,
            })),
        }
    }
}
