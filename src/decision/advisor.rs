//! External LLM-style advisor client.
//!
//! Speaks the OpenAI-compatible chat-completions protocol: one system
//! message pinning the reply contract, one user message carrying the
//! rounded snapshot and the risk limits. The reply is returned raw; the
//! grammar parser decides whether it is acceptable.

use std::fmt::Write;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::config::AdvisorConfig;
use crate::error::{DexterError, Result};
use crate::models::snapshot::MarketSnapshot;
use crate::risk::config::{RiskConfig, SymbolLimits};

const ADVISOR_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REPLY_TOKENS: u32 = 64;

const SYSTEM_PROMPT: &str = "You are the decision source for an automated trading agent \
on the Proton DEX. You receive one market snapshot per message and must answer with \
exactly one line in the required format and nothing else.";

/// A decision source that answers prompts in the one-line order grammar.
#[allow(async_fn_in_trait)]
pub trait Advisor {
    /// Sends the prompt and returns the raw reply text.
    async fn advise(&self, prompt: &str) -> Result<String>;
}

/// Advisor backed by an OpenAI-compatible chat-completions endpoint.
pub struct HttpAdvisor {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpAdvisor {
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(config: &AdvisorConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(ADVISOR_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl Advisor for HttpAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.0,
            "max_tokens": MAX_REPLY_TOKENS,
            "stream": false,
        });

        debug!(model = %self.model, "advisor request");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DexterError::MarketData(format!(
                "advisor request: HTTP {status}"
            )));
        }

        let payload: Value = response.json().await?;
        let content = payload
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str);

        match content {
            Some(text) => Ok(text.to_string()),
            None => Err(DexterError::InvalidDecisionFormat {
                reason: "advisor response has no message content".to_string(),
                response: payload.to_string(),
            }),
        }
    }
}

/// Renders the user prompt: rounded snapshot, risk limits, and the exact
/// reply contract.
#[must_use]
pub fn build_prompt(
    snapshot: &MarketSnapshot,
    risk_config: &RiskConfig,
    limits: &SymbolLimits,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Market {}:", snapshot.pair);
    let _ = writeln!(out, "  price: {}", snapshot.price.round_dp(6));
    let _ = writeln!(
        out,
        "  24h change: {}%",
        snapshot.price_change_pct.round_dp(2)
    );
    let _ = writeln!(out, "  24h volume: {}", snapshot.volume.round_dp(2));
    if let (Some(bid), Some(ask)) = (snapshot.depth.best_bid(), snapshot.depth.best_ask()) {
        let _ = writeln!(
            out,
            "  best bid: {} ({} on offer)",
            bid.price.round_dp(6),
            bid.size.round_dp(2)
        );
        let _ = writeln!(
            out,
            "  best ask: {} ({} on offer)",
            ask.price.round_dp(6),
            ask.size.round_dp(2)
        );
    }
    if let Some(imbalance) = snapshot.depth.imbalance(10) {
        let _ = writeln!(out, "  book imbalance (top 10): {}", imbalance.round_dp(3));
    }
    let _ = writeln!(out, "  recent trades: {}", snapshot.trades.len());
    let _ = writeln!(
        out,
        "  candles: {} spanning a {}% range",
        snapshot.ohlcv.candle_count,
        snapshot.ohlcv.range_pct().round_dp(2)
    );

    out.push('\n');
    out.push_str(&risk_config.describe_limits());

    let _ = writeln!(
        out,
        "\nOversized orders are clamped to at most {} risk-currency units; \
         prefer sizes inside the limits above.",
        limits.max_order_notional
    );
    let _ = writeln!(out, "\nAnswer with exactly one of:");
    let _ = writeln!(
        out,
        "USE DEX placeOrder {} <buy|sell> <market|limit> <quantity>",
        snapshot.pair
    );
    let _ = writeln!(out, "USE DEX skip");
    let _ = write!(
        out,
        "where <quantity> is a positive integer amount of base units. \
         Any other output is rejected."
    );

    out
}
