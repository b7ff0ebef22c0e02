//! HTTP gateway to the DEX market-data API.
//!
//! Every endpoint answers with a `{ sync, data }` envelope whose `data`
//! shape varies between endpoint versions, so payloads are normalized
//! through the coercing parsers in [`crate::models`]. A snapshot is all
//! or nothing: any sub-fetch failure fails the whole call, except recent
//! trades, which may legitimately be empty.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::try_join3;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DexterError, Result};
use crate::markets::MarketRegistry;
use crate::models::ApiEnvelope;
use crate::models::balance::{Balance, parse_balances};
use crate::models::candle::{Candle, OhlcvSummary};
use crate::models::depth::OrderBookDepth;
use crate::models::lifecycle::OrderLifecycle;
use crate::models::snapshot::MarketSnapshot;
use crate::models::trade::RecentTrade;

const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEPTH_STEP: u32 = 1;
const DEPTH_LIMIT: u32 = 100;
const TRADES_LIMIT: u32 = 100;
/// Candle interval in minutes.
const OHLCV_INTERVAL: u32 = 15;
const OHLCV_LIMIT: u32 = 100;
const OHLCV_WINDOW_HOURS: i64 = 24;

/// Read-only client for market data, balances, and order lifecycle.
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct MarketDataGateway {
    client: reqwest::Client,
    base_url: String,
    registry: MarketRegistry,
}

impl MarketDataGateway {
    /// Builds a gateway against the given API root, e.g.
    /// `https://dex.api.mainnet.metalx.com/dex/v1`.
    ///
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, registry: MarketRegistry) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &MarketRegistry {
        &self.registry
    }

    /// Fetches and assembles a full snapshot for one pair.
    ///
    /// The three upstream calls run concurrently and are joined before the
    /// snapshot is considered valid.
    ///
    /// # Errors
    ///
    /// [`DexterError::UntrustedMarket`] when the pair is not registered,
    /// [`DexterError::MarketData`] on any transport or payload failure,
    /// [`DexterError::InsufficientData`] when no usable candles remain.
    pub async fn market_snapshot(&self, pair: &str) -> Result<MarketSnapshot> {
        self.registry.resolve(pair)?;

        let now = Utc::now();
        let window_start = now - chrono::Duration::hours(OHLCV_WINDOW_HOURS);

        let depth_query = [
            ("symbol", pair.to_string()),
            ("step", DEPTH_STEP.to_string()),
            ("limit", DEPTH_LIMIT.to_string()),
        ];
        let trades_query = [
            ("symbol", pair.to_string()),
            ("offset", "0".to_string()),
            ("limit", TRADES_LIMIT.to_string()),
        ];
        let ohlcv_query = [
            ("symbol", pair.to_string()),
            ("interval", OHLCV_INTERVAL.to_string()),
            ("from", window_start.to_rfc3339()),
            ("to", now.to_rfc3339()),
            ("limit", OHLCV_LIMIT.to_string()),
        ];
        let depth_fut = self.fetch_data("/orders/depth", &depth_query, "order book depth");
        let trades_fut = self.fetch_data("/trades/recent", &trades_query, "recent trades");
        let ohlcv_fut = self.fetch_data("/chart/ohlcv", &ohlcv_query, "ohlcv candles");

        let (depth_raw, trades_raw, ohlcv_raw) = try_join3(depth_fut, trades_fut, ohlcv_fut).await?;

        let depth = OrderBookDepth::from_raw(&depth_raw);
        let trades = parse_trades(pair, &trades_raw)?;
        let candles = parse_candles(pair, window_start, &ohlcv_raw)?;
        let ohlcv = OhlcvSummary::aggregate(pair, &candles)?;
        let price = snapshot_price(&depth, &ohlcv);

        info!(
            pair,
            %price,
            change_pct = %ohlcv.price_change_pct,
            bids = depth.bids.len(),
            asks = depth.asks.len(),
            trades = trades.len(),
            candles = ohlcv.candle_count,
            "market snapshot assembled"
        );

        Ok(MarketSnapshot {
            pair: pair.to_string(),
            price,
            price_change_pct: ohlcv.price_change_pct,
            volume: ohlcv.volume,
            timestamp: now,
            depth,
            trades,
            ohlcv,
        })
    }

    /// Fetches the account's spendable DEX balances.
    ///
    /// # Errors
    ///
    /// [`DexterError::MarketData`] on transport or payload failure.
    pub async fn account_balances(&self, account: &str) -> Result<Vec<Balance>> {
        let data = self
            .fetch_data(
                "/account/balances",
                &[("account", account.to_string())],
                "account balances",
            )
            .await?;
        Ok(parse_balances(&data))
    }

    /// Looks up the lifecycle of a placed order by its ordinal id.
    ///
    /// Returns `Ok(None)` when the indexer has not seen the order yet
    /// (HTTP 404, a null `data`, or a payload without a status).
    ///
    /// # Errors
    ///
    /// [`DexterError::MarketData`] on transport failures other than 404.
    pub async fn order_lifecycle(&self, ordinal_order_id: u64) -> Result<Option<OrderLifecycle>> {
        let context = "order lifecycle";
        let url = format!("{}/orders/lifecycle", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ordinal_order_id", ordinal_order_id.to_string())])
            .send()
            .await
            .map_err(|e| DexterError::MarketData(format!("{context}: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(ordinal_order_id, "order not indexed yet");
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(DexterError::MarketData(format!("{context}: HTTP {status}")));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| DexterError::MarketData(format!("{context}: invalid body: {e}")))?;
        if envelope.data.is_null() {
            debug!(ordinal_order_id, "order not indexed yet");
            return Ok(None);
        }
        Ok(OrderLifecycle::from_raw(ordinal_order_id, &envelope.data))
    }

    async fn fetch_data(
        &self,
        path: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, context, "market data request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| DexterError::MarketData(format!("{context}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DexterError::MarketData(format!("{context}: HTTP {status}")));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| DexterError::MarketData(format!("{context}: invalid body: {e}")))?;
        envelope.take_data(context)
    }
}

fn parse_trades(pair: &str, data: &Value) -> Result<Vec<RecentTrade>> {
    let Some(raw) = data.as_array() else {
        return Err(DexterError::MarketData(format!(
            "recent trades for {pair}: expected an array"
        )));
    };

    let mut trades = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for entry in raw {
        match RecentTrade::from_raw(entry) {
            Some(trade) => trades.push(trade),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(pair, dropped, "unparseable recent trades dropped");
    }
    Ok(trades)
}

fn parse_candles(pair: &str, window_start: DateTime<Utc>, data: &Value) -> Result<Vec<Candle>> {
    let Some(raw) = data.as_array() else {
        return Err(DexterError::MarketData(format!(
            "ohlcv candles for {pair}: expected an array"
        )));
    };

    let mut dropped = 0usize;
    let candles: Vec<Candle> = raw
        .iter()
        .filter_map(|entry| {
            let Some(candle) = Candle::from_raw(entry) else {
                dropped += 1;
                return None;
            };
            // Untimestamped candles are kept: the server already windowed them.
            match candle.time {
                Some(t) if t < window_start => None,
                _ => Some(candle),
            }
        })
        .collect();
    if dropped > 0 {
        warn!(pair, dropped, "unparseable candles dropped");
    }
    Ok(candles)
}

fn snapshot_price(depth: &OrderBookDepth, ohlcv: &OhlcvSummary) -> Decimal {
    match depth.mid_price() {
        Some(mid) => mid,
        None => {
            debug!("order book one-sided or empty, falling back to aggregated close");
            ohlcv.close
        }
    }
}
