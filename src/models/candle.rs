//! OHLCV candles and their aggregate summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{DexterError, Result};
use crate::models::{coerce_decimal, coerce_u64, field};

/// One OHLCV bar. `volume` stays `None` when the API omits or nulls it,
/// so quiet bars are distinguishable from zero-volume ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Option<Decimal>,
    pub time: Option<DateTime<Utc>>,
}

impl Candle {
    /// Parses a raw candle object, tolerating short and long field names.
    /// Returns `None` when any of the four price fields is absent or
    /// unparseable; a candle without prices carries no signal.
    #[must_use]
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let open = field(raw, &["open", "o"]).and_then(coerce_decimal)?;
        let high = field(raw, &["high", "h"]).and_then(coerce_decimal)?;
        let low = field(raw, &["low", "l"]).and_then(coerce_decimal)?;
        let close = field(raw, &["close", "c"]).and_then(coerce_decimal)?;
        let volume = field(raw, &["volume", "v"]).and_then(coerce_decimal);
        let time = field(raw, &["time", "t", "timestamp"])
            .and_then(coerce_u64)
            .and_then(|ms| {
                let ms = i64::try_from(ms).ok()?;
                DateTime::from_timestamp_millis(ms)
            });

        Some(Self {
            open,
            high,
            low,
            close,
            volume,
            time,
        })
    }
}

/// Window-level summary derived from an ordered candle series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvSummary {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Sum over candles that reported a volume.
    pub volume: Decimal,
    /// `(close - open) / open × 100`.
    pub price_change_pct: Decimal,
    pub candle_count: usize,
}

impl OhlcvSummary {
    /// Aggregates candles ordered oldest-first. Candles without a volume
    /// are excluded before aggregation; only bars with real turnover
    /// contribute to the window.
    ///
    /// # Errors
    ///
    /// Returns [`DexterError::InsufficientData`] when no candle survives
    /// the volume filter, or when the window's opening price is zero,
    /// since neither admits a meaningful change percentage.
    pub fn aggregate(pair: &str, candles: &[Candle]) -> Result<Self> {
        let valid: Vec<&Candle> = candles.iter().filter(|c| c.volume.is_some()).collect();
        let dropped = candles.len() - valid.len();
        if dropped > 0 {
            warn!(
                pair,
                dropped,
                total = candles.len(),
                "candles without volume excluded from aggregation"
            );
        }

        let first = valid.first().ok_or_else(|| {
            DexterError::InsufficientData(format!("no candles with volume for {pair}"))
        })?;
        let last = valid.last().ok_or_else(|| {
            DexterError::InsufficientData(format!("no candles with volume for {pair}"))
        })?;

        if first.open.is_zero() {
            return Err(DexterError::InsufficientData(format!(
                "opening price for {pair} is zero"
            )));
        }

        let high = valid.iter().map(|c| c.high).max().unwrap_or(first.high);
        let low = valid.iter().map(|c| c.low).min().unwrap_or(first.low);
        let volume = valid.iter().filter_map(|c| c.volume).sum();
        let price_change_pct = (last.close - first.open) / first.open * Decimal::ONE_HUNDRED;

        Ok(Self {
            open: first.open,
            high,
            low,
            close: last.close,
            volume,
            price_change_pct,
            candle_count: valid.len(),
        })
    }

    /// High-low range relative to the open, as a percentage.
    #[must_use]
    pub fn range_pct(&self) -> Decimal {
        if self.open.is_zero() {
            return Decimal::ZERO;
        }
        (self.high - self.low) / self.open * Decimal::ONE_HUNDRED
    }
}
