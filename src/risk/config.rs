//! Risk configuration types and loading.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Risk limits configuration, loaded from `risk.json` or built from
/// defaults when no file is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Default limits applied to all markets unless overridden.
    pub defaults: SymbolLimits,
    /// Per-market overrides. Missing fields inherit from `defaults`.
    #[serde(default)]
    pub symbols: HashMap<String, SymbolOverrides>,
}

/// Complete set of limits (used as global defaults). All fields required.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolLimits {
    /// Percentage of the risk-side balance a single order may commit.
    pub max_balance_pct: Decimal,
    /// Multiplier applied to every computed cap, keeping headroom for fees
    /// and price movement between sizing and execution.
    pub safety_margin: Decimal,
    /// Maximum tolerated distance between the order price and the current
    /// market price, in percent. Violations reject, never clamp.
    pub max_price_deviation_pct: Decimal,
    /// Smallest order worth placing, in risk-currency units.
    pub min_order_notional: Decimal,
    /// Absolute per-order ceiling in risk-currency units, regardless of
    /// balance.
    pub max_order_notional: Decimal,
    /// Baseline order size the heuristic scales by confidence.
    pub base_order_notional: Decimal,
    /// Minimum heuristic confidence (0-100) required to trade.
    pub min_confidence: Decimal,
    /// Open orders allowed on a market before new cycles skip it.
    pub max_open_orders: u32,
}

/// Per-market overrides. Every field optional; missing inherits from defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolOverrides {
    pub max_balance_pct: Option<Decimal>,
    pub safety_margin: Option<Decimal>,
    pub max_price_deviation_pct: Option<Decimal>,
    pub min_order_notional: Option<Decimal>,
    pub max_order_notional: Option<Decimal>,
    pub base_order_notional: Option<Decimal>,
    pub min_confidence: Option<Decimal>,
    pub max_open_orders: Option<u32>,
}

impl Default for SymbolLimits {
    fn default() -> Self {
        Self {
            max_balance_pct: Decimal::from(5),
            safety_margin: Decimal::new(99, 2),
            max_price_deviation_pct: Decimal::from(5),
            min_order_notional: Decimal::ONE,
            max_order_notional: Decimal::from(500),
            base_order_notional: Decimal::TEN,
            min_confidence: Decimal::from(50),
            max_open_orders: 3,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            defaults: SymbolLimits::default(),
            symbols: HashMap::new(),
        }
    }
}

impl RiskConfig {
    /// Loads risk configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::DexterError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Loads from the given path, or falls back to built-in defaults when
    /// no path is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a path is given but cannot be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Returns the effective limits for a market, merging overrides with defaults.
    pub fn limits_for(&self, symbol: &str) -> SymbolLimits {
        match self.symbols.get(symbol) {
            Some(overrides) => SymbolLimits {
                max_balance_pct: overrides
                    .max_balance_pct
                    .unwrap_or(self.defaults.max_balance_pct),
                safety_margin: overrides
                    .safety_margin
                    .unwrap_or(self.defaults.safety_margin),
                max_price_deviation_pct: overrides
                    .max_price_deviation_pct
                    .unwrap_or(self.defaults.max_price_deviation_pct),
                min_order_notional: overrides
                    .min_order_notional
                    .unwrap_or(self.defaults.min_order_notional),
                max_order_notional: overrides
                    .max_order_notional
                    .unwrap_or(self.defaults.max_order_notional),
                base_order_notional: overrides
                    .base_order_notional
                    .unwrap_or(self.defaults.base_order_notional),
                min_confidence: overrides
                    .min_confidence
                    .unwrap_or(self.defaults.min_confidence),
                max_open_orders: overrides
                    .max_open_orders
                    .unwrap_or(self.defaults.max_open_orders),
            },
            None => self.defaults.clone(),
        }
    }

    /// Returns a human-readable description of all limits for advisor prompts.
    pub fn describe_limits(&self) -> String {
        let mut out = String::from("Risk limits:\n");

        let _ = writeln!(out, "  Defaults:");
        let _ = writeln!(out, "    max_balance_pct: {}", self.defaults.max_balance_pct);
        let _ = writeln!(out, "    safety_margin: {}", self.defaults.safety_margin);
        let _ = writeln!(
            out,
            "    max_price_deviation_pct: {}",
            self.defaults.max_price_deviation_pct
        );
        let _ = writeln!(
            out,
            "    min_order_notional: {}",
            self.defaults.min_order_notional
        );
        let _ = writeln!(
            out,
            "    max_order_notional: {}",
            self.defaults.max_order_notional
        );
        let _ = writeln!(
            out,
            "    base_order_notional: {}",
            self.defaults.base_order_notional
        );
        let _ = writeln!(out, "    min_confidence: {}", self.defaults.min_confidence);
        let _ = writeln!(out, "    max_open_orders: {}", self.defaults.max_open_orders);

        for (symbol, overrides) in &self.symbols {
            let _ = writeln!(out, "  {symbol}:");
            if let Some(v) = overrides.max_balance_pct {
                let _ = writeln!(out, "    max_balance_pct: {v}");
            }
            if let Some(v) = overrides.safety_margin {
                let _ = writeln!(out, "    safety_margin: {v}");
            }
            if let Some(v) = overrides.max_price_deviation_pct {
                let _ = writeln!(out, "    max_price_deviation_pct: {v}");
            }
            if let Some(v) = overrides.min_order_notional {
                let _ = writeln!(out, "    min_order_notional: {v}");
            }
            if let Some(v) = overrides.max_order_notional {
                let _ = writeln!(out, "    max_order_notional: {v}");
            }
            if let Some(v) = overrides.base_order_notional {
                let _ = writeln!(out, "    base_order_notional: {v}");
            }
            if let Some(v) = overrides.min_confidence {
                let _ = writeln!(out, "    min_confidence: {v}");
            }
            if let Some(v) = overrides.max_open_orders {
                let _ = writeln!(out, "    max_open_orders: {v}");
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_json() -> &'static str {
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
                    "max_balance_pct": "2",
                    "max_order_notional": "200"
                },
                "XPR_XMD": {
                    "min_confidence": "60"
                }
            }
        }"#
    }

    #[test]
    fn parse_valid_config() {
        let config: RiskConfig = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(config.defaults.max_balance_pct, dec!(5));
        assert_eq!(config.defaults.safety_margin, dec!(0.99));
        assert_eq!(config.defaults.max_open_orders, 3);
        assert_eq!(config.symbols.len(), 2);
    }

    #[test]
    fn merge_symbol_overrides() {
        let config: RiskConfig = serde_json::from_str(sample_json()).unwrap();
        let xbtc = config.limits_for("XBTC_XMD");
        assert_eq!(xbtc.max_balance_pct, dec!(2));
        assert_eq!(xbtc.max_order_notional, dec!(200));
        // Everything else inherits from defaults
        assert_eq!(xbtc.safety_margin, dec!(0.99));
        assert_eq!(xbtc.min_confidence, dec!(50));
    }

    #[test]
    fn partial_override_inherits_defaults() {
        let config: RiskConfig = serde_json::from_str(sample_json()).unwrap();
        let xpr = config.limits_for("XPR_XMD");
        assert_eq!(xpr.min_confidence, dec!(60));
        assert_eq!(xpr.max_balance_pct, dec!(5));
        assert_eq!(xpr.max_order_notional, dec!(500));
    }

    #[test]
    fn unknown_symbol_gets_defaults() {
        let config: RiskConfig = serde_json::from_str(sample_json()).unwrap();
        let other = config.limits_for("XETH_XMD");
        assert_eq!(other.max_balance_pct, dec!(5));
        assert_eq!(other.max_order_notional, dec!(500));
    }

    #[test]
    fn built_in_defaults_match_documented_policy() {
        let config = RiskConfig::default();
        assert_eq!(config.defaults.max_balance_pct, dec!(5));
        assert_eq!(config.defaults.safety_margin, dec!(0.99));
        assert_eq!(config.defaults.max_price_deviation_pct, dec!(5));
        assert_eq!(config.defaults.min_order_notional, dec!(1));
        assert_eq!(config.defaults.max_order_notional, dec!(500));
        assert!(config.symbols.is_empty());
    }

    #[test]
    fn load_or_default_without_path() {
        let config = RiskConfig::load_or_default(None).unwrap();
        assert_eq!(config.defaults.max_balance_pct, dec!(5));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.json");
        std::fs::write(&path, sample_json()).unwrap();

        let config = RiskConfig::load(&path).unwrap();
        assert_eq!(config.limits_for("XBTC_XMD").max_balance_pct, dec!(2));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let result = RiskConfig::load(Path::new("/nonexistent/risk.json"));
        assert!(matches!(result, Err(crate::DexterError::Config(_))));
    }

    #[test]
    fn bad_json_returns_error() {
        let result = serde_json::from_str::<RiskConfig>("not json");
        assert!(result.is_err());
    }

    #[test]
    fn missing_symbols_section_ok() {
        let json = r#"{
            "defaults": {
                "max_balance_pct": "5",
                "safety_margin": "0.99",
                "max_price_deviation_pct": "5",
                "min_order_notional": "1",
                "max_order_notional": "500",
                "base_order_notional": "10",
                "min_confidence": "50",
                "max_open_orders": 3
            }
        }"#;
        let config: RiskConfig = serde_json::from_str(json).unwrap();
        assert!(config.symbols.is_empty());
    }

    #[test]
    fn describe_limits_contains_defaults() {
        let config: RiskConfig = serde_json::from_str(sample_json()).unwrap();
        let desc = config.describe_limits();
        assert!(desc.contains("Defaults:"));
        assert!(desc.contains("max_balance_pct: 5"));
        assert!(desc.contains("max_order_notional: 500"));
    }

    #[test]
    fn describe_limits_contains_overrides() {
        let config: RiskConfig = serde_json::from_str(sample_json()).unwrap();
        let desc = config.describe_limits();
        assert!(desc.contains("XBTC_XMD:"));
        assert!(desc.contains("max_balance_pct: 2"));
    }
}
