//! Token and market reference data.
//!
//! Every operation in the pipeline runs against a [`Market`] resolved from
//! the [`MarketRegistry`] allow-list. Pairs outside the list are rejected
//! before any upstream call is made; the agent never trades a market it
//! does not recognize.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// On-chain identity and fixed-point scaling for a fungible token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// Symbol code, e.g. `"XPR"`.
    pub code: String,
    /// Token contract account, e.g. `"eosio.token"`.
    pub contract: String,
    /// Number of decimal places in the token's smallest unit.
    pub precision: u32,
    /// `10^precision`, the factor between human units and chain integers.
    pub multiplier: Decimal,
}

impl TokenInfo {
    /// Creates token info, deriving the fixed-point multiplier.
    #[must_use]
    pub fn new(code: &str, contract: &str, precision: u32) -> Self {
        Self {
            code: code.to_string(),
            contract: contract.to_string(),
            precision,
            multiplier: Decimal::from(10u64.pow(precision)),
        }
    }

    /// Extended-symbol notation used by the DEX contract, e.g. `"4,XPR"`.
    #[must_use]
    pub fn extended_symbol(&self) -> String {
        format!("{},{}", self.precision, self.code)
    }
}

/// A tradable pair: the base ("ask") token priced in the quote ("bid")
/// token, plus the numeric market identifier used by the DEX contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Pair symbol in DEX notation, e.g. `"XPR_XMD"`.
    pub symbol: String,
    /// Market id in the DEX contract's markets table.
    pub market_id: u64,
    /// Base token (the asset being bought or sold).
    pub ask_token: TokenInfo,
    /// Quote token (the asset the price is denominated in).
    pub bid_token: TokenInfo,
}

impl Market {
    /// Token whose balance the order puts at risk: quote for a buy
    /// (funds the purchase), base for a sell (the asset leaving).
    #[must_use]
    pub fn risk_token(&self, side: crate::models::OrderSide) -> &TokenInfo {
        match side {
            crate::models::OrderSide::Buy => &self.bid_token,
            crate::models::OrderSide::Sell => &self.ask_token,
        }
    }
}

/// Fixed allow-list of trusted trading pairs.
#[derive(Debug, Clone)]
pub struct MarketRegistry {
    markets: HashMap<String, Market>,
}

impl MarketRegistry {
    /// The mainnet markets this agent is willing to trade.
    #[must_use]
    pub fn known() -> Self {
        let mut markets = HashMap::new();
        for market in [
            Market {
                symbol: "XPR_XMD".to_string(),
                market_id: 1,
                ask_token: TokenInfo::new("XPR", "eosio.token", 4),
                bid_token: TokenInfo::new("XMD", "xmd.token", 6),
            },
            Market {
                symbol: "XBTC_XMD".to_string(),
                market_id: 2,
                ask_token: TokenInfo::new("XBTC", "xtokens", 8),
                bid_token: TokenInfo::new("XMD", "xmd.token", 6),
            },
            Market {
                symbol: "XETH_XMD".to_string(),
                market_id: 3,
                ask_token: TokenInfo::new("XETH", "xtokens", 8),
                bid_token: TokenInfo::new("XMD", "xmd.token", 6),
            },
            Market {
                symbol: "XDOGE_XMD".to_string(),
                market_id: 4,
                ask_token: TokenInfo::new("XDOGE", "xtokens", 6),
                bid_token: TokenInfo::new("XMD", "xmd.token", 6),
            },
            Market {
                symbol: "XMT_XMD".to_string(),
                market_id: 5,
                ask_token: TokenInfo::new("XMT", "xtokens", 8),
                bid_token: TokenInfo::new("XMD", "xmd.token", 6),
            },
        ] {
            markets.insert(market.symbol.clone(), market);
        }
        Self { markets }
    }

    /// Builds a registry from an explicit market list (tests, alternate nets).
    #[must_use]
    pub fn from_markets(list: Vec<Market>) -> Self {
        let markets = list.into_iter().map(|m| (m.symbol.clone(), m)).collect();
        Self { markets }
    }

    /// Looks up a pair symbol, rejecting anything off the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`DexterError::UntrustedMarket`](crate::DexterError::UntrustedMarket)
    /// for unknown symbols.
    pub fn resolve(&self, symbol: &str) -> crate::Result<&Market> {
        self.markets
            .get(symbol)
            .ok_or_else(|| crate::DexterError::UntrustedMarket {
                symbol: symbol.to_string(),
            })
    }

    /// Pair symbols on the allow-list, for startup logging.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.markets.keys().map(String::as_str)
    }
}
