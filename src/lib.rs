//! Autonomous order-placement agent for the Proton DEX.
//!
//! The pipeline runs in five stages: the market-data gateway assembles a
//! [`models::snapshot::MarketSnapshot`] from the DEX HTTP API, the decision
//! adapter turns it into a typed order intent (or a skip), the risk engine
//! validates and clamps the intent against fresh balances, the submitter
//! broadcasts a two-action atomic transaction (fund transfer +
//! `placeorder`), and the tracker polls for confirmation and order
//! lifecycle.

pub mod agent;
pub mod chain;
pub mod config;
pub mod decision;
pub mod error;
pub mod marketdata;
pub mod markets;
pub mod models;
pub mod retry;
pub mod risk;
pub mod submit;
pub mod tracker;

pub use error::{DexterError, Result};
