use std::path::Path;

use dexter::DexterError;
use dexter::agent::TradingAgent;
use dexter::chain::HttpChainClient;
use dexter::config::fetch_config;
use dexter::decision::advisor::HttpAdvisor;
use dexter::decision::{DecisionAdapter, DecisionMode};
use dexter::marketdata::MarketDataGateway;
use dexter::markets::MarketRegistry;
use dexter::risk::RiskEngine;
use dexter::risk::config::RiskConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), DexterError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dexter=info")),
        )
        .init();

    let config = fetch_config()?;

    let gateway = MarketDataGateway::new(&config.dex_api_url, MarketRegistry::known())?;
    // Reject misconfigured pairs at startup rather than every cycle.
    for pair in &config.pairs {
        gateway.registry().resolve(pair)?;
    }

    let risk_config =
        RiskConfig::load_or_default(config.risk_config_path.as_deref().map(Path::new))?;
    info!("risk limits:\n{}", risk_config.describe_limits());
    let risk = RiskEngine::new(risk_config);

    let chain = HttpChainClient::new(&config.chain_api_url, &config.wallet_api_url)?;

    let decision = match (config.decision_mode, &config.advisor) {
        (DecisionMode::Advisor, Some(advisor_config)) => {
            DecisionAdapter::with_advisor(HttpAdvisor::new(advisor_config)?, config.forced)
        }
        _ => DecisionAdapter::heuristic(config.forced),
    };
    info!(mode = ?decision.mode(), forced = config.forced, "decision source ready");

    let agent = TradingAgent::new(gateway, risk, decision, chain, &config.account);
    agent.run(&config.pairs, config.cycle_secs).await;

    Ok(())
}
