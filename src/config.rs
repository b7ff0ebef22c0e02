//! Application configuration loaded from environment variables.
//!
//! The trading account **must** be provided via `DEXTER_ACCOUNT`. Endpoint
//! URLs default to the public mainnet services and can be overridden:
//! - `DEXTER_DEX_API_URL`: Proton DEX HTTP API root
//! - `DEXTER_CHAIN_API_URL`: chain RPC node
//! - `DEXTER_WALLET_API_URL`: wallet daemon holding the signing keys
//!
//! Decision behavior:
//! - `DEXTER_PAIRS`: comma-separated trading pairs (default `XPR_XMD`)
//! - `DEXTER_CYCLE_SECS`: seconds between decision cycles (default 300)
//! - `DEXTER_DECISION_MODE`: `heuristic` (default) or `advisor`
//! - `DEXTER_ADVISOR_API_URL` / `DEXTER_ADVISOR_API_KEY` /
//!   `DEXTER_ADVISOR_MODEL`: advisor endpoint; the key is required when
//!   the mode is `advisor`
//! - `DEXTER_FORCE_DECISION`: demo flag (`1`/`true`) that bypasses the
//!   heuristic confidence gate; never the default
//! - `DEXTER_RISK_CONFIG`: optional path to a risk-limits JSON file

use crate::decision::DecisionMode;

/// Default Proton DEX HTTP API root.
const DEFAULT_DEX_API_URL: &str = "https://dex.api.mainnet.metalx.com/dex/v1";

/// Default chain RPC endpoint.
const DEFAULT_CHAIN_API_URL: &str = "https://proton.greymass.com";

/// Default wallet daemon endpoint (local keosd-compatible signer).
const DEFAULT_WALLET_API_URL: &str = "http://127.0.0.1:8900";

/// Default OpenAI-compatible chat-completions endpoint for advisor mode.
const DEFAULT_ADVISOR_API_URL: &str = "https://api.deepseek.com/chat/completions";

/// Default advisor model name.
const DEFAULT_ADVISOR_MODEL: &str = "deepseek-chat";

/// Default seconds between decision cycles.
const DEFAULT_CYCLE_SECS: u64 = 300;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub dex_api_url: String,
    pub chain_api_url: String,
    pub wallet_api_url: String,
    pub account: String,
    pub pairs: Vec<String>,
    pub cycle_secs: u64,
    pub decision_mode: DecisionMode,
    pub forced: bool,
    pub advisor: Option<AdvisorConfig>,
    pub risk_config_path: Option<String>,
}

/// External-advisor endpoint settings (advisor mode only).
#[derive(Debug)]
pub struct AdvisorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`DexterError::Config`](crate::DexterError::Config) if
/// `DEXTER_ACCOUNT` is missing, the decision mode is unknown, or advisor
/// mode is selected without an API key.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let dex_api_url =
        non_empty_var("DEXTER_DEX_API_URL").unwrap_or_else(|| DEFAULT_DEX_API_URL.to_string());
    let chain_api_url =
        non_empty_var("DEXTER_CHAIN_API_URL").unwrap_or_else(|| DEFAULT_CHAIN_API_URL.to_string());
    let wallet_api_url = non_empty_var("DEXTER_WALLET_API_URL")
        .unwrap_or_else(|| DEFAULT_WALLET_API_URL.to_string());

    let account = non_empty_var("DEXTER_ACCOUNT")
        .ok_or_else(|| crate::DexterError::Config("DEXTER_ACCOUNT is not set".to_string()))?;

    let pairs: Vec<String> = non_empty_var("DEXTER_PAIRS")
        .unwrap_or_else(|| "XPR_XMD".to_string())
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if pairs.is_empty() {
        return Err(crate::DexterError::Config(
            "DEXTER_PAIRS contains no trading pairs".to_string(),
        ));
    }

    let cycle_secs = match non_empty_var("DEXTER_CYCLE_SECS") {
        Some(raw) => raw.parse().map_err(|_| {
            crate::DexterError::Config(format!("DEXTER_CYCLE_SECS is not a number: {raw}"))
        })?,
        None => DEFAULT_CYCLE_SECS,
    };

    let decision_mode = match non_empty_var("DEXTER_DECISION_MODE").as_deref() {
        None | Some("heuristic") => DecisionMode::Heuristic,
        Some("advisor") => DecisionMode::Advisor,
        Some(other) => {
            return Err(crate::DexterError::Config(format!(
                "DEXTER_DECISION_MODE must be 'heuristic' or 'advisor', got {other:?}"
            )));
        }
    };

    let advisor_key = non_empty_var("DEXTER_ADVISOR_API_KEY");
    let advisor = match (&decision_mode, advisor_key) {
        (DecisionMode::Advisor, None) => {
            return Err(crate::DexterError::Config(
                "DEXTER_DECISION_MODE is 'advisor' but DEXTER_ADVISOR_API_KEY is missing"
                    .to_string(),
            ));
        }
        (_, Some(api_key)) => Some(AdvisorConfig {
            api_url: non_empty_var("DEXTER_ADVISOR_API_URL")
                .unwrap_or_else(|| DEFAULT_ADVISOR_API_URL.to_string()),
            api_key,
            model: non_empty_var("DEXTER_ADVISOR_MODEL")
                .unwrap_or_else(|| DEFAULT_ADVISOR_MODEL.to_string()),
        }),
        (_, None) => None,
    };

    let forced = matches!(
        non_empty_var("DEXTER_FORCE_DECISION").as_deref(),
        Some("1") | Some("true")
    );

    Ok(AppConfig {
        dex_api_url,
        chain_api_url,
        wallet_api_url,
        account,
        pairs,
        cycle_secs,
        decision_mode,
        forced,
        advisor,
        risk_config_path: non_empty_var("DEXTER_RISK_CONFIG"),
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper that temporarily sets env vars, runs `f`, then restores originals.
    ///
    /// Holds a process-wide lock so parallel tests never observe each
    /// other's variables.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let originals: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: ENV_LOCK serializes every mutation of these variables.
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: ENV_LOCK is still held.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    const ALL_VARS: &[&str] = &[
        "DEXTER_DEX_API_URL",
        "DEXTER_CHAIN_API_URL",
        "DEXTER_WALLET_API_URL",
        "DEXTER_ACCOUNT",
        "DEXTER_PAIRS",
        "DEXTER_CYCLE_SECS",
        "DEXTER_DECISION_MODE",
        "DEXTER_ADVISOR_API_URL",
        "DEXTER_ADVISOR_API_KEY",
        "DEXTER_ADVISOR_MODEL",
        "DEXTER_FORCE_DECISION",
        "DEXTER_RISK_CONFIG",
    ];

    fn cleared_except(set: &[(&str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS
            .iter()
            .map(|k| {
                let found = set.iter().find(|(name, _)| name == k);
                (*k, found.map(|(_, v)| *v))
            })
            .collect()
    }

    #[test]
    fn defaults_with_account_only() {
        let vars = cleared_except(&[("DEXTER_ACCOUNT", "alice")]);
        with_env(&vars, || {
            let config = fetch_config().unwrap();
            assert_eq!(config.dex_api_url, DEFAULT_DEX_API_URL);
            assert_eq!(config.chain_api_url, DEFAULT_CHAIN_API_URL);
            assert_eq!(config.account, "alice");
            assert_eq!(config.pairs, vec!["XPR_XMD".to_string()]);
            assert_eq!(config.cycle_secs, DEFAULT_CYCLE_SECS);
            assert!(matches!(config.decision_mode, DecisionMode::Heuristic));
            assert!(!config.forced);
            assert!(config.advisor.is_none());
        });
    }

    #[test]
    fn missing_account_is_an_error() {
        let vars = cleared_except(&[]);
        with_env(&vars, || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("DEXTER_ACCOUNT"));
        });
    }

    #[test]
    fn advisor_mode_requires_api_key() {
        let vars = cleared_except(&[
            ("DEXTER_ACCOUNT", "alice"),
            ("DEXTER_DECISION_MODE", "advisor"),
        ]);
        with_env(&vars, || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("DEXTER_ADVISOR_API_KEY"));
        });
    }

    #[test]
    fn advisor_mode_with_key_fills_defaults() {
        let vars = cleared_except(&[
            ("DEXTER_ACCOUNT", "alice"),
            ("DEXTER_DECISION_MODE", "advisor"),
            ("DEXTER_ADVISOR_API_KEY", "sk-test"),
        ]);
        with_env(&vars, || {
            let config = fetch_config().unwrap();
            let advisor = config.advisor.expect("advisor config");
            assert_eq!(advisor.api_url, DEFAULT_ADVISOR_API_URL);
            assert_eq!(advisor.model, DEFAULT_ADVISOR_MODEL);
            assert_eq!(advisor.api_key, "sk-test");
        });
    }

    #[test]
    fn pairs_are_split_and_trimmed() {
        let vars = cleared_except(&[
            ("DEXTER_ACCOUNT", "alice"),
            ("DEXTER_PAIRS", "XPR_XMD, XBTC_XMD ,XETH_XMD"),
        ]);
        with_env(&vars, || {
            let config = fetch_config().unwrap();
            assert_eq!(config.pairs, vec!["XPR_XMD", "XBTC_XMD", "XETH_XMD"]);
        });
    }

    #[test]
    fn unknown_decision_mode_is_rejected() {
        let vars = cleared_except(&[
            ("DEXTER_ACCOUNT", "alice"),
            ("DEXTER_DECISION_MODE", "vibes"),
        ]);
        with_env(&vars, || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("vibes"));
        });
    }

    #[test]
    fn forced_flag_parses_truthy_values() {
        let vars = cleared_except(&[
            ("DEXTER_ACCOUNT", "alice"),
            ("DEXTER_FORCE_DECISION", "true"),
        ]);
        with_env(&vars, || {
            assert!(fetch_config().unwrap().forced);
        });
    }

    #[test]
    fn bad_cycle_secs_is_rejected() {
        let vars = cleared_except(&[
            ("DEXTER_ACCOUNT", "alice"),
            ("DEXTER_CYCLE_SECS", "soon"),
        ]);
        with_env(&vars, || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("DEXTER_CYCLE_SECS"));
        });
    }
}
