use crate::dataset::{DatasetSource, IndexPolicy};
use crate::error::ConfigError;
use anyhow::Result;
use ethers::providers::{Http, Provider};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Network category for grouping in the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkCategory {
    Mainnet,
    Testnet,
}

/// A predefined Stellar network with its passphrase and explorer slug.
#[derive(Clone, Debug)]
pub struct StellarNetwork {
    pub name: &'static str,
    pub label: &'static str,
    pub passphrase: &'static str,
    pub explorer_slug: Option<&'static str>,
    pub category: NetworkCategory,
}

impl StellarNetwork {
    pub const fn new(
        name: &'static str,
        label: &'static str,
        passphrase: &'static str,
        explorer_slug: Option<&'static str>,
        category: NetworkCategory,
    ) -> Self {
        Self {
            name,
            label,
            passphrase,
            explorer_slug,
            category,
        }
    }
}

use NetworkCategory::*;

pub const NETWORKS: &[StellarNetwork] = &[
    StellarNetwork::new("mainnet", "Stellar Mainnet", "Public Global Stellar Network ; September 2015", Some("public"), Mainnet),
    StellarNetwork::new("testnet", "Stellar Testnet", "Test SDF Network ; September 2015", Some("testnet"), Testnet),
    StellarNetwork::new("futurenet", "Stellar Futurenet", "Test SDF Future Network ; October 2022", None, Testnet),
];

pub const DEFAULT_NETWORK: &str = "testnet";

/// Decimal scale of Stellar asset contracts.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 7;

/// `i128` holds at most 39 digits, keep at least one integer digit.
pub const MAX_TOKEN_DECIMALS: u32 = 38;

/// Find a network preset by name (case-insensitive)
pub fn find_network(name: &str) -> Option<&'static StellarNetwork> {
    NETWORKS.iter().find(|n| n.name.eq_ignore_ascii_case(name.trim()))
}

/// Find a network preset by its passphrase
pub fn find_network_by_passphrase(passphrase: &str) -> Option<&'static StellarNetwork> {
    NETWORKS.iter().find(|n| n.passphrase == passphrase)
}

/// Get the full URL to view a transaction on the block explorer
pub fn get_tx_explorer_url(passphrase: &str, tx_hash: &str) -> Option<String> {
    find_network_by_passphrase(passphrase)
        .and_then(|n| n.explorer_slug)
        .map(|slug| format!("https://stellar.expert/explorer/{}/tx/{}", slug, tx_hash))
}

/// Check that a string looks like a Soroban contract strkey.
pub fn validate_contract_id(contract_id: &str) -> std::result::Result<(), String> {
    if contract_id.len() != 56 {
        return Err(format!("expected 56 characters, got {}", contract_id.len()));
    }
    if !contract_id.starts_with('C') {
        return Err("contract ids start with 'C'".to_string());
    }
    if let Some(bad) = contract_id
        .chars()
        .find(|c| !(c.is_ascii_uppercase() || ('2'..='7').contains(c)))
    {
        return Err(format!("unexpected character '{}'", bad));
    }
    Ok(())
}

fn flag_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

#[derive(Clone, Debug)]
pub struct Config {
    pub contract_id: String,
    pub rpc_url: String,
    pub network_passphrase: String,
    pub token_decimals: u32,
    pub token_symbol: String,
    pub dataset: Option<DatasetSource>,
    pub index_policy: IndexPolicy,
}

impl Config {
    pub fn new(contract_id: String, rpc_url: String) -> Self {
        let network_passphrase = find_network(DEFAULT_NETWORK)
            .map(|n| n.passphrase.to_string())
            .unwrap_or_default();

        Self {
            contract_id,
            rpc_url,
            network_passphrase,
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            token_symbol: "tokens".to_string(),
            dataset: None,
            index_policy: IndexPolicy::Required,
        }
    }

    /// Load configuration from the process environment, reading `.env` first.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let contract_id = get("CONTRACT_ID")
            .ok_or(ConfigError::Missing("CONTRACT_ID"))?
            .trim()
            .to_string();
        validate_contract_id(&contract_id).map_err(|reason| ConfigError::Invalid {
            name: "CONTRACT_ID",
            reason,
        })?;

        let rpc_url = get("RPC_URL")
            .ok_or(ConfigError::Missing("RPC_URL"))?
            .trim()
            .to_string();
        let parsed = Url::parse(&rpc_url).map_err(|e| ConfigError::Invalid {
            name: "RPC_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "RPC_URL",
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let mut config = Self::new(contract_id, rpc_url);

        let network_name = get("NETWORK").unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        match get("NETWORK_PASSPHRASE") {
            Some(passphrase) => config.network_passphrase = passphrase,
            None => {
                let network = find_network(&network_name).ok_or_else(|| ConfigError::Invalid {
                    name: "NETWORK",
                    reason: format!("unknown network '{}'", network_name),
                })?;
                config.network_passphrase = network.passphrase.to_string();
            }
        }

        if let Some(decimals) = get("TOKEN_DECIMALS") {
            let parsed: u32 = decimals.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "TOKEN_DECIMALS",
                reason: format!("'{}' is not a non-negative integer", decimals),
            })?;
            if parsed > MAX_TOKEN_DECIMALS {
                return Err(ConfigError::Invalid {
                    name: "TOKEN_DECIMALS",
                    reason: format!("must be at most {}", MAX_TOKEN_DECIMALS),
                });
            }
            config.token_decimals = parsed;
        }

        if let Some(symbol) = get("TOKEN_SYMBOL") {
            config.token_symbol = symbol.trim().to_string();
        }

        config.dataset = match (get("PROOF_DATA"), get("PROOF_DATA_PATH")) {
            (Some(inline), _) => Some(DatasetSource::Inline(inline)),
            (None, Some(path)) => Some(DatasetSource::File(PathBuf::from(path.trim()))),
            (None, None) => None,
        };

        if get("ALLOW_MISSING_INDEX").is_some_and(|v| flag_enabled(&v)) {
            config.index_policy = IndexPolicy::DefaultToZero;
        }

        Ok(config)
    }

    pub fn network_label(&self) -> &str {
        find_network_by_passphrase(&self.network_passphrase)
            .map(|n| n.label)
            .unwrap_or("Custom network")
    }

    pub fn tx_explorer_url(&self, tx_hash: &str) -> Option<String> {
        get_tx_explorer_url(&self.network_passphrase, tx_hash)
    }

    pub async fn get_provider(&self) -> Result<Arc<Provider<Http>>> {
        let url = Url::parse(&self.rpc_url)?;
        let provider = Provider::<Http>::try_from(url.as_str())?;
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONTRACT: &str = "CBSMARIEUIPI2FI7UITQ2FGXDZ4WGN7KMIQKYSZQFRWZ5N5BBYNCA7X5";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CONTRACT_ID", CONTRACT),
            ("RPC_URL", "https://soroban-testnet.stellar.org:443"),
        ]
    }

    // ==================== network preset tests ====================

    #[test]
    fn test_find_network_testnet() {
        let network = find_network("Testnet").unwrap();
        assert_eq!(network.passphrase, "Test SDF Network ; September 2015");
        assert_eq!(network.category, NetworkCategory::Testnet);
    }

    #[test]
    fn test_find_network_not_found() {
        assert!(find_network("devnet").is_none());
    }

    #[test]
    fn test_tx_explorer_url() {
        let url = get_tx_explorer_url("Test SDF Network ; September 2015", "abc123");
        assert_eq!(
            url.as_deref(),
            Some("https://stellar.expert/explorer/testnet/tx/abc123")
        );
        assert!(get_tx_explorer_url("Test SDF Future Network ; October 2022", "abc").is_none());
    }

    // ==================== validate_contract_id tests ====================

    #[test]
    fn test_validate_contract_id_valid() {
        assert!(validate_contract_id(CONTRACT).is_ok());
    }

    #[test]
    fn test_validate_contract_id_account_key_rejected() {
        let account = "GAXEVPVZ7VHRYPKMVGTOCO6WVFBSKQHNN2J2BMOS445X362SXECXKG2W";
        assert!(validate_contract_id(account).is_err());
    }

    #[test]
    fn test_validate_contract_id_bad_length() {
        let err = validate_contract_id("CABC").unwrap_err();
        assert!(err.contains("56"));
    }

    // ==================== Config::from_lookup tests ====================

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(lookup(&base())).unwrap();
        assert_eq!(config.contract_id, CONTRACT);
        assert_eq!(config.token_decimals, DEFAULT_TOKEN_DECIMALS);
        assert_eq!(config.token_symbol, "tokens");
        assert_eq!(config.network_label(), "Stellar Testnet");
        assert_eq!(config.index_policy, IndexPolicy::Required);
        assert!(config.dataset.is_none());
    }

    #[test]
    fn test_from_lookup_missing_contract_id() {
        let err = Config::from_lookup(lookup(&[("RPC_URL", "https://example.com")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CONTRACT_ID"));
    }

    #[test]
    fn test_from_lookup_blank_rpc_url_is_missing() {
        let err =
            Config::from_lookup(lookup(&[("CONTRACT_ID", CONTRACT), ("RPC_URL", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("RPC_URL"));
    }

    #[test]
    fn test_from_lookup_rejects_non_http_url() {
        let err = Config::from_lookup(lookup(&[
            ("CONTRACT_ID", CONTRACT),
            ("RPC_URL", "ftp://example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "RPC_URL", .. }));
    }

    #[test]
    fn test_from_lookup_network_and_overrides() {
        let mut pairs = base();
        pairs.push(("NETWORK", "mainnet"));
        pairs.push(("TOKEN_DECIMALS", "8"));
        pairs.push(("TOKEN_SYMBOL", "DROP"));
        pairs.push(("ALLOW_MISSING_INDEX", "yes"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.network_label(), "Stellar Mainnet");
        assert_eq!(config.token_decimals, 8);
        assert_eq!(config.token_symbol, "DROP");
        assert_eq!(config.index_policy, IndexPolicy::DefaultToZero);
    }

    #[test]
    fn test_from_lookup_custom_passphrase() {
        let mut pairs = base();
        pairs.push(("NETWORK_PASSPHRASE", "Standalone Network ; February 2017"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.network_label(), "Custom network");
        assert!(config.tx_explorer_url("abc").is_none());
    }

    #[test]
    fn test_from_lookup_unknown_network() {
        let mut pairs = base();
        pairs.push(("NETWORK", "devnet"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "NETWORK", .. }));
    }

    #[test]
    fn test_from_lookup_decimals_out_of_range() {
        let mut pairs = base();
        pairs.push(("TOKEN_DECIMALS", "40"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_from_lookup_dataset_inline_wins() {
        let mut pairs = base();
        pairs.push(("PROOF_DATA", "[]"));
        pairs.push(("PROOF_DATA_PATH", "/tmp/proofs.json"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.dataset, Some(DatasetSource::Inline("[]".into())));
    }

    #[test]
    fn test_from_lookup_dataset_path() {
        let mut pairs = base();
        pairs.push(("PROOF_DATA_PATH", "/tmp/proofs.json"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(
            config.dataset,
            Some(DatasetSource::File(PathBuf::from("/tmp/proofs.json")))
        );
    }

    #[tokio::test]
    async fn test_get_provider_accepts_configured_url() {
        let config = Config::from_lookup(lookup(&base())).unwrap();
        assert!(config.get_provider().await.is_ok());
    }
}
