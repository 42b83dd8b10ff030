//! Sanity probes against the configured Soroban RPC endpoint.
//!
//! Not part of the claim state machine; a host calls these at startup to
//! catch an endpoint that points at the wrong network.

use crate::config::{find_network_by_passphrase, Config};
use anyhow::{anyhow, Result};
use ethers::providers::{Http, Provider};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub passphrase: String,
    pub protocol_version: u32,
    #[serde(default)]
    pub friendbot_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
    pub status: String,
    #[serde(default)]
    pub latest_ledger: Option<u32>,
    #[serde(default)]
    pub oldest_ledger: Option<u32>,
}

impl HealthInfo {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

pub async fn fetch_network(provider: &Provider<Http>) -> Result<NetworkInfo> {
    provider
        .request::<_, NetworkInfo>("getNetwork", ())
        .await
        .map_err(|e| anyhow!("getNetwork failed: {}", e))
}

pub async fn fetch_health(provider: &Provider<Http>) -> Result<HealthInfo> {
    provider
        .request::<_, HealthInfo>("getHealth", ())
        .await
        .map_err(|e| anyhow!("getHealth failed: {}", e))
}

/// Fail unless the endpoint serves the network `expected` names.
pub fn check_passphrase(expected: &str, info: &NetworkInfo) -> Result<()> {
    if info.passphrase == expected {
        return Ok(());
    }
    let served = find_network_by_passphrase(&info.passphrase)
        .map(|n| n.label.to_string())
        .unwrap_or_else(|| format!("'{}'", info.passphrase));
    Err(anyhow!(
        "RPC endpoint serves {} but the configured passphrase is '{}'",
        served,
        expected
    ))
}

/// Confirm that `config.rpc_url` is on the configured network.
pub async fn verify_network(config: &Config) -> Result<NetworkInfo> {
    let provider = config.get_provider().await?;
    let info = fetch_network(&provider).await?;
    if let Err(e) = check_passphrase(&config.network_passphrase, &info) {
        warn!("{}", e);
        return Err(e);
    }
    info!(
        "Connected to {} (protocol {})",
        config.network_label(),
        info.protocol_version
    );
    Ok(info)
}

pub async fn health(config: &Config) -> Result<HealthInfo> {
    let provider = config.get_provider().await?;
    let health = fetch_health(&provider).await?;
    if !health.is_healthy() {
        warn!("RPC endpoint {} reports status '{}'", config.rpc_url, health.status);
    }
    Ok(health)
}
