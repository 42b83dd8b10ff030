//! Composition root for a host application.
//!
//! [`ClaimSession`] owns one wallet session manager, one dataset container and
//! one claim controller, and turns their failures into notifications and a
//! single [`StatusView`].

use crate::claim::{ClaimController, ClaimState};
use crate::config::Config;
use crate::contract::ContractClient;
use crate::dataset::{DatasetState, LeafDataset};
use crate::error::{ClaimError, ConfigError, WalletError};
use crate::notifications::{NotificationEntry, Notifications};
use crate::presenter::{present, Severity, StatusView};
use crate::resolver::EntryResolution;
use crate::rpc::{self, HealthInfo, NetworkInfo};
use crate::types::ClaimReceipt;
use crate::wallet::{WalletProvider, WalletSession, WalletSessionManager};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct ClaimSession {
    config: Config,
    wallet: WalletSessionManager,
    dataset: LeafDataset,
    controller: ClaimController,
    notifications: Mutex<Notifications>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ClaimSession {
    pub fn new(
        config: Config,
        provider: Arc<dyn WalletProvider>,
        contract: Arc<dyn ContractClient>,
    ) -> Self {
        let wallet = WalletSessionManager::new(provider.clone());
        let dataset = LeafDataset::new();
        let controller =
            ClaimController::new(contract, provider, wallet.subscribe(), dataset.subscribe());

        Self {
            config,
            wallet,
            dataset,
            controller,
            notifications: Mutex::new(Notifications::new()),
            driver: Mutex::new(None),
        }
    }

    /// Build a session from the environment.
    ///
    /// On failure the error is logged here; the host shows
    /// [`StatusView::startup_failure`] for it.
    pub fn from_env(
        provider: Arc<dyn WalletProvider>,
        contract: Arc<dyn ContractClient>,
    ) -> Result<Self, ConfigError> {
        match Config::from_env() {
            Ok(config) => Ok(Self::new(config, provider, contract)),
            Err(e) => {
                error!("Cannot start claim session: {}", e);
                Err(e)
            }
        }
    }

    /// Start automatic eligibility checks, restore an existing wallet
    /// authorization and load the dataset.
    pub async fn start(&self) {
        {
            let mut driver = lock(&self.driver);
            if driver.is_none() {
                *driver = Some(tokio::spawn(self.controller.clone().run()));
            }
        }

        info!(
            "Starting claim session for contract {} on {}",
            self.config.contract_id,
            self.config.network_label()
        );
        tokio::join!(self.wallet.probe(), self.reload_dataset());
    }

    pub async fn reload_dataset(&self) -> DatasetState {
        self.dataset
            .load_from(self.config.dataset.as_ref(), self.config.index_policy)
            .await
    }

    pub async fn connect(&self) -> Result<String, WalletError> {
        let result = self.wallet.connect().await;
        if let Err(e) = &result {
            self.notify(format!("Failed to connect wallet: {}", e), Severity::Error);
        }
        result
    }

    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let result = self.wallet.disconnect().await;
        if let Err(e) = &result {
            self.notify(
                format!("Wallet did not confirm disconnect: {}", e),
                Severity::Warning,
            );
        }
        result
    }

    /// Connect/disconnect button.
    pub async fn toggle_wallet(&self) -> Result<WalletSession, WalletError> {
        let result = self.wallet.toggle().await;
        if let Err(e) = &result {
            self.notify(format!("Wallet request failed: {}", e), Severity::Error);
        }
        result
    }

    /// Pick up an account switch made inside the wallet.
    pub async fn refresh_wallet(&self) -> WalletSession {
        self.wallet.probe().await
    }

    pub async fn claim(&self) -> Result<ClaimReceipt, ClaimError> {
        let result = self.controller.submit().await;
        match &result {
            Ok(receipt) => self.notify(
                format!("Claim submitted: {}", receipt.tx_hash),
                Severity::Success,
            ),
            Err(e @ ClaimError::Failed(_)) => self.notify(e.to_string(), Severity::Error),
            Err(_) => {}
        }
        result
    }

    pub async fn recheck(&self) -> Result<(), ClaimError> {
        self.controller.recheck().await
    }

    /// Current status for the host to render.
    ///
    /// The claim state is taken for the session's own address, so a wallet
    /// switch shows a pending check until the new address is evaluated.
    pub fn status(&self) -> StatusView {
        let session = self.wallet.session();
        let dataset = self.dataset.state();
        let address = session.active_address();
        let resolution = EntryResolution::evaluate(address, &dataset);
        let state = self.controller.state_for(address);
        present(&state, &session, &resolution, &self.config)
    }

    pub async fn verify_network(&self) -> anyhow::Result<NetworkInfo> {
        rpc::verify_network(&self.config).await
    }

    pub async fn health(&self) -> anyhow::Result<HealthInfo> {
        rpc::health(&self.config).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn wallet_session(&self) -> WalletSession {
        self.wallet.session()
    }

    pub fn dataset_state(&self) -> DatasetState {
        self.dataset.state()
    }

    pub fn claim_state(&self) -> ClaimState {
        self.controller.state()
    }

    pub fn subscribe_claim(&self) -> watch::Receiver<ClaimState> {
        self.controller.subscribe()
    }

    pub fn notifications(&self) -> Vec<NotificationEntry> {
        lock(&self.notifications).entries().cloned().collect()
    }

    pub fn dismiss_notification(&self, index: usize) -> Option<NotificationEntry> {
        lock(&self.notifications).dismiss(index)
    }

    fn notify(&self, message: String, severity: Severity) {
        lock(&self.notifications).push(message, severity);
    }
}

impl Drop for ClaimSession {
    fn drop(&mut self) {
        if let Some(driver) = lock(&self.driver).take() {
            driver.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
