//! Wallet session management.
//!
//! The [`WalletSessionManager`] is the only writer of the [`WalletSession`].
//! Everything else subscribes to it through a `watch` receiver.

use crate::error::WalletError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// External wallet provider (browser extension, hardware wallet bridge, ...).
///
/// Extensions mostly report failures as free text; implementations map it with
/// [`WalletError::classify`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompt the user for authorization and return the authorized address.
    async fn connect(&self) -> Result<String, WalletError>;

    /// Revoke the provider-side session.
    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Currently authorized address, without prompting.
    ///
    /// Fails with [`WalletError::NotAuthorized`] when there is no prior authorization.
    async fn get_address(&self) -> Result<String, WalletError>;

    /// Sign an encoded transaction payload and return the signed payload.
    async fn sign(&self, payload: &str) -> Result<String, WalletError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Option<String>,
    pub connected: bool,
    pub connecting: bool,
}

impl WalletSession {
    fn connected(address: String) -> Self {
        Self {
            address: Some(address),
            connected: true,
            connecting: false,
        }
    }

    /// The address to act on, only when the session is connected.
    pub fn active_address(&self) -> Option<&str> {
        if self.connected {
            self.address.as_deref()
        } else {
            None
        }
    }
}

pub struct WalletSessionManager {
    provider: Arc<dyn WalletProvider>,
    session: watch::Sender<WalletSession>,
    /// Serializes provider calls so connect/disconnect/probe never interleave.
    op_lock: Mutex<()>,
}

impl WalletSessionManager {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        let (session, _) = watch::channel(WalletSession::default());
        Self {
            provider,
            session,
            op_lock: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.session.subscribe()
    }

    pub fn session(&self) -> WalletSession {
        self.session.borrow().clone()
    }

    /// Publish `next`, notifying subscribers only on an actual change.
    fn publish(&self, next: WalletSession) {
        self.session.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    /// Look for an existing authorization without prompting.
    ///
    /// Also picks up an account switch made inside the provider.
    pub async fn probe(&self) -> WalletSession {
        let _lock = self.op_lock.lock().await;

        match self.provider.get_address().await {
            Ok(address) => {
                if self.session.borrow().address.as_deref() != Some(address.as_str()) {
                    info!("Wallet authorized for {}", address);
                }
                self.publish(WalletSession::connected(address));
            }
            Err(WalletError::NotAuthorized) => {
                debug!("No existing wallet authorization");
                self.publish(WalletSession::default());
            }
            Err(e) => {
                warn!("Wallet probe failed: {}", e);
                self.publish(WalletSession::default());
            }
        }
        self.session()
    }

    /// Prompt the provider for authorization. No-op when already connected.
    pub async fn connect(&self) -> Result<String, WalletError> {
        let _lock = self.op_lock.lock().await;

        if let Some(address) = self.session.borrow().active_address() {
            debug!("Wallet already connected as {}", address);
            return Ok(address.to_string());
        }

        self.session.send_modify(|s| s.connecting = true);

        match self.provider.connect().await {
            Ok(address) => {
                info!("Wallet connected: {}", address);
                self.publish(WalletSession::connected(address.clone()));
                Ok(address)
            }
            Err(e) => {
                warn!("Failed to connect wallet: {}", e);
                self.publish(WalletSession::default());
                Err(e)
            }
        }
    }

    /// Clear the local session.
    ///
    /// Local state is cleared even if the provider call fails; the provider
    /// error is still returned so the caller can surface it.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let _lock = self.op_lock.lock().await;

        let result = self.provider.disconnect().await;
        if let Err(e) = &result {
            warn!("Wallet provider failed to disconnect, clearing local session anyway: {}", e);
        } else {
            info!("Wallet disconnected");
        }
        self.publish(WalletSession::default());
        result
    }

    /// Connect when disconnected, disconnect when connected.
    ///
    /// Probes first so a stale local view does not prompt needlessly.
    pub async fn toggle(&self) -> Result<WalletSession, WalletError> {
        let session = self.probe().await;
        if session.connected {
            self.disconnect().await?;
        } else {
            self.connect().await?;
        }
        Ok(self.session())
    }
}
