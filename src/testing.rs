//! Test doubles for the wallet provider and the contract client.

use crate::contract::ContractClient;
use crate::error::{ContractError, WalletError};
use crate::types::{ClaimReceipt, ClaimRequest};
use crate::wallet::WalletProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Wait for a permit on `gate` if one is installed.
async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
    let gate = gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

fn install_gate(slot: &Mutex<Option<Arc<Semaphore>>>) -> Arc<Semaphore> {
    let gate = Arc::new(Semaphore::new(0));
    *slot.lock().unwrap() = Some(gate.clone());
    gate
}

pub struct MockWallet {
    address: Mutex<String>,
    authorized: AtomicBool,
    connect_error: Mutex<Option<WalletError>>,
    disconnect_error: Mutex<Option<WalletError>>,
    sign_error: Mutex<Option<WalletError>>,
    connect_gate: Mutex<Option<Arc<Semaphore>>>,
    connect_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl MockWallet {
    /// Wallet holding `address`, not yet authorized.
    pub fn new(address: &str) -> Self {
        Self {
            address: Mutex::new(address.to_string()),
            authorized: AtomicBool::new(false),
            connect_error: Mutex::new(None),
            disconnect_error: Mutex::new(None),
            sign_error: Mutex::new(None),
            connect_gate: Mutex::new(None),
            connect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    /// Wallet that already authorized `address` in an earlier session.
    pub fn authorized(address: &str) -> Self {
        let wallet = Self::new(address);
        wallet.authorized.store(true, Ordering::SeqCst);
        wallet
    }

    pub fn set_address(&self, address: &str) {
        *self.address.lock().unwrap() = address.to_string();
    }

    pub fn fail_connect(&self, error: WalletError) {
        *self.connect_error.lock().unwrap() = Some(error);
    }

    pub fn fail_disconnect(&self, error: WalletError) {
        *self.disconnect_error.lock().unwrap() = Some(error);
    }

    pub fn fail_sign(&self, error: WalletError) {
        *self.sign_error.lock().unwrap() = Some(error);
    }

    /// Hold `connect` calls until a permit is added.
    pub fn gate_connect(&self) -> Arc<Semaphore> {
        install_gate(&self.connect_gate)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self) -> Result<String, WalletError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.connect_gate).await;

        let error = self.connect_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }
        self.authorized.store(true, Ordering::SeqCst);
        Ok(self.address.lock().unwrap().clone())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let error = self.disconnect_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }
        self.authorized.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        if self.authorized.load(Ordering::SeqCst) {
            Ok(self.address.lock().unwrap().clone())
        } else {
            Err(WalletError::NotAuthorized)
        }
    }

    async fn sign(&self, payload: &str) -> Result<String, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        let error = self.sign_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }
        Ok(format!("signed:{}", payload))
    }
}

#[derive(Default)]
pub struct MockContract {
    simulate_outcomes: Mutex<HashMap<String, ContractError>>,
    submit_error: Mutex<Option<ContractError>>,
    simulate_gate: Mutex<Option<Arc<Semaphore>>>,
    submit_gate: Mutex<Option<Arc<Semaphore>>>,
    simulate_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    requests: Mutex<Vec<ClaimRequest>>,
}

impl MockContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make simulation fail for `receiver`. Other receivers simulate cleanly.
    pub fn reject_simulation(&self, receiver: &str, error: ContractError) {
        self.simulate_outcomes
            .lock()
            .unwrap()
            .insert(receiver.to_string(), error);
    }

    pub fn fail_submit(&self, error: ContractError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    pub fn gate_simulate(&self) -> Arc<Semaphore> {
        install_gate(&self.simulate_gate)
    }

    pub fn gate_submit(&self) -> Arc<Semaphore> {
        install_gate(&self.submit_gate)
    }

    pub fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Every request seen by simulate or submit, in call order.
    pub fn requests(&self) -> Vec<ClaimRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractClient for MockContract {
    async fn simulate_claim(&self, request: &ClaimRequest) -> Result<(), ContractError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        pass(&self.simulate_gate).await;

        let outcome = self
            .simulate_outcomes
            .lock()
            .unwrap()
            .get(&request.receiver)
            .cloned();
        match outcome {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn submit_claim(
        &self,
        request: &ClaimRequest,
        signer: &dyn WalletProvider,
    ) -> Result<ClaimReceipt, ContractError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        pass(&self.submit_gate).await;

        let payload = format!("claim:{}:{}:{}", request.index, request.receiver, request.amount);
        signer.sign(&payload).await?;

        let error = self.submit_error.lock().unwrap().clone();
        if let Some(error) = error {
            return Err(error);
        }
        Ok(ClaimReceipt {
            tx_hash: format!("tx-{}-{}", request.receiver, request.index),
            ledger: Some(42),
        })
    }
}
