//! Boundary to the remote airdrop contract.
//!
//! Proof verification and the claimed-set live in the contract; a client only
//! dry-runs and relays `claim` calls.

use crate::error::ContractError;
use crate::types::{ClaimReceipt, ClaimRequest};
use crate::wallet::WalletProvider;
use async_trait::async_trait;

#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Dry-run `claim` without committing state.
    ///
    /// Application errors come back as [`ContractError::AlreadyClaimed`],
    /// [`ContractError::InvalidProof`] or [`ContractError::Code`], mapped from
    /// the contract's numeric code with [`ContractError::from_code`]; network
    /// failures as [`ContractError::Transport`].
    async fn simulate_claim(&self, request: &ClaimRequest) -> Result<(), ContractError>;

    /// Assemble the `claim` transaction, have `signer` sign it and relay it.
    async fn submit_claim(
        &self,
        request: &ClaimRequest,
        signer: &dyn WalletProvider,
    ) -> Result<ClaimReceipt, ContractError>;
}
