//! Common types shared across modules.

use ethers::types::U256;

/// One sibling hash of a Merkle proof, as verified by the contract.
pub type ProofNode = Vec<u8>;

/// One row of the eligibility dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    pub index: u32,
    pub address: String,
    /// Allocation in the token's smallest unit.
    pub amount: U256,
    pub proof: Vec<ProofNode>,
}

/// Arguments of a `claim` contract call.
///
/// Built fresh from the resolved entry and the active address for every
/// simulate or submit call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub index: u32,
    pub receiver: String,
    pub amount: U256,
    pub proof: Vec<ProofNode>,
}

impl ClaimRequest {
    pub fn new(entry: &LeafEntry, receiver: &str) -> Self {
        Self {
            index: entry.index,
            receiver: receiver.to_string(),
            amount: entry.amount,
            proof: entry.proof.clone(),
        }
    }

    /// Proof nodes hex-encoded, in order.
    pub fn proof_hex(&self) -> Vec<String> {
        self.proof.iter().map(hex::encode).collect()
    }
}

/// Result of a claim transaction accepted by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub tx_hash: String,
    pub ledger: Option<u32>,
}
