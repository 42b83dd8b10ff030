//! Error taxonomy for the claim workflow.
//!
//! Every failure coming from an external collaborator (dataset source,
//! environment, wallet provider, contract) is mapped to one of these types at
//! the point where the collaborator is invoked. All of them are `Clone` so they
//! can live inside published state.

use thiserror::Error;

/// The leaf dataset could not be produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset not loaded: no proof data source configured")]
    Missing,
    #[error("failed to read dataset from {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("dataset is not valid JSON: {0}")]
    Parse(String),
    #[error("record {record}: address is empty")]
    EmptyAddress { record: usize },
    #[error("record {record}: index is missing")]
    MissingIndex { record: usize },
    #[error("record {record}: invalid amount '{value}'")]
    InvalidAmount { record: usize, value: String },
    #[error("record {record}: proof node {node} is invalid: {reason}")]
    InvalidProof {
        record: usize,
        node: usize,
        reason: String,
    },
}

/// Required configuration is absent or malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failures reported by the external wallet provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// No existing authorization. Expected on probe, never surfaced.
    #[error("wallet has not authorized this application")]
    NotAuthorized,
    #[error("request was rejected in the wallet")]
    UserRejected,
    #[error("wallet provider error: {0}")]
    Provider(String),
}

impl WalletError {
    /// Classify a raw provider message.
    ///
    /// Wallet extensions rarely return structured errors, so the message text
    /// is the only signal available.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("rejected")
            || lower.contains("denied")
            || lower.contains("declined")
            || lower.contains("cancel")
        {
            return WalletError::UserRejected;
        }

        if lower.contains("not authorized")
            || lower.contains("not connected")
            || lower.contains("not allowed")
        {
            return WalletError::NotAuthorized;
        }

        WalletError::Provider(message)
    }
}

/// Failures from simulating or submitting a claim against the contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("allocation already claimed")]
    AlreadyClaimed,
    #[error("proof rejected by the contract")]
    InvalidProof,
    #[error("contract returned error code {0}")]
    Code(u32),
    #[error("signing failed: {0}")]
    Signer(#[from] WalletError),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ContractError {
    /// Map a contract error code to its variant.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => ContractError::AlreadyClaimed,
            2 => ContractError::InvalidProof,
            other => ContractError::Code(other),
        }
    }
}

/// Returned by user-initiated claim actions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("claim is not available while {0}")]
    NotReady(&'static str),
    #[error("eligibility check cannot restart while {0}")]
    Busy(&'static str),
    #[error("claim failed: {0}")]
    Failed(String),
    #[error("claim result discarded: active address changed")]
    Superseded,
}
