//! Client-side claim workflow for Merkle token distributions on Soroban.
//!
//! Loads the leaf dataset, tracks the wallet session, resolves the connected
//! address to its allocation, simulates the `claim` call for eligibility and
//! relays the signed claim. Proof verification and double-claim protection
//! stay in the contract.

pub mod claim;
pub mod config;
pub mod contract;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod presenter;
pub mod resolver;
pub mod rpc;
pub mod session;
pub mod types;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use claim::{ClaimController, ClaimState, Ineligibility};
pub use config::Config;
pub use contract::ContractClient;
pub use dataset::{DatasetSource, DatasetState, IndexPolicy, LeafDataset};
pub use error::{ClaimError, ConfigError, ContractError, DatasetError, WalletError};
pub use presenter::{present, Severity, StatusView};
pub use resolver::{resolve, EntryResolution};
pub use session::ClaimSession;
pub use types::{ClaimReceipt, ClaimRequest, LeafEntry};
pub use wallet::{WalletProvider, WalletSession, WalletSessionManager};
