//! Leaf dataset loading.
//!
//! The dataset is a JSON array of records shaped like
//! `{ "index": 0, "receiver": { "address": "G...", "amount": 100 }, "proofs": ["ab..", ...] }`.
//! Records are parsed into [`LeafEntry`] values before anything else sees them;
//! a malformed document becomes a [`DatasetState::Failed`] value, never a panic.

use crate::error::DatasetError;
use crate::types::{LeafEntry, ProofNode};
use crate::utils::{max_claim_amount, parse_base_units};
use ethers::types::U256;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// JSON embedded in configuration.
    Inline(String),
    /// JSON document on disk.
    File(PathBuf),
}

/// How records without an `index` field are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Reject the dataset.
    #[default]
    Required,
    /// Legacy contracts without indexing: use 0.
    DefaultToZero,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    index: Option<u32>,
    receiver: RawReceiver,
    #[serde(default)]
    proofs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawReceiver {
    address: String,
    amount: RawAmount,
}

/// Amounts above `u64` must be written as decimal strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(u64),
    Text(String),
}

impl RawAmount {
    fn to_u256(&self) -> Option<U256> {
        match self {
            RawAmount::Number(n) => Some(U256::from(*n)),
            RawAmount::Text(s) => parse_base_units(s),
        }
    }

    fn describe(&self) -> String {
        match self {
            RawAmount::Number(n) => n.to_string(),
            RawAmount::Text(s) => s.clone(),
        }
    }
}

/// Proof bytes are opaque here; only the contract checks them.
fn decode_proof_node(record: usize, node: usize, hex_str: &str) -> Result<ProofNode, DatasetError> {
    let trimmed = hex_str.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if stripped.is_empty() {
        return Err(DatasetError::InvalidProof {
            record,
            node,
            reason: "empty proof node".to_string(),
        });
    }
    hex::decode(stripped).map_err(|e| DatasetError::InvalidProof {
        record,
        node,
        reason: e.to_string(),
    })
}

fn convert_record(record: usize, raw: RawRecord, policy: IndexPolicy) -> Result<LeafEntry, DatasetError> {
    let address = raw.receiver.address.trim().to_string();
    if address.is_empty() {
        return Err(DatasetError::EmptyAddress { record });
    }

    let index = match (raw.index, policy) {
        (Some(index), _) => index,
        (None, IndexPolicy::DefaultToZero) => {
            warn!("Dataset record {} has no index, defaulting to 0", record);
            0
        }
        (None, IndexPolicy::Required) => return Err(DatasetError::MissingIndex { record }),
    };

    let amount = raw
        .receiver
        .amount
        .to_u256()
        .filter(|amount| *amount <= max_claim_amount())
        .ok_or_else(|| DatasetError::InvalidAmount {
            record,
            value: raw.receiver.amount.describe(),
        })?;

    let proof = raw
        .proofs
        .iter()
        .enumerate()
        .map(|(node, hex_str)| decode_proof_node(record, node, hex_str))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LeafEntry {
        index,
        address,
        amount,
        proof,
    })
}

/// Parse a JSON dataset document.
pub fn parse_dataset(json: &str, policy: IndexPolicy) -> Result<Vec<LeafEntry>, DatasetError> {
    let records: Vec<RawRecord> =
        serde_json::from_str(json).map_err(|e| DatasetError::Parse(e.to_string()))?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, raw)| convert_record(i, raw, policy))
        .collect()
}

/// Load and parse the dataset from its source.
pub async fn load(source: &DatasetSource, policy: IndexPolicy) -> Result<Vec<LeafEntry>, DatasetError> {
    match source {
        DatasetSource::Inline(json) => parse_dataset(json, policy),
        DatasetSource::File(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DatasetError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            parse_dataset(&content, policy)
        }
    }
}

/// Observable loading state of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetState {
    Loading,
    Loaded(Arc<[LeafEntry]>),
    Failed(DatasetError),
}

impl DatasetState {
    pub fn entries(&self) -> Option<&[LeafEntry]> {
        match self {
            DatasetState::Loaded(entries) => Some(&entries[..]),
            _ => None,
        }
    }
}

/// Single-writer container for the dataset state.
///
/// Other components only hold receivers from [`LeafDataset::subscribe`].
pub struct LeafDataset {
    state: watch::Sender<DatasetState>,
}

impl Default for LeafDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl LeafDataset {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DatasetState::Loading);
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<DatasetState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DatasetState {
        self.state.borrow().clone()
    }

    /// Load from `source` and publish the outcome.
    ///
    /// A missing source publishes [`DatasetError::Missing`].
    pub async fn load_from(&self, source: Option<&DatasetSource>, policy: IndexPolicy) -> DatasetState {
        self.state.send_replace(DatasetState::Loading);

        let outcome = match source {
            Some(source) => load(source, policy).await,
            None => Err(DatasetError::Missing),
        };

        let next = match outcome {
            Ok(entries) => {
                info!("Loaded {} dataset entries", entries.len());
                DatasetState::Loaded(entries.into())
            }
            Err(e) => {
                error!("Failed to load dataset: {}", e);
                DatasetState::Failed(e)
            }
        };
        self.state.send_replace(next.clone());
        next
    }
}
