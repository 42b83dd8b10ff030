use crate::dataset::DatasetState;
use crate::error::DatasetError;
use crate::types::LeafEntry;

/// First entry whose address equals `address`.
pub fn resolve<'a>(address: &str, entries: &'a [LeafEntry]) -> Option<&'a LeafEntry> {
    entries.iter().find(|entry| entry.address == address)
}

/// Outcome of looking up the active address in the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryResolution {
    NoAddress,
    DatasetLoading,
    DatasetUnavailable(DatasetError),
    NoAllocation,
    Found(LeafEntry),
}

impl EntryResolution {
    pub fn evaluate(address: Option<&str>, dataset: &DatasetState) -> Self {
        let Some(address) = address else {
            return EntryResolution::NoAddress;
        };
        match dataset {
            DatasetState::Loading => EntryResolution::DatasetLoading,
            DatasetState::Failed(e) => EntryResolution::DatasetUnavailable(e.clone()),
            DatasetState::Loaded(entries) => match resolve(address, entries) {
                Some(entry) => EntryResolution::Found(entry.clone()),
                None => EntryResolution::NoAllocation,
            },
        }
    }

    pub fn entry(&self) -> Option<&LeafEntry> {
        match self {
            EntryResolution::Found(entry) => Some(entry),
            _ => None,
        }
    }
}
