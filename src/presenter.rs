//! Status presenter.
//!
//! Derives the single user-facing status line and the claim trigger's
//! enabled state from the controller state, the wallet session and the entry
//! resolution. Pure; recompute it on every change.

use crate::claim::{ClaimState, Ineligibility};
use crate::config::Config;
use crate::error::ConfigError;
use crate::resolver::EntryResolution;
use crate::types::LeafEntry;
use crate::utils::format_token_amount;
use crate::wallet::WalletSession;

pub const CLAIM_LABEL: &str = "Claim";
pub const PROCESSING_LABEL: &str = "Processing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub message: String,
    pub severity: Severity,
    pub action_enabled: bool,
    pub action_label: String,
    /// Label for the connect/disconnect button.
    pub wallet_label: String,
    /// Explorer link for a submitted claim.
    pub link: Option<String>,
}

impl StatusView {
    fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            action_enabled: false,
            action_label: CLAIM_LABEL.to_string(),
            wallet_label: "Connect Wallet".to_string(),
            link: None,
        }
    }

    /// Status shown when required configuration is missing at startup.
    pub fn startup_failure(error: &ConfigError) -> Self {
        Self::new(format!("Configuration error: {}", error), Severity::Error)
    }
}

/// `GABCDEF...` -> `GABC...WXYZ`. Short or non-ASCII input is returned as is.
pub fn short_address(address: &str) -> String {
    if address.len() <= 8 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..4], &address[address.len() - 4..])
}

fn wallet_label(session: &WalletSession) -> String {
    if session.connecting {
        return "Connecting...".to_string();
    }
    match session.active_address() {
        Some(address) => short_address(address),
        None => "Connect Wallet".to_string(),
    }
}

fn ineligibility_status(reason: &Ineligibility) -> (String, Severity) {
    match reason {
        Ineligibility::NoAllocation => (
            "No airdrop allocation found for this wallet.".to_string(),
            Severity::Error,
        ),
        Ineligibility::AlreadyClaimed => (
            "This allocation has already been claimed.".to_string(),
            Severity::Error,
        ),
        Ineligibility::InvalidProof => (
            "The contract rejected the proof for this wallet.".to_string(),
            Severity::Error,
        ),
        Ineligibility::Rejected(msg) => (format!("Claim not available: {}", msg), Severity::Error),
        Ineligibility::Unreachable(msg) => (
            format!("Could not reach the airdrop contract: {}", msg),
            Severity::Warning,
        ),
    }
}

fn entry_status(state: &ClaimState, entry: &LeafEntry, config: &Config) -> StatusView {
    let amount = format!(
        "{} {}",
        format_token_amount(entry.amount, config.token_decimals),
        config.token_symbol
    );

    let mut view = match state {
        ClaimState::Idle => StatusView::new("Preparing eligibility check...", Severity::Info),
        ClaimState::CheckingEligibility => StatusView::new(
            format!("Checking eligibility for {}...", amount),
            Severity::Info,
        ),
        ClaimState::Eligible => {
            StatusView::new(format!("You can claim {}.", amount), Severity::Success)
        }
        ClaimState::NotEligible(reason) => {
            let (message, severity) = ineligibility_status(reason);
            StatusView::new(message, severity)
        }
        ClaimState::Submitting => {
            StatusView::new(format!("Submitting claim for {}...", amount), Severity::Info)
        }
        ClaimState::Submitted(receipt) => {
            let mut view = StatusView::new(
                format!("Claimed {}. Transaction {}", amount, short_address(&receipt.tx_hash)),
                Severity::Success,
            );
            view.link = config.tx_explorer_url(&receipt.tx_hash);
            view
        }
        ClaimState::Failed(reason) => {
            StatusView::new(format!("Claim failed: {}", reason), Severity::Error)
        }
    };

    view.action_label = format!("{} {}", CLAIM_LABEL, amount);
    view.action_enabled = state.can_submit();
    view
}

/// Derive the status for one snapshot of the workflow.
///
/// The trigger is enabled only when the wallet is connected, an entry was
/// resolved and the controller is exactly `Eligible`.
pub fn present(
    state: &ClaimState,
    session: &WalletSession,
    resolution: &EntryResolution,
    config: &Config,
) -> StatusView {
    let mut view = if session.active_address().is_none() {
        if session.connecting {
            StatusView::new("Waiting for wallet approval...", Severity::Info)
        } else {
            StatusView::new(
                "Please connect your wallet first to claim tokens.",
                Severity::Info,
            )
        }
    } else {
        match resolution {
            EntryResolution::NoAddress => StatusView::new(
                "Please connect your wallet first to claim tokens.",
                Severity::Info,
            ),
            EntryResolution::DatasetLoading => {
                StatusView::new("Loading airdrop data...", Severity::Info)
            }
            EntryResolution::DatasetUnavailable(e) => StatusView::new(
                format!("Airdrop data unavailable: {}", e),
                Severity::Warning,
            ),
            EntryResolution::NoAllocation => {
                let (message, severity) = ineligibility_status(&Ineligibility::NoAllocation);
                StatusView::new(message, severity)
            }
            EntryResolution::Found(entry) => entry_status(state, entry, config),
        }
    };

    if state.is_busy() {
        view.action_label = PROCESSING_LABEL.to_string();
        view.action_enabled = false;
    }
    view.wallet_label = wallet_label(session);
    view
}
