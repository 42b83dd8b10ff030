//! Claim workflow controller.
//!
//! Owns the eligibility-check / submit state machine. The controller reads the
//! wallet session and the dataset through `watch` receivers and is the only
//! writer of [`ClaimState`].
//!
//! Every eligibility check is tagged with the address generation it was issued for.
//! When the active address changes the generation moves on, and a response for
//! an older generation is dropped instead of being applied. Submissions are
//! tracked by receiver instead: a claim relayed for an address stays pending
//! for that address across wallet switches until the relay answers.

use crate::contract::ContractClient;
use crate::dataset::DatasetState;
use crate::error::{ClaimError, ContractError};
use crate::resolver::resolve;
use crate::types::{ClaimReceipt, ClaimRequest};
use crate::wallet::{WalletProvider, WalletSession};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Why the active address cannot claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    /// The address is not in the dataset. No simulation was issued.
    NoAllocation,
    AlreadyClaimed,
    InvalidProof,
    /// Any other contract-level rejection.
    Rejected(String),
    /// The simulation never reached the contract.
    Unreachable(String),
}

impl From<ContractError> for Ineligibility {
    fn from(error: ContractError) -> Self {
        match error {
            ContractError::AlreadyClaimed => Ineligibility::AlreadyClaimed,
            ContractError::InvalidProof => Ineligibility::InvalidProof,
            ContractError::Transport(msg) => Ineligibility::Unreachable(msg),
            other @ (ContractError::Code(_) | ContractError::Signer(_)) => {
                Ineligibility::Rejected(other.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClaimState {
    #[default]
    Idle,
    CheckingEligibility,
    Eligible,
    NotEligible(Ineligibility),
    Submitting,
    Submitted(ClaimReceipt),
    Failed(String),
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimEvent {
    /// Prerequisites lost or address changed.
    Reset,
    CheckStarted,
    AllocationMissing,
    /// A check was dropped before its simulation answered.
    CheckAbandoned,
    SimulationSucceeded,
    SimulationRejected(Ineligibility),
    SubmitRequested,
    /// The active address came back while its submission is still pending.
    SubmissionResumed,
    SubmitSucceeded(ClaimReceipt),
    SubmitFailed(String),
}

impl ClaimState {
    /// A simulate or submit call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, ClaimState::CheckingEligibility | ClaimState::Submitting)
    }

    pub fn can_submit(&self) -> bool {
        matches!(self, ClaimState::Eligible)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClaimState::Idle => "idle",
            ClaimState::CheckingEligibility => "checking eligibility",
            ClaimState::Eligible => "eligible",
            ClaimState::NotEligible(_) => "not eligible",
            ClaimState::Submitting => "submitting",
            ClaimState::Submitted(_) => "submitted",
            ClaimState::Failed(_) => "failed",
        }
    }

    /// Transition function. `None` means the event is not valid here.
    pub fn next(&self, event: &ClaimEvent) -> Option<ClaimState> {
        use ClaimEvent as E;
        use ClaimState as S;

        match (self, event) {
            (_, E::Reset) => Some(S::Idle),
            (state, E::CheckStarted) if !state.is_busy() => Some(S::CheckingEligibility),
            (state, E::AllocationMissing) if !state.is_busy() => {
                Some(S::NotEligible(Ineligibility::NoAllocation))
            }
            (S::CheckingEligibility, E::CheckAbandoned) => Some(S::Idle),
            (S::CheckingEligibility, E::SimulationSucceeded) => Some(S::Eligible),
            (S::CheckingEligibility, E::SimulationRejected(reason)) => {
                Some(S::NotEligible(reason.clone()))
            }
            (S::Eligible, E::SubmitRequested) => Some(S::Submitting),
            (S::Idle, E::SubmissionResumed) => Some(S::Submitting),
            (S::Submitting, E::SubmitSucceeded(receipt)) => Some(S::Submitted(receipt.clone())),
            (S::Submitting, E::SubmitFailed(reason)) => Some(S::Failed(reason.clone())),
            _ => None,
        }
    }
}

/// Per-address bookkeeping.
#[derive(Debug, Default)]
struct Tracking {
    address: Option<String>,
    generation: u64,
    /// Set once the automatic check ran for this address.
    checked: bool,
    /// A simulation for the current generation is outstanding.
    in_flight: bool,
    /// Receivers with a relayed claim that has not answered yet.
    submitting: HashSet<String>,
}

impl Tracking {
    fn owns(&self, receiver: &str) -> bool {
        self.address.as_deref() == Some(receiver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Eligibility,
    Submission,
}

/// An outstanding remote call.
///
/// Dropping it is the cleanup path: it releases the in-flight guard whether
/// the call answered, failed or was cancelled.
struct InFlightCall {
    controller: ClaimController,
    generation: u64,
    kind: CallKind,
    request: ClaimRequest,
    settled: bool,
}

impl InFlightCall {
    fn settle_check(mut self, outcome: Result<(), ContractError>) {
        self.settled = true;
        let mut tracking = self.controller.tracking();
        if tracking.generation != self.generation {
            debug!(
                "Discarding stale eligibility result for {}",
                self.request.receiver
            );
            return;
        }

        // The wallet moved on but sync has not caught up yet.
        if !self.controller.session_is(&self.request.receiver) {
            debug!(
                "Discarding eligibility result for {}: no longer the active address",
                self.request.receiver
            );
            tracking.checked = false;
            self.controller.apply(ClaimEvent::CheckAbandoned);
            return;
        }

        match outcome {
            Ok(()) => {
                info!("{} is eligible to claim", self.request.receiver);
                self.controller.apply(ClaimEvent::SimulationSucceeded);
            }
            Err(e) => {
                info!("{} is not eligible: {}", self.request.receiver, e);
                self.controller
                    .apply(ClaimEvent::SimulationRejected(Ineligibility::from(e)));
            }
        }
    }

    fn settle_submit(
        mut self,
        outcome: Result<ClaimReceipt, ContractError>,
    ) -> Result<ClaimReceipt, ClaimError> {
        self.settled = true;
        let mut tracking = self.controller.tracking();
        tracking.submitting.remove(&self.request.receiver);
        if !tracking.owns(&self.request.receiver)
            || !self.controller.session_is(&self.request.receiver)
        {
            match &outcome {
                Ok(receipt) => info!(
                    "Claim for {} relayed as {} after the active address changed",
                    self.request.receiver, receipt.tx_hash
                ),
                Err(e) => warn!(
                    "Claim for {} failed after the active address changed: {}",
                    self.request.receiver, e
                ),
            }
            return Err(ClaimError::Superseded);
        }
        tracking.checked = true;

        match outcome {
            Ok(receipt) => {
                info!(
                    "Claim for {} submitted: {}",
                    self.request.receiver, receipt.tx_hash
                );
                self.controller
                    .apply(ClaimEvent::SubmitSucceeded(receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Claim for {} failed: {}", self.request.receiver, reason);
                self.controller.apply(ClaimEvent::SubmitFailed(reason.clone()));
                Err(ClaimError::Failed(reason))
            }
        }
    }
}

impl Drop for InFlightCall {
    fn drop(&mut self) {
        let mut tracking = self.controller.tracking();

        match self.kind {
            CallKind::Eligibility => {
                if tracking.generation != self.generation {
                    return;
                }
                tracking.in_flight = false;
                if !self.settled {
                    warn!(
                        "Eligibility check for {} was cancelled",
                        self.request.receiver
                    );
                    tracking.checked = false;
                    self.controller.apply(ClaimEvent::CheckAbandoned);
                }
            }
            CallKind::Submission => {
                tracking.submitting.remove(&self.request.receiver);
                if !self.settled {
                    warn!("Claim submission for {} was cancelled", self.request.receiver);
                    if !tracking.owns(&self.request.receiver) {
                        return;
                    }
                    tracking.checked = true;
                    self.controller.apply(ClaimEvent::SubmitFailed(
                        "submission was interrupted before the relay answered".to_string(),
                    ));
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct ClaimController {
    contract: Arc<dyn ContractClient>,
    signer: Arc<dyn WalletProvider>,
    session: watch::Receiver<WalletSession>,
    dataset: watch::Receiver<DatasetState>,
    state: Arc<watch::Sender<ClaimState>>,
    tracking: Arc<Mutex<Tracking>>,
}

impl ClaimController {
    pub fn new(
        contract: Arc<dyn ContractClient>,
        signer: Arc<dyn WalletProvider>,
        session: watch::Receiver<WalletSession>,
        dataset: watch::Receiver<DatasetState>,
    ) -> Self {
        let (state, _) = watch::channel(ClaimState::Idle);
        Self {
            contract,
            signer,
            session,
            dataset,
            state: Arc::new(state),
            tracking: Arc::new(Mutex::new(Tracking::default())),
        }
    }

    pub fn state(&self) -> ClaimState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClaimState> {
        self.state.subscribe()
    }

    /// The state as it applies to `address`.
    ///
    /// Right after a wallet switch the published state still belongs to the
    /// previous address until [`ClaimController::sync`] catches up. For any
    /// address other than the tracked one this reports a pending check.
    pub fn state_for(&self, address: Option<&str>) -> ClaimState {
        let tracking = self.tracking();
        if tracking.address.as_deref() == address {
            return self.state();
        }
        match address {
            Some(_) => ClaimState::CheckingEligibility,
            None => ClaimState::Idle,
        }
    }

    fn session_is(&self, receiver: &str) -> bool {
        self.session.borrow().active_address() == Some(receiver)
    }

    // Lock order is always tracking, then state.
    fn tracking(&self) -> MutexGuard<'_, Tracking> {
        self.tracking.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `event`, returning whether it was valid in the current state.
    fn apply(&self, event: ClaimEvent) -> bool {
        let mut accepted = true;
        self.state.send_if_modified(|state| match state.next(&event) {
            Some(next) if next == *state => false,
            Some(next) => {
                debug!("Claim state {} -> {}", state.label(), next.label());
                *state = next;
                true
            }
            None => {
                accepted = false;
                debug!("Ignoring {:?} while {}", event, state.label());
                false
            }
        });
        accepted
    }

    /// Reconcile with the current wallet session and dataset and, when all
    /// prerequisites hold and no check ran yet for this address, run the
    /// eligibility check.
    ///
    /// Concurrent calls are safe: at most one check per address is in flight.
    pub async fn sync(&self) {
        let Some(call) = self.plan_check() else {
            return;
        };

        debug!(
            "Simulating claim #{} for {}",
            call.request.index, call.request.receiver
        );
        let outcome = self.contract.simulate_claim(&call.request).await;
        call.settle_check(outcome);
    }

    fn plan_check(&self) -> Option<InFlightCall> {
        let session = self.session.borrow().clone();
        let dataset = self.dataset.borrow().clone();
        let active = session.active_address();

        let mut tracking = self.tracking();
        if tracking.address.as_deref() != active {
            match active {
                Some(address) => info!("Active address is now {}", address),
                None => info!("No active wallet address"),
            }
            tracking.address = active.map(str::to_string);
            tracking.generation += 1;
            tracking.checked = false;
            tracking.in_flight = false;
            self.apply(ClaimEvent::Reset);
        }

        let address = active?;
        if tracking.submitting.contains(address) {
            if self.apply(ClaimEvent::SubmissionResumed) {
                info!("Claim for {} is still being relayed", address);
            }
            return None;
        }

        let Some(entries) = dataset.entries() else {
            if !tracking.in_flight && !self.state.borrow().is_busy() {
                tracking.checked = false;
                self.apply(ClaimEvent::Reset);
            }
            return None;
        };

        if tracking.checked || tracking.in_flight {
            return None;
        }
        tracking.checked = true;

        let Some(entry) = resolve(address, entries) else {
            info!("No allocation found for {}", address);
            self.apply(ClaimEvent::AllocationMissing);
            return None;
        };

        if !self.apply(ClaimEvent::CheckStarted) {
            return None;
        }
        tracking.in_flight = true;

        Some(InFlightCall {
            controller: self.clone(),
            generation: tracking.generation,
            kind: CallKind::Eligibility,
            request: ClaimRequest::new(entry, address),
            settled: false,
        })
    }

    /// Explicitly re-run the eligibility check, e.g. after a failed claim.
    pub async fn recheck(&self) -> Result<(), ClaimError> {
        {
            let mut tracking = self.tracking();
            let state = self.state();
            if state.is_busy() {
                return Err(ClaimError::Busy(state.label()));
            }
            tracking.checked = false;
        }
        self.sync().await;
        Ok(())
    }

    /// Submit the claim for the active address. Only valid while eligible.
    ///
    /// The state leaves `Eligible` before the first await, so repeated
    /// activation cannot issue a second submission.
    pub async fn submit(&self) -> Result<ClaimReceipt, ClaimError> {
        let call = self.plan_submit()?;

        info!(
            "Submitting claim #{} for {}",
            call.request.index, call.request.receiver
        );
        debug!("Claim proof: [{}]", call.request.proof_hex().join(", "));
        let outcome = self
            .contract
            .submit_claim(&call.request, self.signer.as_ref())
            .await;
        call.settle_submit(outcome)
    }

    fn plan_submit(&self) -> Result<InFlightCall, ClaimError> {
        let session = self.session.borrow().clone();
        let dataset = self.dataset.borrow().clone();

        let mut tracking = self.tracking();
        let state = self.state();
        if !state.can_submit() {
            return Err(ClaimError::NotReady(state.label()));
        }

        let request = session
            .active_address()
            .filter(|address| tracking.address.as_deref() == Some(*address))
            .and_then(|address| {
                let entries = dataset.entries()?;
                resolve(address, entries).map(|entry| ClaimRequest::new(entry, address))
            })
            .ok_or(ClaimError::NotReady("the wallet or dataset is unavailable"))?;

        if tracking.submitting.contains(&request.receiver) {
            return Err(ClaimError::NotReady(ClaimState::Submitting.label()));
        }
        if !self.apply(ClaimEvent::SubmitRequested) {
            return Err(ClaimError::NotReady(self.state().label()));
        }
        tracking.submitting.insert(request.receiver.clone());

        Ok(InFlightCall {
            controller: self.clone(),
            generation: tracking.generation,
            kind: CallKind::Submission,
            request,
            settled: false,
        })
    }

    /// Drive automatic eligibility checks from wallet and dataset changes.
    ///
    /// Each change spawns a [`ClaimController::sync`] so a pending simulation
    /// never blocks observation of the next address change. Returns when either
    /// source is closed.
    pub async fn run(self) {
        let mut session = self.session.clone();
        let mut dataset = self.dataset.clone();

        loop {
            let controller = self.clone();
            tokio::spawn(async move { controller.sync().await });

            tokio::select! {
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = dataset.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Claim controller stopped: state source closed");
    }
}
