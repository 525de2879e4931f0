//! Quorum-gated wallet
//!
//! Owners submit proposals, confirm or revoke them, and execute them once
//! the number of confirmations reaches the registry's quorum. Each
//! operation either succeeds completely or returns an error with no state
//! changed and no event emitted.

use crate::crypto::{sha256, Address};
use crate::multisig::call::RegistryCall;
use crate::multisig::error::WalletError;
use crate::multisig::events::{EventSink, WalletEvent};
use crate::multisig::executor::{Executor, OutgoingCall};
use crate::multisig::proposal::{Proposal, ProposalStatus};
use crate::multisig::registry::OwnerRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serialized form of the wallet state
#[derive(Clone, Debug, Serialize, Deserialize)]
struct WalletStateData {
    address: Address,
    label: Option<String>,
    registry: OwnerRegistry,
    proposals: Vec<Proposal>,
    balance: u128,
    created_at: DateTime<Utc>,
}

/// Serializable wallet state, independent of executor and observers
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "WalletStateData", into = "WalletStateData")]
pub struct WalletState {
    /// The wallet's own address; registry authority and self-call target
    pub address: Address,
    /// Optional human-readable label
    pub label: Option<String>,
    /// Owners and quorum
    pub registry: OwnerRegistry,
    /// Append-only proposal ledger
    pub proposals: Vec<Proposal>,
    /// Pooled value held by the wallet
    pub balance: u128,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl WalletState {
    /// Build the initial state for a new wallet
    pub fn new(
        owners: Vec<Address>,
        quorum: u32,
        max_owners: usize,
        label: Option<String>,
    ) -> Result<Self, WalletError> {
        let address = Self::generate_address(&owners, quorum, label.as_deref());
        let registry = OwnerRegistry::new(address, owners, quorum, max_owners)?;

        Ok(Self {
            address,
            label,
            registry,
            proposals: Vec::new(),
            balance: 0,
            created_at: Utc::now(),
        })
    }

    /// Derive the wallet address from its initial policy.
    ///
    /// Address = RIPEMD160(SHA256(quorum || sorted owners || label))
    fn generate_address(owners: &[Address], quorum: u32, label: Option<&str>) -> Address {
        let mut sorted = owners.to_vec();
        sorted.sort();

        let mut seed = quorum.to_be_bytes().to_vec();
        for owner in &sorted {
            seed.extend_from_slice(owner.as_bytes());
        }
        if let Some(label) = label {
            seed.extend_from_slice(&sha256(label.as_bytes()));
        }

        Address::from_seed(&seed)
    }
}

impl TryFrom<WalletStateData> for WalletState {
    type Error = WalletError;

    /// The registry must answer to the wallet's own address and proposal
    /// indices must run 0, 1, 2, ... without gaps
    fn try_from(data: WalletStateData) -> Result<Self, Self::Error> {
        if data.registry.authority() != data.address {
            return Err(WalletError::InconsistentState(format!(
                "registry authority {} is not the wallet address {}",
                data.registry.authority(),
                data.address
            )));
        }
        if let Some((position, proposal)) = data
            .proposals
            .iter()
            .enumerate()
            .find(|(position, proposal)| proposal.index != *position as u64)
        {
            return Err(WalletError::InconsistentState(format!(
                "transaction at position {} has index {}",
                position, proposal.index
            )));
        }

        Ok(Self {
            address: data.address,
            label: data.label,
            registry: data.registry,
            proposals: data.proposals,
            balance: data.balance,
            created_at: data.created_at,
        })
    }
}

impl From<WalletState> for WalletStateData {
    fn from(state: WalletState) -> Self {
        Self {
            address: state.address,
            label: state.label,
            registry: state.registry,
            proposals: state.proposals,
            balance: state.balance,
            created_at: state.created_at,
        }
    }
}

/// A multi-owner wallet bound to an executor and an event sink
pub struct MultisigWallet<E: Executor, S: EventSink> {
    state: WalletState,
    executor: E,
    sink: S,
}

impl<E: Executor, S: EventSink> MultisigWallet<E, S> {
    /// Create a new wallet.
    ///
    /// # Errors
    /// Returns the registry invariant error if the owner list or quorum is
    /// invalid.
    pub fn new(
        owners: Vec<Address>,
        quorum: u32,
        max_owners: usize,
        executor: E,
        sink: S,
    ) -> Result<Self, WalletError> {
        let state = WalletState::new(owners, quorum, max_owners, None)?;
        log::info!(
            "Wallet created: {} ({})",
            state.address,
            state.registry.description()
        );
        Ok(Self::from_state(state, executor, sink))
    }

    /// Resume a wallet from saved state
    pub fn from_state(state: WalletState, executor: E, sink: S) -> Self {
        Self {
            state,
            executor,
            sink,
        }
    }

    /// Split into state, executor and sink
    pub fn into_parts(self) -> (WalletState, E, S) {
        (self.state, self.executor, self.sink)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The wallet's own address
    pub fn address(&self) -> Address {
        self.state.address
    }

    /// Saved state
    pub fn state(&self) -> &WalletState {
        &self.state
    }

    /// Owner registry
    pub fn registry(&self) -> &OwnerRegistry {
        &self.state.registry
    }

    /// Owners in enumeration order
    pub fn owners(&self) -> &[Address] {
        self.state.registry.owners()
    }

    /// Whether `address` is an owner
    pub fn is_owner(&self, address: &Address) -> bool {
        self.state.registry.is_owner(address)
    }

    /// Current quorum
    pub fn quorum(&self) -> u32 {
        self.state.registry.quorum()
    }

    /// Pooled balance
    pub fn balance(&self) -> u128 {
        self.state.balance
    }

    /// Number of proposals ever submitted
    pub fn transaction_count(&self) -> u64 {
        self.state.proposals.len() as u64
    }

    /// Fetch a proposal by index
    pub fn transaction(&self, index: u64) -> Result<&Proposal, WalletError> {
        usize::try_from(index)
            .ok()
            .and_then(|slot| self.state.proposals.get(slot))
            .ok_or(WalletError::UnknownTransaction(index))
    }

    /// Whether `owner` has confirmed proposal `index`.
    ///
    /// Unknown indices report `false`.
    pub fn is_confirmed(&self, index: u64, owner: &Address) -> bool {
        self.transaction(index)
            .map(|p| p.is_confirmed_by(owner))
            .unwrap_or(false)
    }

    /// Every recorded confirmer of a proposal, including removed owners
    pub fn confirmers(&self, index: u64) -> Result<Vec<Address>, WalletError> {
        Ok(self.transaction(index)?.confirmers())
    }

    /// Confirmations on a proposal from addresses that are still owners.
    ///
    /// Diagnostic only; execution compares the recorded count to the quorum.
    pub fn active_confirmations(&self, index: u64) -> Result<u32, WalletError> {
        let proposal = self.transaction(index)?;
        Ok(proposal
            .confirmers()
            .iter()
            .filter(|owner| self.is_owner(owner))
            .count() as u32)
    }

    /// Count proposals by state
    pub fn transaction_count_filtered(&self, pending: bool, executed: bool) -> usize {
        self.state
            .proposals
            .iter()
            .filter(|p| matches_filter(p, pending, executed))
            .count()
    }

    /// Indices of proposals in `from..to` (clamped) matching the state filter
    pub fn transaction_ids(&self, from: u64, to: u64, pending: bool, executed: bool) -> Vec<u64> {
        self.state
            .proposals
            .iter()
            .filter(|p| p.index >= from && p.index < to)
            .filter(|p| matches_filter(p, pending, executed))
            .map(|p| p.index)
            .collect()
    }

    /// The executor
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Mutable access to the executor
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// The event sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Record incoming value that arrived without a call.
    ///
    /// Returns the resulting balance.
    pub fn deposit(&mut self, sender: Address, amount: u128) -> u128 {
        self.state.balance = self.state.balance.saturating_add(amount);
        self.sink.emit(&WalletEvent::Deposit {
            sender,
            amount,
            balance: self.state.balance,
        });

        log::info!("Deposit of {} from {}", amount, sender);
        self.state.balance
    }

    /// Append a new proposal. Returns its index.
    ///
    /// Submission does not confirm the proposal and moves no value.
    pub fn submit(
        &mut self,
        caller: Address,
        destination: Address,
        value: u128,
        data: Vec<u8>,
    ) -> Result<u64, WalletError> {
        self.require_owner(&caller)?;

        let index = self.transaction_count();
        let proposal = Proposal::new(index, caller, destination, value, data);
        let event = WalletEvent::Submission {
            submitter: caller,
            index,
            destination,
            value,
            data: proposal.data.clone(),
        };
        self.state.proposals.push(proposal);
        self.sink.emit(&event);

        log::info!(
            "Transaction {} submitted by {}: {} to {}",
            index,
            caller,
            value,
            destination
        );
        Ok(index)
    }

    /// Submit a registry change addressed to the wallet itself
    pub fn submit_registry_call(
        &mut self,
        caller: Address,
        call: &RegistryCall,
    ) -> Result<u64, WalletError> {
        let address = self.address();
        self.submit(caller, address, 0, call.encode())
    }

    /// Confirm a proposal
    pub fn confirm(&mut self, caller: Address, index: u64) -> Result<(), WalletError> {
        self.require_owner(&caller)?;
        let proposal = self.pending_mut(index)?;
        if proposal.is_confirmed_by(&caller) {
            return Err(WalletError::AlreadyConfirmed {
                index,
                owner: caller,
            });
        }

        proposal.record_confirmation(caller);
        let count = proposal.confirmations;
        self.sink.emit(&WalletEvent::Confirmation {
            owner: caller,
            index,
        });

        log::info!(
            "Transaction {} confirmed by {} ({}/{})",
            index,
            caller,
            count,
            self.quorum()
        );
        Ok(())
    }

    /// Withdraw a previous confirmation
    pub fn revoke(&mut self, caller: Address, index: u64) -> Result<(), WalletError> {
        self.require_owner(&caller)?;
        let proposal = self.pending_mut(index)?;
        if !proposal.is_confirmed_by(&caller) {
            return Err(WalletError::NotConfirmed {
                index,
                owner: caller,
            });
        }

        proposal.record_revocation(caller);
        self.sink.emit(&WalletEvent::Revocation {
            owner: caller,
            index,
        });

        log::info!("Transaction {} revoked by {}", index, caller);
        Ok(())
    }

    /// Execute a proposal that has reached the quorum.
    ///
    /// The quorum is read now, not when the proposal was submitted or
    /// confirmed. The proposal is marked executed before the outgoing call;
    /// if the call fails the mark and any value debit are undone and
    /// `ExecutionFailed` is returned.
    pub fn execute(&mut self, caller: Address, index: u64) -> Result<(), WalletError> {
        self.require_owner(&caller)?;
        let quorum = self.quorum();
        let wallet = self.address();

        let proposal = self.pending_mut(index)?;
        if !proposal.meets_quorum(quorum) {
            return Err(WalletError::InsufficientConfirmations {
                have: proposal.confirmations,
                need: quorum,
            });
        }

        let call = OutgoingCall {
            wallet,
            index,
            destination: proposal.destination,
            value: proposal.value,
            data: proposal.data.clone(),
        };

        // Commit before calling out
        proposal.mark_executed();

        match self.dispatch(&call) {
            Ok(registry_events) => {
                for event in &registry_events {
                    self.sink.emit(event);
                }
                self.sink.emit(&WalletEvent::Execution {
                    executor: caller,
                    index,
                });

                log::info!("Transaction {} executed by {}", index, caller);
                Ok(())
            }
            Err(reason) => {
                if let Ok(proposal) = self.proposal_mut(index) {
                    proposal.unmark_executed();
                }

                log::warn!("Transaction {} execution failed: {}", index, reason);
                Err(WalletError::ExecutionFailed { index, reason })
            }
        }
    }

    /// Perform the outgoing call for an executing proposal.
    ///
    /// Leaves balance and registry untouched on failure.
    fn dispatch(&mut self, call: &OutgoingCall) -> Result<Vec<WalletEvent>, String> {
        if call.destination == self.state.address {
            return self.dispatch_self_call(call);
        }

        if call.value > self.state.balance {
            return Err(format!(
                "insufficient balance: have {}, need {}",
                self.state.balance, call.value
            ));
        }

        let previous = self.state.balance;
        self.state.balance -= call.value;
        if !self.executor.invoke(call) {
            self.state.balance = previous;
            return Err("call reverted".to_string());
        }

        Ok(Vec::new())
    }

    /// Apply a registry call as the wallet itself, on a staged copy
    fn dispatch_self_call(&mut self, call: &OutgoingCall) -> Result<Vec<WalletEvent>, String> {
        if call.value != 0 {
            return Err("self-call cannot carry value".to_string());
        }

        let registry_call = RegistryCall::decode(&call.data).map_err(|e| e.to_string())?;
        let mut staged = self.state.registry.clone();
        let events = registry_call
            .apply(&mut staged, &self.state.address)
            .map_err(|e| e.to_string())?;

        self.state.registry = staged;
        Ok(events)
    }

    fn require_owner(&self, caller: &Address) -> Result<(), WalletError> {
        if !self.is_owner(caller) {
            return Err(WalletError::NotOwner(*caller));
        }
        Ok(())
    }

    /// Look up a proposal that may still change
    fn pending_mut(&mut self, index: u64) -> Result<&mut Proposal, WalletError> {
        let proposal = self.proposal_mut(index)?;
        if proposal.executed {
            return Err(WalletError::AlreadyExecuted(index));
        }
        Ok(proposal)
    }

    fn proposal_mut(&mut self, index: u64) -> Result<&mut Proposal, WalletError> {
        usize::try_from(index)
            .ok()
            .and_then(|slot| self.state.proposals.get_mut(slot))
            .ok_or(WalletError::UnknownTransaction(index))
    }
}

fn matches_filter(proposal: &Proposal, pending: bool, executed: bool) -> bool {
    match proposal.status() {
        ProposalStatus::Proposed => pending,
        ProposalStatus::Executed => executed,
    }
}
