//! Proposals and their confirmation ledgers
//!
//! A proposal records an intent to call the execution primitive with a
//! destination, value and opaque payload. Owners confirm or revoke until
//! the proposal is executed, after which it is frozen.

use crate::crypto::Address;
use crate::multisig::error::WalletError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialize payload bytes as a hex string
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of a proposal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Collecting confirmations
    Proposed,
    /// Executed; terminal
    Executed,
}

/// Per-proposal record of which owners have confirmed.
///
/// Entries are kept after revocation (flag false) and are never purged when
/// an owner leaves the registry.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationLedger(BTreeMap<Address, bool>);

impl ConfirmationLedger {
    /// Whether `owner` currently confirms
    pub fn is_confirmed(&self, owner: &Address) -> bool {
        self.0.get(owner).copied().unwrap_or(false)
    }

    /// Owners whose flag is set, in address order
    pub fn confirmers(&self) -> Vec<Address> {
        self.0
            .iter()
            .filter(|(_, confirmed)| **confirmed)
            .map(|(owner, _)| *owner)
            .collect()
    }

    /// Number of owners whose flag is set
    pub fn count(&self) -> usize {
        self.0.values().filter(|confirmed| **confirmed).count()
    }

    fn set(&mut self, owner: Address, confirmed: bool) {
        self.0.insert(owner, confirmed);
    }
}

/// Serialized form of a proposal
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ProposalData {
    index: u64,
    submitter: Address,
    destination: Address,
    value: u128,
    #[serde(with = "hex_bytes")]
    data: Vec<u8>,
    executed: bool,
    confirmations: u32,
    ledger: ConfirmationLedger,
    submitted_at: DateTime<Utc>,
    executed_at: Option<DateTime<Utc>>,
}

/// A submitted transaction
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ProposalData", into = "ProposalData")]
pub struct Proposal {
    /// Position in the ledger
    pub index: u64,
    /// Owner that submitted the proposal
    pub submitter: Address,
    /// Call destination
    pub destination: Address,
    /// Value to send
    pub value: u128,
    /// Opaque call payload
    pub data: Vec<u8>,
    /// Whether the proposal has been executed
    pub executed: bool,
    /// Number of confirmations currently recorded
    pub confirmations: u32,
    /// Who has confirmed
    ledger: ConfirmationLedger,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
    /// Execution timestamp
    pub executed_at: Option<DateTime<Utc>>,
}

impl Proposal {
    /// Create an unconfirmed proposal
    pub fn new(
        index: u64,
        submitter: Address,
        destination: Address,
        value: u128,
        data: Vec<u8>,
    ) -> Self {
        Self {
            index,
            submitter,
            destination,
            value,
            data,
            executed: false,
            confirmations: 0,
            ledger: ConfirmationLedger::default(),
            submitted_at: Utc::now(),
            executed_at: None,
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else {
            ProposalStatus::Proposed
        }
    }

    /// Whether `owner` has confirmed this proposal
    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.ledger.is_confirmed(owner)
    }

    /// Everyone who currently confirms, including owners since removed
    pub fn confirmers(&self) -> Vec<Address> {
        self.ledger.confirmers()
    }

    /// The confirmation ledger
    pub fn ledger(&self) -> &ConfirmationLedger {
        &self.ledger
    }

    /// Whether enough confirmations are recorded for `quorum`
    pub fn meets_quorum(&self, quorum: u32) -> bool {
        self.confirmations >= quorum
    }

    pub(crate) fn record_confirmation(&mut self, owner: Address) {
        self.ledger.set(owner, true);
        self.confirmations += 1;
    }

    pub(crate) fn record_revocation(&mut self, owner: Address) {
        self.ledger.set(owner, false);
        self.confirmations = self.confirmations.saturating_sub(1);
    }

    pub(crate) fn mark_executed(&mut self) {
        self.executed = true;
        self.executed_at = Some(Utc::now());
    }

    pub(crate) fn unmark_executed(&mut self) {
        self.executed = false;
        self.executed_at = None;
    }
}

impl TryFrom<ProposalData> for Proposal {
    type Error = WalletError;

    /// The stored count must equal the number of set ledger flags
    fn try_from(data: ProposalData) -> Result<Self, Self::Error> {
        let recorded = data.ledger.count();
        if recorded != data.confirmations as usize {
            return Err(WalletError::InconsistentState(format!(
                "transaction {} records {} confirmations but {} confirmers",
                data.index, data.confirmations, recorded
            )));
        }

        Ok(Self {
            index: data.index,
            submitter: data.submitter,
            destination: data.destination,
            value: data.value,
            data: data.data,
            executed: data.executed,
            confirmations: data.confirmations,
            ledger: data.ledger,
            submitted_at: data.submitted_at,
            executed_at: data.executed_at,
        })
    }
}

impl From<Proposal> for ProposalData {
    fn from(proposal: Proposal) -> Self {
        Self {
            index: proposal.index,
            submitter: proposal.submitter,
            destination: proposal.destination,
            value: proposal.value,
            data: proposal.data,
            executed: proposal.executed,
            confirmations: proposal.confirmations,
            ledger: proposal.ledger,
            submitted_at: proposal.submitted_at,
            executed_at: proposal.executed_at,
        }
    }
}
