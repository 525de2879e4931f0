//! Registry management calls
//!
//! Owner-set changes travel through the normal proposal pipeline: the
//! proposal's destination is the wallet's own address and its payload is an
//! encoded [`RegistryCall`]. When such a proposal executes, the wallet
//! decodes the payload and applies it to its registry as itself.

use crate::crypto::Address;
use crate::multisig::error::WalletError;
use crate::multisig::events::WalletEvent;
use crate::multisig::registry::OwnerRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload decoding errors
#[derive(Error, Debug)]
pub enum CallError {
    #[error("Empty payload")]
    Empty,
    #[error("Malformed registry call: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A registry mutation carried as a proposal payload
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RegistryCall {
    AddOwner { owner: Address },
    RemoveOwner { owner: Address },
    ReplaceOwner { old: Address, new: Address },
    ChangeQuorum { quorum: u32 },
}

impl RegistryCall {
    /// Encode as payload bytes
    pub fn encode(&self) -> Vec<u8> {
        // Serializing a plain enum of addresses and integers cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode payload bytes
    pub fn decode(data: &[u8]) -> Result<Self, CallError> {
        if data.is_empty() {
            return Err(CallError::Empty);
        }
        Ok(serde_json::from_slice(data)?)
    }

    /// Apply to `registry` on behalf of `caller`
    pub fn apply(
        &self,
        registry: &mut OwnerRegistry,
        caller: &Address,
    ) -> Result<Vec<WalletEvent>, WalletError> {
        match self {
            RegistryCall::AddOwner { owner } => registry.add_owner(caller, *owner),
            RegistryCall::RemoveOwner { owner } => registry.remove_owner(caller, *owner),
            RegistryCall::ReplaceOwner { old, new } => registry.replace_owner(caller, *old, *new),
            RegistryCall::ChangeQuorum { quorum } => registry.change_quorum(caller, *quorum),
        }
    }
}
